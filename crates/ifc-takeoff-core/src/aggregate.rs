// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model aggregation
//!
//! Drives the quantity resolver, the spatial hierarchy and the geometry
//! baker over a decoded model and folds the results into one
//! [`BuildingModel`]. Area totals fall back tier by tier; volumes fall back
//! element by element.

use crate::bake::GeometryBaker;
use crate::fallback::FallbackChain;
use crate::quantity::{
    QuantityResolver, ELEMENT_AREA_NAMES, SLAB_AREA_NAMES, SPACE_AREA_NAMES, VOLUME_NAMES,
};
use crate::spatial::SpatialHierarchy;
use ifc_takeoff_model::{
    BuildingModel, Element, ElementKind, EntityId, EntityResolver, GeometrySource, IfcModel,
    IfcType,
};
use rustc_hash::FxHashSet;

/// Types whose volumes make up the total, each with its specialized cases
pub const STRUCTURAL_TYPES: [IfcType; 5] = [
    IfcType::IfcWall,
    IfcType::IfcWallStandardCase,
    IfcType::IfcSlab,
    IfcType::IfcColumn,
    IfcType::IfcBeam,
];

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ids of the given types and their specialized cases, in file order
fn ids_of_types(resolver: &dyn EntityResolver, types: &[IfcType]) -> Vec<EntityId> {
    let mut expanded: Vec<IfcType> = Vec::new();
    for ifc_type in types.iter().flat_map(IfcType::with_subtypes) {
        if !expanded.contains(&ifc_type) {
            expanded.push(ifc_type);
        }
    }
    let per_type: Vec<Vec<EntityId>> = expanded
        .iter()
        .map(|t| resolver.ids_by_type(t))
        .filter(|ids| !ids.is_empty())
        .collect();
    if per_type.len() <= 1 {
        return per_type.into_iter().flatten().collect();
    }
    let wanted: FxHashSet<EntityId> = per_type.into_iter().flatten().collect();
    resolver
        .all_ids()
        .into_iter()
        .filter(|id| wanted.contains(id))
        .collect()
}

/// Sum of the values that resolved; `None` if none did
fn sum_resolved(ids: &[EntityId], value: impl Fn(EntityId) -> Option<f64>) -> Option<f64> {
    ids.iter()
        .filter_map(|&id| value(id))
        .fold(None, |total, v| Some(total.unwrap_or(0.0) + v))
}

/// Builds the snapshot of one decoded model
pub struct ModelAggregator<'a> {
    model: &'a dyn IfcModel,
    quantities: QuantityResolver<'a>,
    baker: GeometryBaker<'a>,
}

impl<'a> ModelAggregator<'a> {
    pub fn new(model: &'a dyn IfcModel, source: &'a dyn GeometrySource) -> Self {
        Self {
            model,
            quantities: QuantityResolver::new(model.resolver()),
            baker: GeometryBaker::new(source),
        }
    }

    fn resolver(&self) -> &'a dyn EntityResolver {
        self.model.resolver()
    }

    /// Full snapshot
    pub fn aggregate(&self) -> BuildingModel {
        let SpatialHierarchy {
            project_name,
            site_name,
            building_name,
            storeys,
            ..
        } = SpatialHierarchy::build(self.resolver(), self.model.unit_scale());

        let building = BuildingModel {
            project_name,
            site_name,
            building_name,
            schema: self.model.metadata().schema_version.clone(),
            length_unit_scale: self.model.unit_scale(),
            storeys,
            elements: self.elements(),
            gross_floor_area: self.gross_floor_area(),
            total_volume: self.total_volume(),
            perimeter: self.perimeter(),
        };

        log::info!(
            "[Aggregate] {}: {} elements, {} storeys, area {:?}, volume {:?}, perimeter {:?}",
            building.project_name,
            building.elements.len(),
            building.storeys.len(),
            building.gross_floor_area,
            building.total_volume,
            building.perimeter
        );
        building
    }

    /// Floor area from spaces, then slab quantities, then slab footprints
    ///
    /// A tier only gives way when not a single entity of it resolved.
    pub fn gross_floor_area(&self) -> Option<f64> {
        let resolver = self.resolver();
        let spaces = resolver.ids_by_type(&IfcType::IfcSpace);
        let slabs = ids_of_types(resolver, &[IfcType::IfcSlab]);

        let area = FallbackChain::new("gross floor area")
            .then("space quantities", || {
                sum_resolved(&spaces, |id| self.quantities.resolve(id, SPACE_AREA_NAMES))
            })
            .then("slab quantities", || {
                sum_resolved(&slabs, |id| self.quantities.resolve(id, SLAB_AREA_NAMES))
            })
            .then("slab footprints", || {
                sum_resolved(&slabs, |id| {
                    self.baker.bounding_box(id).map(|b| b.footprint_area())
                })
            })
            .resolve()
            .map(round2);
        area
    }

    /// Structural volume, each element falling back to its box on its own
    pub fn total_volume(&self) -> Option<f64> {
        let resolver = self.resolver();
        let ids = ids_of_types(resolver, &STRUCTURAL_TYPES);

        sum_resolved(&ids, |id| {
            FallbackChain::new("element volume")
                .then("quantities", || self.quantities.resolve(id, VOLUME_NAMES))
                .then("bounding box", || self.baker.bounding_box(id).map(|b| b.volume()))
                .resolve()
        })
        .map(round2)
    }

    /// Footprint perimeter of the lowest slab
    pub fn perimeter(&self) -> Option<f64> {
        ids_of_types(self.resolver(), &[IfcType::IfcSlab])
            .into_iter()
            .filter_map(|id| self.baker.bounding_box(id))
            // first slab wins ties
            .reduce(|lowest, b| if b.min[2] < lowest.min[2] { b } else { lowest })
            .map(|b| {
                let [dx, dy, _] = b.size();
                round2(2.0 * (dx + dy))
            })
    }

    /// Physical elements in file order with their own quantities
    pub fn elements(&self) -> Vec<Element> {
        let resolver = self.resolver();
        resolver
            .all_ids()
            .into_iter()
            .filter_map(|id| resolver.get(id))
            .filter(|entity| entity.ifc_type.is_element())
            .map(|entity| {
                let kind = ElementKind::from_ifc_type(&entity.ifc_type);
                let name = entity
                    .get_string(2)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{} {}", kind.label(), entity.id));
                Element {
                    id: entity.id,
                    name,
                    area: self
                        .quantities
                        .resolve(entity.id, ELEMENT_AREA_NAMES)
                        .map(round2),
                    volume: self.quantities.resolve(entity.id, VOLUME_NAMES).map(round2),
                    kind,
                }
            })
            .collect()
    }
}
