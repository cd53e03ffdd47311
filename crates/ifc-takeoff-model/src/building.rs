// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building snapshot types
//!
//! The aggregated, immutable view of a loaded file: spatial structure,
//! element list, quantity totals and render meshes.

use crate::{EntityId, IfcType};
use serde::{Serialize, Serializer};
use std::fmt;

/// Element category shown to users
///
/// A closed set of common building element kinds. Anything else keeps its
/// schema name without the `Ifc` prefix in [`ElementKind::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Wall,
    Slab,
    Column,
    Beam,
    Window,
    Door,
    Roof,
    Stair,
    Railing,
    Covering,
    Plate,
    Member,
    CurtainWall,
    Footing,
    Other(String),
}

impl ElementKind {
    /// Recognized kinds in display order
    pub const KNOWN: [ElementKind; 14] = [
        ElementKind::Wall,
        ElementKind::Slab,
        ElementKind::Column,
        ElementKind::Beam,
        ElementKind::Window,
        ElementKind::Door,
        ElementKind::Roof,
        ElementKind::Stair,
        ElementKind::Railing,
        ElementKind::Covering,
        ElementKind::Plate,
        ElementKind::Member,
        ElementKind::CurtainWall,
        ElementKind::Footing,
    ];

    /// Kind of an element type; specialized cases map to their base kind
    pub fn from_ifc_type(ifc_type: &IfcType) -> Self {
        let base = ifc_type.base_type();
        match base.as_ref().unwrap_or(ifc_type) {
            IfcType::IfcWall => ElementKind::Wall,
            IfcType::IfcSlab => ElementKind::Slab,
            IfcType::IfcColumn => ElementKind::Column,
            IfcType::IfcBeam => ElementKind::Beam,
            IfcType::IfcWindow => ElementKind::Window,
            IfcType::IfcDoor => ElementKind::Door,
            IfcType::IfcRoof => ElementKind::Roof,
            IfcType::IfcStair => ElementKind::Stair,
            IfcType::IfcRailing => ElementKind::Railing,
            IfcType::IfcCovering => ElementKind::Covering,
            IfcType::IfcPlate => ElementKind::Plate,
            IfcType::IfcMember => ElementKind::Member,
            IfcType::IfcCurtainWall => ElementKind::CurtainWall,
            IfcType::IfcFooting => ElementKind::Footing,
            other => ElementKind::Other(strip_schema_prefix(other.name()).to_string()),
        }
    }

    /// Display label
    pub fn label(&self) -> &str {
        match self {
            ElementKind::Wall => "Wall",
            ElementKind::Slab => "Slab",
            ElementKind::Column => "Column",
            ElementKind::Beam => "Beam",
            ElementKind::Window => "Window",
            ElementKind::Door => "Door",
            ElementKind::Roof => "Roof",
            ElementKind::Stair => "Stair",
            ElementKind::Railing => "Railing",
            ElementKind::Covering => "Covering",
            ElementKind::Plate => "Plate",
            ElementKind::Member => "Member",
            ElementKind::CurtainWall => "CurtainWall",
            ElementKind::Footing => "Footing",
            ElementKind::Other(name) => name,
        }
    }

    /// Default RGBA display color
    pub fn default_color(&self) -> [f32; 4] {
        match self {
            // warm beige
            ElementKind::Wall => [0.92, 0.85, 0.75, 1.0],
            // concrete gray
            ElementKind::Slab => [0.75, 0.73, 0.70, 1.0],
            // terracotta
            ElementKind::Roof => [0.72, 0.55, 0.45, 1.0],
            ElementKind::Beam | ElementKind::Column | ElementKind::Member => {
                [0.60, 0.65, 0.72, 1.0]
            }
            ElementKind::Door => [0.55, 0.35, 0.20, 1.0],
            // translucent glass
            ElementKind::Window | ElementKind::CurtainWall => [0.5, 0.7, 0.85, 0.35],
            ElementKind::Stair => [0.65, 0.62, 0.58, 1.0],
            ElementKind::Railing => [0.35, 0.35, 0.38, 1.0],
            ElementKind::Plate => [0.68, 0.70, 0.75, 1.0],
            ElementKind::Covering => [0.82, 0.80, 0.76, 1.0],
            ElementKind::Footing => [0.55, 0.53, 0.50, 1.0],
            ElementKind::Other(_) => [0.8, 0.8, 0.8, 1.0],
        }
    }
}

fn strip_schema_prefix(name: &str) -> &str {
    match name.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("ifc") => &name[3..],
        _ => name,
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A physical building element
#[derive(Clone, Debug, Serialize)]
pub struct Element {
    pub id: EntityId,
    pub kind: ElementKind,
    pub name: String,
    pub area: Option<f64>,
    pub volume: Option<f64>,
}

/// A building storey and the elements it contains
#[derive(Clone, Debug, Serialize)]
pub struct Storey {
    pub id: EntityId,
    pub name: String,
    pub elevation: f64,
    /// Contained elements, in assignment order
    pub element_ids: Vec<EntityId>,
}

/// Immutable result of aggregating one file
#[derive(Clone, Debug, Serialize)]
pub struct BuildingModel {
    pub project_name: String,
    pub site_name: String,
    pub building_name: String,
    pub schema: String,
    /// Factor applied to geometry to get meters
    pub length_unit_scale: f64,
    /// Ascending by elevation
    pub storeys: Vec<Storey>,
    /// File order
    pub elements: Vec<Element>,
    pub gross_floor_area: Option<f64>,
    pub total_volume: Option<f64>,
    pub perimeter: Option<f64>,
}

impl BuildingModel {
    pub fn storey(&self, id: EntityId) -> Option<&Storey> {
        self.storeys.iter().find(|s| s.id == id)
    }

    pub fn element(&self, id: EntityId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Storey a selection narrows to; `None` and unknown ids select everything
    pub fn selected_storey(&self, storey: Option<EntityId>) -> Option<&Storey> {
        storey.and_then(|id| self.storey(id))
    }

    /// Elements shown for a storey selection
    pub fn elements_in_storey(&self, storey: Option<EntityId>) -> Vec<&Element> {
        match self.selected_storey(storey) {
            None => self.elements.iter().collect(),
            Some(storey) => storey
                .element_ids
                .iter()
                .filter_map(|eid| self.element(*eid))
                .collect(),
        }
    }

    /// Element counts per kind
    ///
    /// Known kinds come first in label order, then generic kinds
    /// alphabetically. Kinds with no elements are omitted.
    pub fn count_by_kind(&self) -> Vec<(ElementKind, usize)> {
        let mut counts: Vec<(ElementKind, usize)> = ElementKind::KNOWN
            .iter()
            .map(|kind| {
                let n = self.elements.iter().filter(|e| &e.kind == kind).count();
                (kind.clone(), n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        let mut others: Vec<(ElementKind, usize)> = Vec::new();
        for element in &self.elements {
            if let ElementKind::Other(_) = element.kind {
                match others.iter_mut().find(|(k, _)| k == &element.kind) {
                    Some((_, n)) => *n += 1,
                    None => others.push((element.kind.clone(), 1)),
                }
            }
        }
        others.sort_by(|a, b| a.0.label().cmp(b.0.label()));
        counts.extend(others);
        counts
    }
}

/// World-space triangle mesh of one element part
#[derive(Clone, Debug, Default, Serialize)]
pub struct Mesh {
    pub element_id: EntityId,
    /// Flattened `[x, y, z, ...]` positions in meters
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub color: [f32; 4],
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of triangle `index`, or `None` if an index is out of range
    pub fn triangle(&self, index: usize) -> Option<[[f32; 3]; 3]> {
        let tri = self.indices.get(index * 3..index * 3 + 3)?;
        let mut out = [[0.0; 3]; 3];
        for (corner, &i) in out.iter_mut().zip(tri) {
            let base = i as usize * 3;
            let p = self.vertices.get(base..base + 3)?;
            *corner = [p[0], p[1], p[2]];
        }
        Some(out)
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for p in self.vertices.chunks_exact(3) {
            bounds.expand([p[0] as f64, p[1] as f64, p[2] as f64]);
        }
        bounds
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    /// Inverted box that any point expands
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn from_points(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    pub fn expand(&mut self, p: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn union(&mut self, other: &Bounds) {
        if other.is_valid() {
            self.expand(other.min);
            self.expand(other.max);
        }
    }

    /// True once at least one point has been added
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.min[axis] <= self.max[axis])
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn max_dimension(&self) -> f64 {
        let [dx, dy, dz] = self.size();
        dx.max(dy).max(dz)
    }

    /// XY footprint area
    pub fn footprint_area(&self) -> f64 {
        let [dx, dy, _] = self.size();
        dx * dy
    }

    pub fn volume(&self) -> f64 {
        let [dx, dy, dz] = self.size();
        dx * dy * dz
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: u32, kind: ElementKind) -> Element {
        Element {
            id: EntityId(id),
            kind,
            name: String::new(),
            area: None,
            volume: None,
        }
    }

    fn model(elements: Vec<Element>, storeys: Vec<Storey>) -> BuildingModel {
        BuildingModel {
            project_name: String::new(),
            site_name: String::new(),
            building_name: String::new(),
            schema: String::new(),
            length_unit_scale: 1.0,
            storeys,
            elements,
            gross_floor_area: None,
            total_volume: None,
            perimeter: None,
        }
    }

    #[test]
    fn test_element_kind_labels() {
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::IfcWallStandardCase),
            ElementKind::Wall
        );
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::IfcCurtainWall).label(),
            "CurtainWall"
        );
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::IfcSlabStandardCase),
            ElementKind::Slab
        );
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::IfcColumnStandardCase),
            ElementKind::Column
        );
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::Unknown("IFCROOFSTANDARDCASE".into())),
            ElementKind::Roof
        );
        assert_eq!(ElementKind::from_ifc_type(&IfcType::IfcChimney).label(), "Chimney");
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::IfcBuildingElementProxy).label(),
            "BuildingElementProxy"
        );
        assert_eq!(
            ElementKind::from_ifc_type(&IfcType::Unknown("IFCANNOTATION".into())).label(),
            "ANNOTATION"
        );
    }

    #[test]
    fn test_count_by_kind_orders_known_first() {
        let m = model(
            vec![
                element(1, ElementKind::Other("Pile".into())),
                element(2, ElementKind::Door),
                element(3, ElementKind::Wall),
                element(4, ElementKind::Wall),
            ],
            Vec::new(),
        );
        let counts = m.count_by_kind();
        assert_eq!(counts[0], (ElementKind::Wall, 2));
        assert_eq!(counts[1], (ElementKind::Door, 1));
        assert_eq!(counts[2], (ElementKind::Other("Pile".into()), 1));
    }

    #[test]
    fn test_elements_in_storey() {
        let storey = Storey {
            id: EntityId(10),
            name: "Level 1".into(),
            elevation: 0.0,
            element_ids: vec![EntityId(2)],
        };
        let empty = Storey {
            id: EntityId(11),
            name: "Level 2".into(),
            elevation: 3.0,
            element_ids: Vec::new(),
        };
        let m = model(
            vec![element(1, ElementKind::Slab), element(2, ElementKind::Wall)],
            vec![storey, empty],
        );
        assert_eq!(m.elements_in_storey(None).len(), 2);
        assert_eq!(m.elements_in_storey(Some(EntityId(10)))[0].id, EntityId(2));
        assert!(m.elements_in_storey(Some(EntityId(11))).is_empty());
        assert_eq!(m.elements_in_storey(Some(EntityId(99))).len(), 2);
        assert!(m.selected_storey(Some(EntityId(99))).is_none());
    }

    #[test]
    fn test_bounds() {
        let mut b = Bounds::empty();
        assert!(!b.is_valid());
        b.expand([0.0, 0.0, 0.0]);
        b.expand([4.0, 2.0, 3.0]);
        assert!(b.is_valid());
        assert_eq!(b.size(), [4.0, 2.0, 3.0]);
        assert_eq!(b.center(), [2.0, 1.0, 1.5]);
        assert_eq!(b.max_dimension(), 4.0);
        assert_eq!(b.footprint_area(), 8.0);
        assert_eq!(b.volume(), 24.0);
    }

    #[test]
    fn test_mesh_triangle_lookup() {
        let mesh = Mesh {
            element_id: EntityId(1),
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2, 0, 1, 9],
            color: [1.0; 4],
        };
        assert_eq!(mesh.triangle(0), Some([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]));
        assert_eq!(mesh.triangle(1), None);
        assert_eq!(mesh.triangle(2), None);
    }
}
