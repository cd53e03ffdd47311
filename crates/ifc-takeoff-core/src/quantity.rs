// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named quantity lookup through property definitions
//!
//! Follows `IfcRelDefinesByProperties` from an object to its element
//! quantities and property sets. Every structural surprise along the way is
//! read as "no value here".

use ifc_takeoff_model::{DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType};

/// Floor area names on spaces, most specific first
pub const SPACE_AREA_NAMES: &[&str] = &[
    "GrossFloorArea",
    "NetFloorArea",
    "Area",
    "GrossArea",
    "NetArea",
];

/// Area names on slabs
pub const SLAB_AREA_NAMES: &[&str] = &["GrossArea", "NetArea", "Area", "GrossSideArea"];

/// Volume names on any element
pub const VOLUME_NAMES: &[&str] = &["NetVolume", "GrossVolume", "Volume"];

/// Area names reported per element
pub const ELEMENT_AREA_NAMES: &[&str] = &[
    "NetSideArea",
    "GrossSideArea",
    "NetArea",
    "GrossArea",
    "Area",
    "NetFloorArea",
    "GrossFloorArea",
];

/// Resolves named numeric quantities of an object
#[derive(Clone, Copy)]
pub struct QuantityResolver<'a> {
    resolver: &'a dyn EntityResolver,
}

impl<'a> QuantityResolver<'a> {
    pub fn new(resolver: &'a dyn EntityResolver) -> Self {
        Self { resolver }
    }

    /// First value whose name is in `names`
    ///
    /// Relations are visited in file order. Within one definition, element
    /// quantities are checked before single-value properties. The order of
    /// `names` only decides membership, not priority.
    pub fn resolve(&self, id: EntityId, names: &[&str]) -> Option<f64> {
        self.resolver.defined_by(id).iter().find_map(|relation| {
            // RelatingPropertyDefinition at 5
            let definition = self.resolver.follow(relation, 5)?;
            match definition.ifc_type {
                IfcType::IfcElementQuantity => self.from_quantities(&definition, names),
                IfcType::IfcPropertySet => self.from_properties(&definition, names),
                _ => None,
            }
        })
    }

    /// IfcElementQuantity: Quantities at 5, each with Name (0) and value (3)
    fn from_quantities(&self, definition: &DecodedEntity, names: &[&str]) -> Option<f64> {
        self.resolver
            .follow_list(definition, 5)
            .iter()
            .filter(|q| is_numeric_quantity(&q.ifc_type))
            .filter(|q| q.get_string(0).is_some_and(|name| names.contains(&name)))
            .find_map(|q| q.get_float(3))
    }

    /// IfcPropertySet: HasProperties at 4, single values with Name (0) and NominalValue (2)
    fn from_properties(&self, definition: &DecodedEntity, names: &[&str]) -> Option<f64> {
        self.resolver
            .follow_list(definition, 4)
            .iter()
            .filter(|p| p.ifc_type == IfcType::IfcPropertySingleValue)
            .filter(|p| p.get_string(0).is_some_and(|name| names.contains(&name)))
            .find_map(|p| p.get_float(2))
    }
}

fn is_numeric_quantity(ifc_type: &IfcType) -> bool {
    matches!(
        ifc_type,
        IfcType::IfcQuantityArea
            | IfcType::IfcQuantityVolume
            | IfcType::IfcQuantityLength
            | IfcType::IfcQuantityCount
            | IfcType::IfcQuantityWeight
    )
}
