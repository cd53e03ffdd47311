// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit of the project

use ifc_takeoff_model::{DecodedEntity, EntityResolver, EntityResolverExt, IfcType};

/// SI prefixes by enumeration keyword
const SI_PREFIXES: &[(&str, f64)] = &[
    ("EXA", 1e18),
    ("PETA", 1e15),
    ("TERA", 1e12),
    ("GIGA", 1e9),
    ("MEGA", 1e6),
    ("KILO", 1e3),
    ("HECTO", 1e2),
    ("DECA", 1e1),
    ("DECI", 1e-1),
    ("CENTI", 1e-2),
    ("MILLI", 1e-3),
    ("MICRO", 1e-6),
    ("NANO", 1e-9),
    ("PICO", 1e-12),
    ("FEMTO", 1e-15),
    ("ATTO", 1e-18),
];

/// Factor from the project's length unit to meters
///
/// Reads `IfcProject.UnitsInContext` (attribute 8). Falls back to 1.0 when
/// the project or its length unit cannot be resolved.
pub fn extract_unit_scale(resolver: &dyn EntityResolver) -> f64 {
    resolver
        .entities_by_type(&IfcType::IfcProject)
        .first()
        .and_then(|project| resolver.follow(project, 8))
        .and_then(|assignment| {
            resolver
                .follow_list(&assignment, 0)
                .iter()
                .find_map(|unit| length_unit_scale(unit, resolver, 0))
        })
        .filter(|scale| scale.is_finite() && *scale > 0.0)
        .unwrap_or(1.0)
}

fn length_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver, depth: u8) -> Option<f64> {
    // UnitType at 1 for both SI and conversion-based units
    if unit.get_enum(1)? != "LENGTHUNIT" || depth > 4 {
        return None;
    }
    match unit.ifc_type {
        // IfcSIUnit(Dimensions, UnitType, Prefix, Name)
        IfcType::IfcSIUnit => {
            if unit.get_enum(3)? != "METRE" {
                return None;
            }
            let prefix = unit
                .get_enum(2)
                .and_then(|p| SI_PREFIXES.iter().find(|(name, _)| *name == p))
                .map_or(1.0, |(_, scale)| *scale);
            Some(prefix)
        }
        // IfcConversionBasedUnit(Dimensions, UnitType, Name, ConversionFactor)
        IfcType::IfcConversionBasedUnit => {
            let factor = resolver.follow(unit, 3)?;
            if factor.ifc_type != IfcType::IfcMeasureWithUnit {
                return None;
            }
            // IfcMeasureWithUnit(ValueComponent, UnitComponent)
            let value = factor.get_float(0)?;
            let base = resolver
                .follow(&factor, 1)
                .and_then(|base| length_unit_scale(&base, resolver, depth + 1))
                .unwrap_or(1.0);
            Some(value * base)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::EntityArena;
    use crate::scanner::EntityScanner;

    fn scale_of(data: &str) -> f64 {
        let content = format!("ISO-10303-21;\nDATA;\n{}\nENDSEC;\n", data);
        let arena = EntityArena::decode(EntityScanner::new(&content).unwrap());
        extract_unit_scale(&arena)
    }

    #[test]
    fn test_millimetre_project() {
        let scale = scale_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#4,#3));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);\n\
             #4=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);",
        );
        assert!((scale - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_foot_conversion_unit() {
        let scale = scale_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#3));\n\
             #3=IFCCONVERSIONBASEDUNIT(#5,.LENGTHUNIT.,'FOOT',#4);\n\
             #4=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#6);\n\
             #6=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);",
        );
        assert!((scale - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_missing_units_default_to_metre() {
        assert_eq!(scale_of("#1=IFCPROJECT('g',$,'P',$,$,$,$,$,$);"), 1.0);
        assert_eq!(scale_of("#1=IFCWALL('g',$,'W',$,$,$,$,$);"), 1.0);
    }
}
