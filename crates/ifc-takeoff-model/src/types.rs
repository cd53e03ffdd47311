// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core record types
//!
//! Entity identifiers, the closed set of entity types the takeoff engine
//! understands, and decoded attribute values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the raw instance number of a record (`#123` becomes `EntityId(123)`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Declares [`IfcType`] together with its upper-case keyword table.
macro_rules! ifc_types {
    ($($variant:ident => $keyword:literal),* $(,)?) => {
        /// Entity type tag
        ///
        /// Only the types the takeoff engine dispatches on get their own
        /// variant. Everything else is kept as [`IfcType::Unknown`] with the
        /// upper-cased keyword from the file.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum IfcType {
            $($variant,)*
            /// Type not modelled by this crate
            Unknown(String),
        }

        impl IfcType {
            /// Parse a type keyword (case-insensitive)
            pub fn parse(s: &str) -> Self {
                let upper = s.to_ascii_uppercase();
                match upper.as_str() {
                    $($keyword => IfcType::$variant,)*
                    _ => IfcType::Unknown(upper),
                }
            }

            /// Schema name, e.g. `IfcWallStandardCase`
            pub fn name(&self) -> &str {
                match self {
                    $(IfcType::$variant => stringify!($variant),)*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Building elements
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcWallElementedCase => "IFCWALLELEMENTEDCASE",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcSlab => "IFCSLAB",
    IfcSlabStandardCase => "IFCSLABSTANDARDCASE",
    IfcSlabElementedCase => "IFCSLABELEMENTEDCASE",
    IfcRoof => "IFCROOF",
    IfcBeam => "IFCBEAM",
    IfcBeamStandardCase => "IFCBEAMSTANDARDCASE",
    IfcColumn => "IFCCOLUMN",
    IfcColumnStandardCase => "IFCCOLUMNSTANDARDCASE",
    IfcDoor => "IFCDOOR",
    IfcDoorStandardCase => "IFCDOORSTANDARDCASE",
    IfcWindow => "IFCWINDOW",
    IfcWindowStandardCase => "IFCWINDOWSTANDARDCASE",
    IfcStair => "IFCSTAIR",
    IfcStairFlight => "IFCSTAIRFLIGHT",
    IfcRamp => "IFCRAMP",
    IfcRampFlight => "IFCRAMPFLIGHT",
    IfcRailing => "IFCRAILING",
    IfcCovering => "IFCCOVERING",
    IfcPlate => "IFCPLATE",
    IfcPlateStandardCase => "IFCPLATESTANDARDCASE",
    IfcMember => "IFCMEMBER",
    IfcMemberStandardCase => "IFCMEMBERSTANDARDCASE",
    IfcFooting => "IFCFOOTING",
    IfcPile => "IFCPILE",
    IfcChimney => "IFCCHIMNEY",
    IfcShadingDevice => "IFCSHADINGDEVICE",
    IfcBuildingElementPart => "IFCBUILDINGELEMENTPART",
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY",
    IfcElementAssembly => "IFCELEMENTASSEMBLY",
    IfcCivilElement => "IFCCIVILELEMENT",
    IfcGeographicElement => "IFCGEOGRAPHICELEMENT",
    IfcTransportElement => "IFCTRANSPORTELEMENT",
    IfcDiscreteAccessory => "IFCDISCRETEACCESSORY",
    IfcFastener => "IFCFASTENER",
    IfcMechanicalFastener => "IFCMECHANICALFASTENER",
    IfcReinforcingBar => "IFCREINFORCINGBAR",
    IfcReinforcingMesh => "IFCREINFORCINGMESH",
    IfcTendon => "IFCTENDON",
    IfcFurnishingElement => "IFCFURNISHINGELEMENT",
    IfcFurniture => "IFCFURNITURE",
    IfcSystemFurnitureElement => "IFCSYSTEMFURNITUREELEMENT",

    // Distribution elements
    IfcDistributionElement => "IFCDISTRIBUTIONELEMENT",
    IfcDistributionControlElement => "IFCDISTRIBUTIONCONTROLELEMENT",
    IfcEnergyConversionDevice => "IFCENERGYCONVERSIONDEVICE",
    IfcFlowController => "IFCFLOWCONTROLLER",
    IfcFlowMovingDevice => "IFCFLOWMOVINGDEVICE",
    IfcFlowStorageDevice => "IFCFLOWSTORAGEDEVICE",
    IfcFlowTreatmentDevice => "IFCFLOWTREATMENTDEVICE",
    IfcFlowTerminal => "IFCFLOWTERMINAL",
    IfcFlowSegment => "IFCFLOWSEGMENT",
    IfcFlowFitting => "IFCFLOWFITTING",
    IfcPipeSegment => "IFCPIPESEGMENT",
    IfcPipeFitting => "IFCPIPEFITTING",
    IfcDuctSegment => "IFCDUCTSEGMENT",
    IfcDuctFitting => "IFCDUCTFITTING",
    IfcCableCarrierSegment => "IFCCABLECARRIERSEGMENT",
    IfcCableSegment => "IFCCABLESEGMENT",
    IfcAirTerminal => "IFCAIRTERMINAL",
    IfcLightFixture => "IFCLIGHTFIXTURE",
    IfcSanitaryTerminal => "IFCSANITARYTERMINAL",
    IfcOutlet => "IFCOUTLET",
    IfcValve => "IFCVALVE",
    IfcPump => "IFCPUMP",
    IfcFan => "IFCFAN",
    IfcBoiler => "IFCBOILER",
    IfcTank => "IFCTANK",

    IfcOpeningElement => "IFCOPENINGELEMENT",

    // Geometric items
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
    IfcFacetedBrep => "IFCFACETEDBREP",
    IfcTriangulatedFaceSet => "IFCTRIANGULATEDFACESET",
    IfcBooleanResult => "IFCBOOLEANRESULT",
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT",
    IfcMappedItem => "IFCMAPPEDITEM",
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",

    // Profiles and curves
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",
    IfcArbitraryProfileDefWithVoids => "IFCARBITRARYPROFILEDEFWITHVOIDS",
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcPolyline => "IFCPOLYLINE",

    // Points, directions, placements
    IfcCartesianPoint => "IFCCARTESIANPOINT",
    IfcCartesianPointList3D => "IFCCARTESIANPOINTLIST3D",
    IfcDirection => "IFCDIRECTION",
    IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D",
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
    IfcLocalPlacement => "IFCLOCALPLACEMENT",
    IfcCartesianTransformationOperator3D => "IFCCARTESIANTRANSFORMATIONOPERATOR3D",
    IfcCartesianTransformationOperator3DnonUniform => "IFCCARTESIANTRANSFORMATIONOPERATOR3DNONUNIFORM",

    // Representations
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",

    // Topology
    IfcClosedShell => "IFCCLOSEDSHELL",
    IfcOpenShell => "IFCOPENSHELL",
    IfcFace => "IFCFACE",
    IfcFaceBound => "IFCFACEBOUND",
    IfcFaceOuterBound => "IFCFACEOUTERBOUND",
    IfcPolyLoop => "IFCPOLYLOOP",

    // Relationships
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",

    // Properties and quantities
    IfcPropertySet => "IFCPROPERTYSET",
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE",
    IfcElementQuantity => "IFCELEMENTQUANTITY",
    IfcQuantityLength => "IFCQUANTITYLENGTH",
    IfcQuantityArea => "IFCQUANTITYAREA",
    IfcQuantityVolume => "IFCQUANTITYVOLUME",
    IfcQuantityCount => "IFCQUANTITYCOUNT",
    IfcQuantityWeight => "IFCQUANTITYWEIGHT",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl IfcType {
    /// Physical element types that the aggregator turns into [`crate::Element`]s
    pub const ELEMENTS: &'static [IfcType] = &[
        IfcType::IfcWall,
        IfcType::IfcWallStandardCase,
        IfcType::IfcWallElementedCase,
        IfcType::IfcCurtainWall,
        IfcType::IfcSlab,
        IfcType::IfcSlabStandardCase,
        IfcType::IfcSlabElementedCase,
        IfcType::IfcRoof,
        IfcType::IfcBeam,
        IfcType::IfcBeamStandardCase,
        IfcType::IfcColumn,
        IfcType::IfcColumnStandardCase,
        IfcType::IfcDoor,
        IfcType::IfcDoorStandardCase,
        IfcType::IfcWindow,
        IfcType::IfcWindowStandardCase,
        IfcType::IfcStair,
        IfcType::IfcStairFlight,
        IfcType::IfcRamp,
        IfcType::IfcRampFlight,
        IfcType::IfcRailing,
        IfcType::IfcCovering,
        IfcType::IfcPlate,
        IfcType::IfcPlateStandardCase,
        IfcType::IfcMember,
        IfcType::IfcMemberStandardCase,
        IfcType::IfcFooting,
        IfcType::IfcPile,
        IfcType::IfcChimney,
        IfcType::IfcShadingDevice,
        IfcType::IfcBuildingElementPart,
        IfcType::IfcBuildingElementProxy,
        IfcType::IfcElementAssembly,
        IfcType::IfcCivilElement,
        IfcType::IfcGeographicElement,
        IfcType::IfcTransportElement,
        IfcType::IfcDiscreteAccessory,
        IfcType::IfcFastener,
        IfcType::IfcMechanicalFastener,
        IfcType::IfcReinforcingBar,
        IfcType::IfcReinforcingMesh,
        IfcType::IfcTendon,
        IfcType::IfcFurnishingElement,
        IfcType::IfcFurniture,
        IfcType::IfcSystemFurnitureElement,
        IfcType::IfcDistributionElement,
        IfcType::IfcDistributionControlElement,
        IfcType::IfcEnergyConversionDevice,
        IfcType::IfcFlowController,
        IfcType::IfcFlowMovingDevice,
        IfcType::IfcFlowStorageDevice,
        IfcType::IfcFlowTreatmentDevice,
        IfcType::IfcFlowTerminal,
        IfcType::IfcFlowSegment,
        IfcType::IfcFlowFitting,
        IfcType::IfcPipeSegment,
        IfcType::IfcPipeFitting,
        IfcType::IfcDuctSegment,
        IfcType::IfcDuctFitting,
        IfcType::IfcCableCarrierSegment,
        IfcType::IfcCableSegment,
        IfcType::IfcAirTerminal,
        IfcType::IfcLightFixture,
        IfcType::IfcSanitaryTerminal,
        IfcType::IfcOutlet,
        IfcType::IfcValve,
        IfcType::IfcPump,
        IfcType::IfcFan,
        IfcType::IfcBoiler,
        IfcType::IfcTank,
    ];

    /// Check if this type is a physical element
    ///
    /// Unmodelled `...STANDARDCASE` and `...ELEMENTEDCASE` subtypes count
    /// when their base type is an element.
    pub fn is_element(&self) -> bool {
        Self::ELEMENTS.contains(self) || self.base_type().is_some_and(|base| base.is_element())
    }

    /// Supertype of a specialized case, e.g. `IfcSlab` for `IfcSlabStandardCase`
    pub fn base_type(&self) -> Option<IfcType> {
        let base = match self {
            IfcType::IfcWallStandardCase | IfcType::IfcWallElementedCase => IfcType::IfcWall,
            IfcType::IfcSlabStandardCase | IfcType::IfcSlabElementedCase => IfcType::IfcSlab,
            IfcType::IfcBeamStandardCase => IfcType::IfcBeam,
            IfcType::IfcColumnStandardCase => IfcType::IfcColumn,
            IfcType::IfcDoorStandardCase => IfcType::IfcDoor,
            IfcType::IfcWindowStandardCase => IfcType::IfcWindow,
            IfcType::IfcPlateStandardCase => IfcType::IfcPlate,
            IfcType::IfcMemberStandardCase => IfcType::IfcMember,
            IfcType::Unknown(keyword) => {
                let stem = keyword
                    .strip_suffix("STANDARDCASE")
                    .or_else(|| keyword.strip_suffix("ELEMENTEDCASE"))?;
                match IfcType::parse(stem) {
                    IfcType::Unknown(_) => return None,
                    base => base,
                }
            }
            _ => return None,
        };
        Some(base)
    }

    /// This type and its specialized cases
    pub fn with_subtypes(&self) -> Vec<IfcType> {
        let mut types = vec![self.clone()];
        types.extend(
            Self::ELEMENTS
                .iter()
                .filter(|t| t.base_type().as_ref() == Some(self))
                .cloned(),
        );
        types
    }

    /// Check if this type is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            IfcType::IfcProject
                | IfcType::IfcSite
                | IfcType::IfcBuilding
                | IfcType::IfcBuildingStorey
                | IfcType::IfcSpace
        )
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decoded attribute value
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// `$`
    #[default]
    Null,
    /// `*`
    Derived,
    /// `#123`
    EntityRef(EntityId),
    /// `.T.` / `.F.`
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// `.VALUE.`
    Enum(String),
    List(Vec<AttributeValue>),
    /// Typed value like `IFCAREAMEASURE(12.5)`
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// String content, looking through a typed wrapper such as `IFCLABEL('x')`
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_string()),
            _ => None,
        }
    }

    /// Numeric content, looking through a typed wrapper such as `IFCAREAMEASURE(12.5)`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_float()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.as_str() {
                "T" | "TRUE" => Some(true),
                "F" | "FALSE" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// A record decoded from the DATA section
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    pub id: EntityId,
    pub ifc_type: IfcType,
    /// Attribute values in declaration order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    pub fn get_bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(|v| v.as_bool())
    }

    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Entity references in the list at `index`; non-reference items are dropped
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }

    /// Float triple from the list at `index`, missing coordinates default to zero
    pub fn get_coords(&self, index: usize) -> Option<[f64; 3]> {
        let list = self.get_list(index)?;
        let mut out = [0.0; 3];
        for (slot, value) in out.iter_mut().zip(list) {
            *slot = value.as_float()?;
        }
        Some(out)
    }
}

/// Header information from the file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Schema identifier from `FILE_SCHEMA`, e.g. `IFC4`
    pub schema_version: String,
    pub file_name: Option<String>,
    pub originating_system: Option<String>,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown_types() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("IfcBuildingStorey"), IfcType::IfcBuildingStorey);
        assert_eq!(
            IfcType::parse("IfcAnnotation"),
            IfcType::Unknown("IFCANNOTATION".to_string())
        );
        assert_eq!(IfcType::IfcWallStandardCase.name(), "IfcWallStandardCase");
    }

    #[test]
    fn test_ifc4_cases_are_elements() {
        for keyword in ["IFCSLABSTANDARDCASE", "IFCCOLUMNSTANDARDCASE", "IFCCHIMNEY", "IFCPIPESEGMENT"] {
            assert!(IfcType::parse(keyword).is_element(), "{}", keyword);
        }
        assert_eq!(IfcType::IfcSlabStandardCase.base_type(), Some(IfcType::IfcSlab));
        // unmodelled specialized case of a known element
        let railing_case = IfcType::Unknown("IFCRAILINGSTANDARDCASE".to_string());
        assert_eq!(railing_case.base_type(), Some(IfcType::IfcRailing));
        assert!(railing_case.is_element());
        assert!(!IfcType::parse("IFCANNOTATION").is_element());
        assert!(!IfcType::IfcOpeningElement.is_element());
        assert!(!IfcType::Unknown("IFCFOOSTANDARDCASE".to_string()).is_element());
    }

    #[test]
    fn test_with_subtypes() {
        assert_eq!(
            IfcType::IfcSlab.with_subtypes(),
            vec![
                IfcType::IfcSlab,
                IfcType::IfcSlabStandardCase,
                IfcType::IfcSlabElementedCase
            ]
        );
        assert_eq!(IfcType::IfcRoof.with_subtypes(), vec![IfcType::IfcRoof]);
    }

    #[test]
    fn test_typed_value_unwraps() {
        let value = AttributeValue::TypedValue(
            "IFCAREAMEASURE".to_string(),
            vec![AttributeValue::Float(12.5)],
        );
        assert_eq!(value.as_float(), Some(12.5));
        assert_eq!(AttributeValue::Null.as_float(), None);
    }

    #[test]
    fn test_get_coords_pads_2d_points() {
        let entity = DecodedEntity {
            id: EntityId(1),
            ifc_type: IfcType::IfcCartesianPoint,
            attributes: vec![AttributeValue::List(vec![
                AttributeValue::Float(1.0),
                AttributeValue::Float(2.0),
            ])],
        };
        assert_eq!(entity.get_coords(0), Some([1.0, 2.0, 0.0]));
    }
}
