// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Router - Dynamic dispatch to geometry processors
//!
//! Routes representation items to processors based on type. Before dispatch
//! the router flattens an element's body representation into leaf items,
//! each with the transform that takes it into the element's frame.

use crate::placement::{local_placement, placement_matrix, transformation_operator};
use crate::{Error, Mesh, Result};
use ifc_takeoff_model::{DecodedEntity, EntityResolver, EntityResolverExt, IfcType};
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Representation identifiers that carry an element's 3D body
pub const BODY_IDENTIFIERS: &[&str] = &["Body", "Facetation"];

/// Deepest nesting of mapped items and boolean operands that is flattened
const MAX_ITEM_DEPTH: usize = 16;

/// Geometry processor trait
///
/// Each processor handles one or more types of representation items.
/// Processors use the `EntityResolver` trait for entity lookups, making them
/// independent of any specific parser implementation.
pub trait GeometryProcessor: Send + Sync {
    /// Tessellate one item in its own coordinate frame, in file units
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh>;

    /// Get supported IFC types
    fn supported_types(&self) -> Vec<IfcType>;
}

/// Leaf representation item with its transform into the element frame
#[derive(Clone, Debug)]
pub struct PlacedItem {
    pub item: Arc<DecodedEntity>,
    pub transform: Matrix4<f64>,
}

/// Geometry router - routes items to processors
///
/// The router holds no per-file state, so one instance can serve every
/// element of a model from several threads.
pub struct GeometryRouter {
    /// Registered processors by type
    processors: FxHashMap<IfcType, Arc<dyn GeometryProcessor>>,
}

impl GeometryRouter {
    /// Create new router without any processors registered
    pub fn new() -> Self {
        Self {
            processors: FxHashMap::default(),
        }
    }

    /// Create router with default processors registered
    ///
    /// Registers the following processors:
    /// - `ExtrudedAreaSolidProcessor` (IfcExtrudedAreaSolid)
    /// - `TriangulatedFaceSetProcessor` (IfcTriangulatedFaceSet)
    /// - `FacetedBrepProcessor` (IfcFacetedBrep)
    pub fn with_default_processors() -> Self {
        use crate::processors::{
            ExtrudedAreaSolidProcessor, FacetedBrepProcessor, TriangulatedFaceSetProcessor,
        };

        let mut router = Self::new();
        router.register(Arc::new(ExtrudedAreaSolidProcessor::new()));
        router.register(Arc::new(TriangulatedFaceSetProcessor::new()));
        router.register(Arc::new(FacetedBrepProcessor::new()));
        router
    }

    /// Register a geometry processor
    pub fn register(&mut self, processor: Arc<dyn GeometryProcessor>) {
        for ifc_type in processor.supported_types() {
            self.processors.insert(ifc_type, Arc::clone(&processor));
        }
    }

    /// Check if a type has a registered processor
    pub fn has_processor(&self, ifc_type: &IfcType) -> bool {
        self.processors.contains_key(ifc_type)
    }

    /// Tessellate a single leaf item
    pub fn process_item(&self, item: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let processor = self
            .processors
            .get(&item.ifc_type)
            .ok_or_else(|| Error::unsupported_type(item.ifc_type.name()))?;
        processor.process(item, resolver)
    }

    /// World placement of an element, from ObjectPlacement (index 5)
    pub fn element_placement(
        &self,
        element: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Matrix4<f64> {
        resolver
            .follow(element, 5)
            .map(|placement| local_placement(&placement, resolver))
            .unwrap_or_else(Matrix4::identity)
    }

    /// Body representations of an element
    ///
    /// Follows Representation (index 6) to the product definition shape and
    /// keeps the shape representations whose identifier names a body.
    pub fn body_representations(
        &self,
        element: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Vec<Arc<DecodedEntity>> {
        let Some(shape) = resolver.follow(element, 6) else {
            return Vec::new();
        };
        // IfcProductDefinitionShape(Name, Description, Representations)
        resolver
            .follow_list(&shape, 2)
            .into_iter()
            .filter(|rep| {
                rep.get_string(1)
                    .is_some_and(|id| BODY_IDENTIFIERS.contains(&id))
            })
            .collect()
    }

    /// True if the element has at least one body representation
    pub fn has_body(&self, element: &DecodedEntity, resolver: &dyn EntityResolver) -> bool {
        !self.body_representations(element, resolver).is_empty()
    }

    /// Leaf items of every body representation, in element coordinates
    pub fn body_items(
        &self,
        element: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Vec<PlacedItem> {
        let mut out = Vec::new();
        for representation in self.body_representations(element, resolver) {
            // Items at index 3
            for item in resolver.follow_list(&representation, 3) {
                self.flatten(item, Matrix4::identity(), resolver, 0, &mut out);
            }
        }
        out
    }

    fn flatten(
        &self,
        item: Arc<DecodedEntity>,
        transform: Matrix4<f64>,
        resolver: &dyn EntityResolver,
        depth: usize,
        out: &mut Vec<PlacedItem>,
    ) {
        if depth > MAX_ITEM_DEPTH {
            log::debug!("[Geometry] Item nesting at {} too deep", item.id);
            return;
        }
        match item.ifc_type {
            IfcType::IfcMappedItem => {
                // IfcMappedItem(MappingSource, MappingTarget)
                let Some(source) = resolver.follow(&item, 0) else {
                    return;
                };
                let target = resolver
                    .follow(&item, 1)
                    .map(|op| transformation_operator(&op, resolver))
                    .unwrap_or_else(Matrix4::identity);
                // IfcRepresentationMap(MappingOrigin, MappedRepresentation)
                let origin = resolver
                    .follow(&source, 0)
                    .map(|p| placement_matrix(&p, resolver))
                    .unwrap_or_else(Matrix4::identity);
                let Some(mapped) = resolver.follow(&source, 1) else {
                    return;
                };
                let transform = transform * target * origin;
                for child in resolver.follow_list(&mapped, 3) {
                    self.flatten(child, transform, resolver, depth + 1, out);
                }
            }
            IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult => {
                // Openings are not cut; the first operand stands for the result
                if let Some(first) = resolver.follow(&item, 1) {
                    self.flatten(first, transform, resolver, depth + 1, out);
                }
            }
            _ => out.push(PlacedItem { item, transform }),
        }
    }
}

impl Default for GeometryRouter {
    fn default() -> Self {
        Self::with_default_processors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_takeoff_model::{EntityId, IfcModel};
    use ifc_takeoff_parser::StepModel;
    use nalgebra::Point3;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCCARTESIANPOINT((5.,0.,0.));
#3=IFCAXIS2PLACEMENT3D(#1,$,$);
#4=IFCAXIS2PLACEMENT3D(#2,$,$);
#5=IFCLOCALPLACEMENT($,#4);
#10=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,1.,1.);
#11=IFCDIRECTION((0.,0.,1.));
#12=IFCEXTRUDEDAREASOLID(#10,#3,#11,2.);
#13=IFCBOOLEANCLIPPINGRESULT(.DIFFERENCE.,#12,#99);
#20=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#13));
#21=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#12));
#22=IFCREPRESENTATIONMAP(#3,#20);
#23=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#2,$,$);
#24=IFCMAPPEDITEM(#22,#23);
#25=IFCSHAPEREPRESENTATION($,'Body','MappedRepresentation',(#24));
#30=IFCPRODUCTDEFINITIONSHAPE($,$,(#21,#20));
#31=IFCPRODUCTDEFINITIONSHAPE($,$,(#25));
#32=IFCPRODUCTDEFINITIONSHAPE($,$,(#21));
#40=IFCWALL('w',$,'Wall',$,$,#5,#30,$,$);
#41=IFCCOLUMN('c',$,'Column',$,$,$,#31,$,$);
#42=IFCBEAM('b',$,'Beam',$,$,$,#32,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn with_element<R>(
        id: u32,
        f: impl FnOnce(&GeometryRouter, &DecodedEntity, &dyn EntityResolver) -> R,
    ) -> R {
        let model = StepModel::parse(TEST_IFC).unwrap();
        let router = GeometryRouter::with_default_processors();
        let resolver = model.resolver();
        let element = resolver.get(EntityId(id)).unwrap();
        f(&router, &element, resolver)
    }

    #[test]
    fn test_default_processors() {
        let router = GeometryRouter::with_default_processors();
        assert!(router.has_processor(&IfcType::IfcExtrudedAreaSolid));
        assert!(router.has_processor(&IfcType::IfcTriangulatedFaceSet));
        assert!(router.has_processor(&IfcType::IfcFacetedBrep));
        assert!(!router.has_processor(&IfcType::IfcMappedItem));
    }

    #[test]
    fn test_body_items_skip_boolean_and_axis() {
        let items = with_element(40, |router, element, resolver| {
            router.body_items(element, resolver)
        });
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item.id, EntityId(12));
        assert_eq!(items[0].transform, Matrix4::identity());
    }

    #[test]
    fn test_mapped_item_transform() {
        let items = with_element(41, |router, element, resolver| {
            router.body_items(element, resolver)
        });
        assert_eq!(items.len(), 1);
        let p = items[0].transform.transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_element_without_body() {
        with_element(42, |router, element, resolver| {
            assert!(!router.has_body(element, resolver));
            assert!(router.body_items(element, resolver).is_empty());
        });
    }

    #[test]
    fn test_element_placement() {
        let m = with_element(40, |router, element, resolver| {
            router.element_placement(element, resolver)
        });
        assert_relative_eq!(m.transform_point(&Point3::origin()), Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_unsupported_item() {
        with_element(40, |router, _, resolver| {
            let profile = resolver.get(EntityId(10)).unwrap();
            assert!(matches!(
                router.process_item(&profile, resolver),
                Err(Error::UnsupportedType(_))
            ));
        });
    }
}
