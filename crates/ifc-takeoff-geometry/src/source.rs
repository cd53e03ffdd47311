// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `GeometrySource` over a decoded model
//!
//! Parts are tessellated on request, one per leaf body item. Vertex data
//! stays in file units; the length unit is folded into each part's transform
//! so that transformed vertices come out in meters.

use crate::placement::to_column_major;
use crate::router::GeometryRouter;
use ifc_takeoff_model::{
    ElementKind, EntityId, GeometryPart, GeometrySource, IfcModel, PartError,
};
use nalgebra::Matrix4;
use std::sync::Arc;

type PartData = Result<(Vec<f32>, Vec<u32>), PartError>;

/// One tessellated body item of an element
#[derive(Clone, Debug)]
pub struct TessellatedPart {
    data: PartData,
    transform: [f64; 16],
    color: [f32; 4],
}

impl TessellatedPart {
    pub fn new(data: PartData, transform: [f64; 16], color: [f32; 4]) -> Self {
        Self {
            data,
            transform,
            color,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.data.is_ok()
    }
}

impl GeometryPart for TessellatedPart {
    fn vertices(&self) -> Result<&[f32], PartError> {
        match &self.data {
            Ok((vertices, _)) => Ok(vertices),
            Err(err) => Err(err.clone()),
        }
    }

    fn indices(&self) -> Result<&[u32], PartError> {
        match &self.data {
            Ok((_, indices)) => Ok(indices),
            Err(err) => Err(err.clone()),
        }
    }

    fn transform(&self) -> &[f64; 16] {
        &self.transform
    }

    fn color(&self) -> [f32; 4] {
        self.color
    }
}

/// Tessellating geometry source for one model
pub struct ShapeSource {
    model: Arc<dyn IfcModel>,
    router: GeometryRouter,
}

impl ShapeSource {
    /// Source with the default processors
    pub fn new(model: Arc<dyn IfcModel>) -> Self {
        Self::with_router(model, GeometryRouter::with_default_processors())
    }

    pub fn with_router(model: Arc<dyn IfcModel>, router: GeometryRouter) -> Self {
        Self { model, router }
    }

    pub fn model(&self) -> &Arc<dyn IfcModel> {
        &self.model
    }

    /// Matrix taking file-unit coordinates to meters
    fn unit_matrix(&self) -> Matrix4<f64> {
        let scale = self.model.unit_scale();
        let mut m = Matrix4::identity();
        for k in 0..3 {
            m[(k, k)] = scale;
        }
        m
    }
}

impl GeometrySource for ShapeSource {
    fn entities_with_geometry(&self) -> Vec<EntityId> {
        let resolver = self.model.resolver();
        resolver
            .all_ids()
            .into_iter()
            .filter(|&id| {
                resolver.get(id).is_some_and(|entity| {
                    entity.ifc_type.is_element() && self.router.has_body(&entity, resolver)
                })
            })
            .collect()
    }

    fn parts(&self, id: EntityId) -> Vec<Box<dyn GeometryPart + '_>> {
        let resolver = self.model.resolver();
        let Some(element) = resolver.get(id).filter(|e| e.ifc_type.is_element()) else {
            return Vec::new();
        };

        let color = ElementKind::from_ifc_type(&element.ifc_type).default_color();
        let placement = self.unit_matrix() * self.router.element_placement(&element, resolver);

        self.router
            .body_items(&element, resolver)
            .into_iter()
            .map(|placed| {
                let data = self
                    .router
                    .process_item(&placed.item, resolver)
                    .and_then(|mut mesh| match mesh.invalid_index() {
                        Some(index) => Err(crate::Error::geometry(format!(
                            "Index {} past {} vertices",
                            index,
                            mesh.vertex_count()
                        ))),
                        None => Ok((mesh.interleaved(), std::mem::take(&mut mesh.indices))),
                    })
                    .map_err(|err| {
                        log::debug!("[Geometry] Item {} of {}: {}", placed.item.id, id, err);
                        err.into_part_error(id)
                    });
                let transform = to_column_major(&(placement * placed.transform));
                Box::new(TessellatedPart::new(data, transform, color)) as Box<dyn GeometryPart>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_takeoff_model::VERTEX_STRIDE;
    use ifc_takeoff_parser::StepModel;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('p',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCCARTESIANPOINT((0.,0.,0.));
#5=IFCCARTESIANPOINT((1000.,0.,0.));
#6=IFCAXIS2PLACEMENT3D(#4,$,$);
#7=IFCAXIS2PLACEMENT3D(#5,$,$);
#8=IFCLOCALPLACEMENT($,#7);
#9=IFCDIRECTION((0.,0.,1.));
#10=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,2000.,200.);
#11=IFCEXTRUDEDAREASOLID(#10,#6,#9,3000.);
#12=IFCSWEPTDISKSOLID(#99,10.,$,$,$);
#13=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#11,#12));
#14=IFCPRODUCTDEFINITIONSHAPE($,$,(#13));
#20=IFCWALL('w',$,'Wall',$,$,#8,#14,$,$);
#21=IFCSLAB('s',$,'Slab',$,$,#8,$,$,$);
#22=IFCBUILDINGSTOREY('st',$,'L1',$,$,#8,#14,$,.ELEMENT.,0.);
ENDSEC;
END-ISO-10303-21;
"#;

    fn source() -> ShapeSource {
        ShapeSource::new(Arc::new(StepModel::parse(TEST_IFC).unwrap()))
    }

    #[test]
    fn test_entities_with_geometry() {
        // the slab has no representation, the storey is not an element
        assert_eq!(source().entities_with_geometry(), vec![EntityId(20)]);
    }

    #[test]
    fn test_parts_report_failures_individually() {
        let source = source();
        let parts = source.parts(EntityId(20));
        assert_eq!(parts.len(), 2);

        let ok = &parts[0];
        assert_eq!(ok.vertices().unwrap().len() % VERTEX_STRIDE, 0);
        assert_eq!(ok.indices().unwrap().len(), 36);
        assert_eq!(ok.color(), ElementKind::Wall.default_color());

        let failed = &parts[1];
        assert_eq!(failed.vertices().unwrap_err().entity, EntityId(20));
        assert!(failed.indices().is_err());
    }

    #[test]
    fn test_transform_folds_unit_scale() {
        let source = source();
        let parts = source.parts(EntityId(20));
        let t = parts[0].transform();
        // diagonal scaled to meters, translation (1000 mm) in meters
        assert_relative_eq!(t[0], 0.001);
        assert_relative_eq!(t[12], 1.0);
        assert_eq!(t[15], 1.0);
    }

    #[test]
    fn test_parts_of_unknown_or_bodiless_ids() {
        let source = source();
        assert!(source.parts(EntityId(21)).is_empty());
        assert!(source.parts(EntityId(22)).is_empty());
        assert!(source.parts(EntityId(999)).is_empty());
    }
}
