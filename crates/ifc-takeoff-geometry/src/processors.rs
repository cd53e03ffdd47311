// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Processors - Implementations for various IFC geometry types
//!
//! Each processor handles one type of representation item and returns a
//! mesh in the item's own frame, in file units.

use crate::placement::{axis2_placement_2d, axis2_placement_3d, direction, point};
use crate::triangulation::{polygon_normal, triangulate_polygon_with_holes, PlaneBasis};
use crate::{extrude_profile, Error, Mesh, Point2, Point3, Profile2D, Result};
use ifc_takeoff_model::{DecodedEntity, EntityResolver, EntityResolverExt, IfcType};

use super::router::GeometryProcessor;

/// ExtrudedAreaSolid processor
///
/// Handles IfcExtrudedAreaSolid - the most common IFC geometry type.
/// Extrudes 2D profiles along a direction vector.
pub struct ExtrudedAreaSolidProcessor;

impl ExtrudedAreaSolidProcessor {
    /// Create new processor
    pub fn new() -> Self {
        Self
    }

    /// Extract a 2D profile from an IFC profile definition
    fn extract_profile(
        &self,
        profile_entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Profile2D> {
        let profile = match profile_entity.ifc_type {
            IfcType::IfcRectangleProfileDef => {
                // XDim (3), YDim (4)
                let x = self.positive(profile_entity, 3, "Missing XDim")?;
                let y = self.positive(profile_entity, 4, "Missing YDim")?;
                Profile2D::rectangle(x, y)
            }
            IfcType::IfcCircleProfileDef => {
                let radius = self.positive(profile_entity, 3, "Missing Radius")?;
                Profile2D::circle(radius, None)
            }
            IfcType::IfcArbitraryClosedProfileDef | IfcType::IfcArbitraryProfileDefWithVoids => {
                return self.extract_arbitrary_profile(profile_entity, resolver);
            }
            _ => {
                return Err(Error::unsupported_type(format!(
                    "Profile type {}",
                    profile_entity.ifc_type
                )))
            }
        };

        // Parameterized profiles carry an optional Position (2)
        Ok(match resolver.follow(profile_entity, 2) {
            Some(position) => profile.transformed(&axis2_placement_2d(&position, resolver)),
            None => profile,
        })
    }

    fn positive(&self, entity: &DecodedEntity, index: usize, message: &'static str) -> Result<f64> {
        entity
            .get_float(index)
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or(Error::invalid_attribute(entity.id, index, message))
    }

    /// Extract arbitrary profile, with InnerCurves (3) for the voided variant
    fn extract_arbitrary_profile(
        &self,
        entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Profile2D> {
        // OuterCurve at index 2
        let curve = resolver
            .follow(entity, 2)
            .ok_or(Error::invalid_attribute(entity.id, 2, "Missing OuterCurve"))?;

        let points = self.extract_polyline_points(&curve, resolver)?;
        let mut profile = Profile2D::new(points);
        if profile.outer.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 points"));
        }

        if entity.ifc_type == IfcType::IfcArbitraryProfileDefWithVoids {
            for inner in resolver.follow_list(entity, 3) {
                match self.extract_polyline_points(&inner, resolver) {
                    Ok(hole) => profile.add_hole(hole),
                    Err(err) => log::debug!("[Geometry] Skipping void {}: {}", inner.id, err),
                }
            }
        }

        Ok(profile)
    }

    /// Points of an IfcPolyline (Points at index 0)
    fn extract_polyline_points(
        &self,
        curve: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Vec<Point2<f64>>> {
        if curve.ifc_type != IfcType::IfcPolyline {
            return Err(Error::unsupported_type(format!("Curve type {}", curve.ifc_type)));
        }
        Ok(resolver
            .follow_list(curve, 0)
            .iter()
            .filter_map(|p| point(p))
            .map(|p| Point2::new(p.x, p.y))
            .collect())
    }
}

impl Default for ExtrudedAreaSolidProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for ExtrudedAreaSolidProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        // IfcExtrudedAreaSolid attributes:
        // 0: SweptArea (IfcProfileDef)
        // 1: Position (IfcAxis2Placement3D)
        // 2: ExtrudedDirection (IfcDirection)
        // 3: Depth (IfcPositiveLengthMeasure)

        let profile_entity = resolver
            .follow(entity, 0)
            .ok_or(Error::invalid_attribute(entity.id, 0, "Missing SweptArea"))?;
        let profile = self.extract_profile(&profile_entity, resolver)?;

        let direction = resolver
            .follow(entity, 2)
            .and_then(|d| direction(&d))
            .ok_or(Error::invalid_attribute(entity.id, 2, "Missing ExtrudedDirection"))?;

        let depth = entity
            .get_float(3)
            .ok_or(Error::invalid_attribute(entity.id, 3, "Missing Depth"))?;

        let mut mesh = extrude_profile(&profile, depth, direction)?;

        if let Some(position) = resolver.follow(entity, 1) {
            mesh.transform(&axis2_placement_3d(&position, resolver));
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

/// TriangulatedFaceSet processor
///
/// Handles IfcTriangulatedFaceSet - explicit triangle meshes (IFC4+)
pub struct TriangulatedFaceSetProcessor;

impl TriangulatedFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TriangulatedFaceSetProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for TriangulatedFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        // IfcTriangulatedFaceSet attributes:
        // 0: Coordinates (IfcCartesianPointList3D)
        // 1: Normals (optional)
        // 2: Closed (optional)
        // 3: CoordIndex (list of list of IfcPositiveInteger)

        let coordinates = resolver
            .follow(entity, 0)
            .ok_or(Error::invalid_attribute(entity.id, 0, "Missing Coordinates"))?;

        // IfcCartesianPointList3D has CoordList at index 0
        let coord_list = coordinates
            .get_list(0)
            .ok_or(Error::invalid_attribute(coordinates.id, 0, "Missing CoordList"))?;

        let mut positions = Vec::with_capacity(coord_list.len() * 3);
        for coord in coord_list {
            let values = coord
                .as_list()
                .ok_or(Error::invalid_attribute(coordinates.id, 0, "Expected coordinate triple"))?;
            for k in 0..3 {
                let v = values.get(k).and_then(|v| v.as_float()).unwrap_or(0.0);
                positions.push(v as f32);
            }
        }
        let vertex_count = coord_list.len() as i64;

        let face_list = entity
            .get_list(3)
            .ok_or(Error::invalid_attribute(entity.id, 3, "Missing CoordIndex"))?;

        // 1-based indices into the coordinate list
        let mut indices = Vec::with_capacity(face_list.len() * 3);
        for face in face_list {
            let triangle = face
                .as_list()
                .filter(|t| t.len() >= 3)
                .ok_or(Error::invalid_attribute(entity.id, 3, "Expected index triple"))?;
            for value in &triangle[..3] {
                let index = value
                    .as_integer()
                    .filter(|i| (1..=vertex_count).contains(i))
                    .ok_or_else(|| {
                        Error::geometry(format!(
                            "Face index {:?} out of range 1..={} in {}",
                            value, vertex_count, entity.id
                        ))
                    })?;
                indices.push((index - 1) as u32);
            }
        }

        Ok(Mesh {
            positions,
            normals: Vec::new(),
            indices,
        })
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTriangulatedFaceSet]
    }
}

/// FacetedBrep processor
///
/// Handles IfcFacetedBrep - explicit mesh with faces.
/// Supports faces with inner bounds (holes).
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Polygon of an IfcPolyLoop (Polygon at index 0)
    fn extract_loop_points(
        &self,
        loop_entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Option<Vec<Point3<f64>>> {
        let points: Vec<Point3<f64>> = resolver
            .follow_list(loop_entity, 0)
            .iter()
            .filter_map(|p| point(p))
            .collect();
        (points.len() >= 3).then_some(points)
    }

    /// Triangulate one planar face into `mesh` with a flat normal
    fn triangulate_face(
        &self,
        outer: &[Point3<f64>],
        holes: &[Vec<Point3<f64>>],
        mesh: &mut Mesh,
    ) {
        let normal = polygon_normal(outer);
        let base = mesh.vertex_count() as u32;

        let indices = if holes.is_empty() && outer.len() <= 4 {
            (1..outer.len() - 1).flat_map(|i| [0, i, i + 1]).collect()
        } else {
            let basis = PlaneBasis::new(outer[0], &normal);
            let holes_2d: Vec<Vec<Point2<f64>>> =
                holes.iter().map(|hole| basis.project(hole)).collect();
            match triangulate_polygon_with_holes(&basis.project(outer), &holes_2d) {
                Ok(indices) => indices,
                Err(err) => {
                    log::debug!("[Geometry] Fan-triangulating face: {}", err);
                    (1..outer.len() - 1).flat_map(|i| [0, i, i + 1]).collect()
                }
            }
        };

        let hole_points = holes.iter().filter(|h| h.len() >= 3).flatten();
        for p in outer.iter().chain(hole_points) {
            mesh.push_vertex(*p, normal);
        }
        for tri in indices.chunks_exact(3) {
            mesh.push_triangle(
                base + tri[0] as u32,
                base + tri[1] as u32,
                base + tri[2] as u32,
            );
        }
    }
}

impl Default for FacetedBrepProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for FacetedBrepProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        // IfcFacetedBrep(Outer) -> IfcClosedShell(CfsFaces) -> IfcFace(Bounds)
        let shell = resolver
            .follow(entity, 0)
            .ok_or(Error::invalid_attribute(entity.id, 0, "Missing Outer shell"))?;

        let mut mesh = Mesh::new();
        for face in resolver.follow_list(&shell, 0) {
            let mut outer: Option<Vec<Point3<f64>>> = None;
            let mut holes: Vec<Vec<Point3<f64>>> = Vec::new();

            for bound in resolver.follow_list(&face, 0) {
                // IfcFaceBound(Bound, Orientation)
                let Some(mut points) = resolver
                    .follow(&bound, 0)
                    .and_then(|l| self.extract_loop_points(&l, resolver))
                else {
                    continue;
                };
                if bound.get_bool(1) == Some(false) {
                    points.reverse();
                }

                if bound.ifc_type == IfcType::IfcFaceOuterBound || outer.is_none() {
                    if let Some(previous) = outer.replace(points) {
                        holes.push(previous);
                    }
                } else {
                    holes.push(points);
                }
            }

            if let Some(outer) = outer {
                self.triangulate_face(&outer, &holes, &mut mesh);
            }
        }

        if mesh.is_empty() {
            return Err(Error::geometry(format!("No usable faces in {}", entity.id)));
        }
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcFacetedBrep]
    }
}
