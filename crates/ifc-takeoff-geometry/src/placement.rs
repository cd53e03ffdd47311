// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placements and transformation operators as matrices

use ifc_takeoff_model::{DecodedEntity, EntityId, EntityResolver, EntityResolverExt, IfcType};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::sync::Arc;

/// Deepest `IfcLocalPlacement` chain that is followed
pub const MAX_PLACEMENT_DEPTH: usize = 64;

/// Coordinates of an `IfcCartesianPoint`, z padded with zero
pub fn point(entity: &DecodedEntity) -> Option<Point3<f64>> {
    entity.get_coords(0).map(|[x, y, z]| Point3::new(x, y, z))
}

/// Normalized ratios of an `IfcDirection`
pub fn direction(entity: &DecodedEntity) -> Option<Vector3<f64>> {
    entity
        .get_coords(0)
        .and_then(|[x, y, z]| Vector3::new(x, y, z).try_normalize(1e-12))
}

fn follow_point(
    entity: &DecodedEntity,
    index: usize,
    resolver: &dyn EntityResolver,
) -> Option<Point3<f64>> {
    resolver.follow(entity, index).and_then(|p| point(&p))
}

fn follow_direction(
    entity: &DecodedEntity,
    index: usize,
    resolver: &dyn EntityResolver,
) -> Option<Vector3<f64>> {
    resolver.follow(entity, index).and_then(|d| direction(&d))
}

/// Right-handed frame from a primary axis and a reference direction
///
/// The reference is projected onto the plane normal to `z`. When it is
/// missing or parallel to `z`, the world axis least aligned with `z` stands
/// in for it.
fn orthonormal_frame(z: Vector3<f64>, reference: Option<Vector3<f64>>) -> [Vector3<f64>; 3] {
    let project = |r: Vector3<f64>| (r - z * r.dot(&z)).try_normalize(1e-9);
    let x = reference.and_then(project).unwrap_or_else(|| {
        let fallback = if z.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        project(fallback).unwrap_or_else(Vector3::x)
    });
    [x, z.cross(&x), z]
}

fn frame_matrix([x, y, z]: [Vector3<f64>; 3], origin: Point3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        x.x, y.x, z.x, origin.x, //
        x.y, y.y, z.y, origin.y, //
        x.z, y.z, z.z, origin.z, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// `IfcAxis2Placement3D(Location, Axis, RefDirection)` as a matrix
pub fn axis2_placement_3d(entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    let origin = follow_point(entity, 0, resolver).unwrap_or_else(Point3::origin);
    let z = follow_direction(entity, 1, resolver).unwrap_or_else(Vector3::z);
    let reference = follow_direction(entity, 2, resolver);
    frame_matrix(orthonormal_frame(z, reference), origin)
}

/// `IfcAxis2Placement2D(Location, RefDirection)` as a homogeneous 2D matrix
pub fn axis2_placement_2d(entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix3<f64> {
    let origin = follow_point(entity, 0, resolver).unwrap_or_else(Point3::origin);
    let x = follow_direction(entity, 1, resolver)
        .and_then(|d| Vector3::new(d.x, d.y, 0.0).try_normalize(1e-9))
        .unwrap_or_else(Vector3::x);
    Matrix3::new(
        x.x, -x.y, origin.x, //
        x.y, x.x, origin.y, //
        0.0, 0.0, 1.0,
    )
}

/// Axis placement entity as a 3D matrix; identity for other types
pub fn placement_matrix(entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    match entity.ifc_type {
        IfcType::IfcAxis2Placement3D => axis2_placement_3d(entity, resolver),
        IfcType::IfcAxis2Placement2D => {
            let m = axis2_placement_2d(entity, resolver);
            Matrix4::new(
                m[(0, 0)], m[(0, 1)], 0.0, m[(0, 2)], //
                m[(1, 0)], m[(1, 1)], 0.0, m[(1, 2)], //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            )
        }
        _ => Matrix4::identity(),
    }
}

/// World matrix of an `IfcLocalPlacement(PlacementRelTo, RelativePlacement)`
///
/// Walks the PlacementRelTo chain up to [`MAX_PLACEMENT_DEPTH`] links and
/// stops early on a cycle, treating the remainder as identity.
pub fn local_placement(entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    let mut chain: Vec<EntityId> = Vec::new();
    let mut matrix = Matrix4::identity();
    let mut parent = placement_step(entity, resolver, &mut matrix, &mut chain);
    while let Some(placement) = parent {
        parent = placement_step(&placement, resolver, &mut matrix, &mut chain);
    }
    matrix
}

/// Apply one link of the chain and return its parent
fn placement_step(
    placement: &DecodedEntity,
    resolver: &dyn EntityResolver,
    matrix: &mut Matrix4<f64>,
    chain: &mut Vec<EntityId>,
) -> Option<Arc<DecodedEntity>> {
    if placement.ifc_type != IfcType::IfcLocalPlacement {
        return None;
    }
    if chain.contains(&placement.id) || chain.len() >= MAX_PLACEMENT_DEPTH {
        log::debug!("[Geometry] Placement chain at {} cut short", placement.id);
        return None;
    }
    chain.push(placement.id);

    if let Some(relative) = resolver.follow(placement, 1) {
        *matrix = placement_matrix(&relative, resolver) * *matrix;
    }
    resolver.follow(placement, 0)
}

/// `IfcCartesianTransformationOperator3D` and its non-uniform variant
///
/// Attributes: Axis1 (0), Axis2 (1), LocalOrigin (2), Scale (3), Axis3 (4),
/// then Scale2 (5) and Scale3 (6) for the non-uniform form.
pub fn transformation_operator(
    entity: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Matrix4<f64> {
    let z = follow_direction(entity, 4, resolver).unwrap_or_else(Vector3::z);
    let axis1 = follow_direction(entity, 0, resolver);
    let [x, mut y, z] = orthonormal_frame(z, axis1);
    if let Some(axis2) = follow_direction(entity, 1, resolver) {
        // Axis2 may select the left-handed frame
        if axis2.dot(&y) < 0.0 {
            y = -y;
        }
    }
    let origin = follow_point(entity, 2, resolver).unwrap_or_else(Point3::origin);

    let scale = entity.get_float(3).filter(|s| *s > 0.0).unwrap_or(1.0);
    let non_uniform = entity.ifc_type == IfcType::IfcCartesianTransformationOperator3DnonUniform;
    let (scale2, scale3) = if non_uniform {
        (
            entity.get_float(5).filter(|s| *s > 0.0).unwrap_or(scale),
            entity.get_float(6).filter(|s| *s > 0.0).unwrap_or(scale),
        )
    } else {
        (scale, scale)
    };

    frame_matrix([x * scale, y * scale2, z * scale3], origin)
}

/// Column-major copy of a matrix
pub fn to_column_major(matrix: &Matrix4<f64>) -> [f64; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}
