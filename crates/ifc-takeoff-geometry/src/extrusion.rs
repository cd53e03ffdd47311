// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linear extrusion of 2D profiles
//!
//! The profile lies in the local XY plane. The solid spans from the profile
//! to the profile moved by `direction * depth`; the direction may be oblique
//! but must leave the plane.

use crate::{Error, Mesh, Point2, Point3, Profile2D, Result, Vector3};

/// Extrude a profile into a closed solid
///
/// Caps get flat normals along the profile plane normal, side quads get the
/// flat normal `edge x direction`, so every face points outward for outer
/// rings as well as holes.
pub fn extrude_profile(profile: &Profile2D, depth: f64, direction: Vector3<f64>) -> Result<Mesh> {
    if !(depth.is_finite() && depth > 0.0) {
        return Err(Error::geometry(format!("Invalid extrusion depth {}", depth)));
    }
    let direction = direction
        .try_normalize(1e-12)
        .ok_or_else(|| Error::geometry("Zero extrusion direction"))?;
    if direction.z.abs() < 1e-9 {
        return Err(Error::geometry("Extrusion direction lies in the profile plane"));
    }

    let triangulation = profile.triangulate()?;
    let offset = direction * depth;

    // Solids that extrude below the plane are mirrored, so every ring flips
    let below = direction.z < 0.0;
    let up = Vector3::z() * direction.z.signum();

    let ring_vertices: usize = profile.rings().map(<[Point2<f64>]>::len).sum();
    let cap_points = triangulation.points.len();
    let mut mesh = Mesh::with_capacity(
        cap_points * 2 + ring_vertices * 4,
        triangulation.indices.len() * 2 + ring_vertices * 6,
    );

    // Caps: bottom faces away from the offset, top faces along it
    for (normal, shift) in [(-up, Vector3::zeros()), (up, offset)] {
        let base = mesh.vertex_count() as u32;
        for p in &triangulation.points {
            mesh.push_vertex(Point3::new(p.x, p.y, 0.0) + shift, normal);
        }
        for tri in triangulation.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]];
            let (pa, pb, pc) = (
                triangulation.points[a],
                triangulation.points[b],
                triangulation.points[c],
            );
            let cross = (pb - pa).perp(&(pc - pa));
            let (a, b, c) = (base + a as u32, base + b as u32, base + c as u32);
            if (cross > 0.0) == (normal.z > 0.0) {
                mesh.push_triangle(a, b, c);
            } else {
                mesh.push_triangle(a, c, b);
            }
        }
    }

    // Sides
    for ring in profile.rings() {
        let n = ring.len();
        for i in 0..n {
            let (p, q) = if below {
                (ring[(i + 1) % n], ring[i])
            } else {
                (ring[i], ring[(i + 1) % n])
            };
            let a0 = Point3::new(p.x, p.y, 0.0);
            let b0 = Point3::new(q.x, q.y, 0.0);
            let edge = b0 - a0;
            let Some(normal) = edge.cross(&direction).try_normalize(1e-12) else {
                continue;
            };
            let i_a0 = mesh.push_vertex(a0, normal);
            let i_b0 = mesh.push_vertex(b0, normal);
            let i_b1 = mesh.push_vertex(b0 + offset, normal);
            let i_a1 = mesh.push_vertex(a0 + offset, normal);
            mesh.push_triangle(i_a0, i_b0, i_b1);
            mesh.push_triangle(i_a0, i_b1, i_a1);
        }
    }

    Ok(mesh)
}
