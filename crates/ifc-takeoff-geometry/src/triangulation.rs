// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr plus the planar projection needed to feed it 3D
//! faces.

use crate::{Error, Point2, Point3, Result, Vector3};

/// Signed area of a closed ring, positive when counter-clockwise
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let mut sign = 0.0f64;
    for i in 0..n {
        let (p0, p1, p2) = (points[i], points[(i + 1) % n], points[(i + 2) % n]);
        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
        if cross.abs() > 1e-10 {
            if sign != 0.0 && sign.signum() != cross.signum() {
                return false;
            }
            sign = cross;
        }
    }
    true
}

/// Triangulate a ring with optional holes
///
/// Returns indices into the concatenation of `outer` and every hole with
/// at least three points, in order.
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    let n = outer.len();
    if n < 3 {
        return Err(Error::triangulation("Need at least 3 points in outer boundary"));
    }

    let holes: Vec<&Vec<Point2<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();
    if holes.is_empty() {
        if n == 3 {
            return Ok(vec![0, 1, 2]);
        }
        if n <= 8 && is_convex(outer) {
            return Ok((1..n - 1).flat_map(|i| [0, i, i + 1]).collect());
        }
    }

    let total = n + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut vertices = Vec::with_capacity(total * 2);
    vertices.extend(outer.iter().flat_map(|p| [p.x, p.y]));

    let mut hole_starts = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_starts.push(vertices.len() / 2);
        vertices.extend(hole.iter().flat_map(|p| [p.x, p.y]));
    }

    let indices = earcutr::earcut(&vertices, &hole_starts, 2)
        .map_err(|e| Error::triangulation(format!("{:?}", e)))?;
    if indices.is_empty() {
        return Err(Error::triangulation("Degenerate polygon"));
    }
    Ok(indices)
}

/// Newell normal of a planar polygon, +Z for degenerate input
pub fn polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::<f64>::zeros();
    for i in 0..n {
        let (current, next) = (points[i], points[(i + 1) % n]);
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.try_normalize(1e-12).unwrap_or_else(Vector3::z)
}

/// In-plane basis for a polygon with the given normal
#[derive(Clone, Copy, Debug)]
pub struct PlaneBasis {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
}

impl PlaneBasis {
    /// Right-handed basis so that `u x v` equals `normal`
    pub fn new(origin: Point3<f64>, normal: &Vector3<f64>) -> Self {
        let reference = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
            Vector3::x()
        } else if normal.y.abs() <= normal.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let v = normal.cross(&reference).normalize();
        let u = v.cross(normal).normalize();
        Self { origin, u, v }
    }

    pub fn project(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points
            .iter()
            .map(|p| {
                let d = p - self.origin;
                Point2::new(d.dot(&self.u), d.dot(&self.v))
            })
            .collect()
    }
}
