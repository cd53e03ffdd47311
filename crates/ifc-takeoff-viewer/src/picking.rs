// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ray picking against baked meshes
//!
//! Each mesh is first tested against its bounding box with the slab method,
//! then triangle by triangle with the Moller-Trumbore test.

use ifc_takeoff_model::{Bounds, EntityId, Mesh};
use nalgebra::{Point3, Vector3};

/// Determinants below this are treated as parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// A ray with a unit direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Direction is normalized; a zero direction falls back to -Z
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.try_normalize(1e-15).unwrap_or(-Vector3::z()),
        }
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Entry distance into a box, `None` if missed or behind the origin
    pub fn intersect_bounds(&self, bounds: &Bounds) -> Option<f64> {
        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;
        for axis in 0..3 {
            let inv = 1.0 / self.direction[axis];
            let t1 = (bounds.min[axis] - self.origin[axis]) * inv;
            let t2 = (bounds.max[axis] - self.origin[axis]) * inv;
            // NaN from 0 * inf means the origin lies on the slab plane
            let (lo, hi) = if t1.is_nan() || t2.is_nan() {
                (f64::NEG_INFINITY, f64::INFINITY)
            } else {
                (t1.min(t2), t1.max(t2))
            };
            t_enter = t_enter.max(lo);
            t_exit = t_exit.min(hi);
        }
        (t_enter <= t_exit && t_exit >= 0.0).then(|| t_enter.max(0.0))
    }

    /// Distance to a triangle, hit from either side
    pub fn intersect_triangle(
        &self,
        a: &Point3<f64>,
        b: &Point3<f64>,
        c: &Point3<f64>,
    ) -> Option<f64> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(&edge2);
        let det = edge1.dot(&p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(&edge1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(&q) * inv_det;
        (t > PARALLEL_EPSILON).then_some(t)
    }
}

/// Closest intersection with a mesh set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub point: Point3<f64>,
    pub distance: f64,
    pub element_id: EntityId,
}

fn corner(p: [f32; 3]) -> Point3<f64> {
    Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)
}

/// Closest hit of `ray` on one mesh
pub fn pick_mesh(ray: &Ray, mesh: &Mesh) -> Option<f64> {
    let box_distance = ray.intersect_bounds(&mesh.bounds())?;
    let mut closest: Option<f64> = None;
    for index in 0..mesh.triangle_count() {
        let Some([a, b, c]) = mesh.triangle(index) else {
            continue;
        };
        if let Some(t) = ray.intersect_triangle(&corner(a), &corner(b), &corner(c)) {
            if t >= box_distance - 1e-9 && closest.is_none_or(|d| t < d) {
                closest = Some(t);
            }
        }
    }
    closest
}

/// Closest hit of `ray` across `meshes`
pub fn pick<'a>(ray: &Ray, meshes: impl IntoIterator<Item = &'a Mesh>) -> Option<Hit> {
    let mut closest: Option<Hit> = None;
    for mesh in meshes {
        if let Some(t) = pick_mesh(ray, mesh) {
            if closest.is_none_or(|hit| t < hit.distance) {
                closest = Some(Hit {
                    point: ray.at(t),
                    distance: t,
                    element_id: mesh.element_id,
                });
            }
        }
    }
    closest
}

/// Window pixel position to normalized device coordinates
///
/// Pixels grow right and down; NDC grows right and up.
pub fn screen_to_ndc(screen: [f64; 2], viewport: [f64; 2]) -> [f64; 2] {
    let width = viewport[0].max(1.0);
    let height = viewport[1].max(1.0);
    [
        2.0 * screen[0] / width - 1.0,
        1.0 - 2.0 * screen[1] / height,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit square at height `z`, two triangles
    fn square(id: u32, z: f32) -> Mesh {
        Mesh {
            element_id: EntityId(id),
            vertices: vec![
                0.0, 0.0, z, //
                1.0, 0.0, z, //
                1.0, 1.0, z, //
                0.0, 1.0, z,
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            color: [1.0; 4],
        }
    }

    fn down_from(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, 10.0), -Vector3::z())
    }

    #[test]
    fn test_triangle_hit_from_both_sides() {
        let (a, b, c) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let t = down_from(0.25, 0.25).intersect_triangle(&a, &b, &c).unwrap();
        assert_relative_eq!(t, 10.0);

        let up = Ray::new(Point3::new(0.25, 0.25, -2.0), Vector3::z());
        assert_relative_eq!(up.intersect_triangle(&a, &b, &c).unwrap(), 2.0);

        assert!(down_from(0.75, 0.75).intersect_triangle(&a, &b, &c).is_none());
        // behind the origin
        let away = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::z());
        assert!(away.intersect_triangle(&a, &b, &c).is_none());
        // parallel
        let flat = Ray::new(Point3::new(-1.0, 0.25, 0.0), Vector3::x());
        assert!(flat.intersect_triangle(&a, &b, &c).is_none());
    }

    #[test]
    fn test_closest_mesh_wins() {
        let meshes = vec![square(1, 0.0), square(2, 3.0), square(3, 1.0)];
        let hit = pick(&down_from(0.5, 0.25), &meshes).unwrap();
        assert_eq!(hit.element_id, EntityId(2));
        assert_relative_eq!(hit.point, Point3::new(0.5, 0.25, 3.0), epsilon = 1e-9);
        assert_relative_eq!(hit.distance, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_miss_is_none() {
        let meshes = vec![square(1, 0.0)];
        assert!(pick(&down_from(2.0, 2.0), &meshes).is_none());
        assert!(pick(&down_from(0.5, 0.5), &Vec::<Mesh>::new()).is_none());
    }

    #[test]
    fn test_bounds_slab_test() {
        let bounds = Bounds::from_points([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert_relative_eq!(down_from(0.5, 0.5).intersect_bounds(&bounds).unwrap(), 9.0);
        assert!(down_from(1.5, 0.5).intersect_bounds(&bounds).is_none());
        // origin inside the box
        let inside = Ray::new(Point3::new(0.5, 0.5, 0.5), Vector3::x());
        assert_eq!(inside.intersect_bounds(&bounds), Some(0.0));
    }

    #[test]
    fn test_screen_to_ndc() {
        assert_eq!(screen_to_ndc([400.0, 300.0], [800.0, 600.0]), [0.0, 0.0]);
        assert_eq!(screen_to_ndc([0.0, 0.0], [800.0, 600.0]), [-1.0, 1.0]);
        assert_eq!(screen_to_ndc([800.0, 600.0], [800.0, 600.0]), [1.0, -1.0]);
    }
}
