// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local triangle mesh produced by the processors

use ifc_takeoff_model::VERTEX_STRIDE;
use nalgebra::{Matrix4, Point3, Vector3};

/// Triangle mesh in an item's local frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Flattened `[x, y, z, ...]`
    pub positions: Vec<f32>,
    /// Flattened `[nx, ny, nz, ...]`; empty until computed
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a vertex and return its index
    pub fn push_vertex(&mut self, p: Point3<f64>, n: Vector3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions
            .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        self.normals
            .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append another mesh, offsetting its indices
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertex_count() as u32;
        self.ensure_normals();
        self.positions.extend_from_slice(&other.positions);
        if other.normals.len() == other.positions.len() {
            self.normals.extend_from_slice(&other.normals);
        } else {
            let mut filled = other.clone();
            filled.ensure_normals();
            self.normals.extend_from_slice(&filled.normals);
        }
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Apply an affine transform to positions and normals
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for p in self.positions.chunks_exact_mut(3) {
            let v = matrix.transform_point(&Point3::new(p[0] as f64, p[1] as f64, p[2] as f64));
            p.copy_from_slice(&[v.x as f32, v.y as f32, v.z as f32]);
        }
        for n in self.normals.chunks_exact_mut(3) {
            let v = matrix.transform_vector(&Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64));
            let v = v.try_normalize(1e-12).unwrap_or(v);
            n.copy_from_slice(&[v.x as f32, v.y as f32, v.z as f32]);
        }
    }

    /// Fill in area-weighted vertex normals if none were provided
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        let mut acc = vec![Vector3::<f64>::zeros(); self.vertex_count()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) = (self.point(a), self.point(b), self.point(c))
            else {
                continue;
            };
            let face = (pb - pa).cross(&(pc - pa));
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        self.normals = acc
            .into_iter()
            .flat_map(|n| {
                let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::z);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect();
    }

    fn point(&self, index: usize) -> Option<Point3<f64>> {
        let p = self.positions.get(index * 3..index * 3 + 3)?;
        Some(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
    }

    /// Vertices interleaved as position then normal, [`VERTEX_STRIDE`] floats each
    pub fn interleaved(&mut self) -> Vec<f32> {
        self.ensure_normals();
        let mut out = Vec::with_capacity(self.vertex_count() * VERTEX_STRIDE);
        for (p, n) in self
            .positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
        {
            out.extend_from_slice(p);
            out.extend_from_slice(n);
        }
        out
    }

    /// First index that points past the vertex buffer
    pub fn invalid_index(&self) -> Option<u32> {
        let count = self.vertex_count() as u32;
        self.indices.iter().copied().find(|&i| i >= count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> Mesh {
        Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_ensure_normals_follows_winding() {
        let mut mesh = triangle();
        mesh.ensure_normals();
        assert_eq!(mesh.normals.len(), 9);
        assert_relative_eq!(mesh.normals[2], 1.0);
    }

    #[test]
    fn test_interleaved_layout() {
        let mut mesh = triangle();
        let data = mesh.interleaved();
        assert_eq!(data.len(), 3 * VERTEX_STRIDE);
        assert_eq!(&data[6..9], &[1.0, 0.0, 0.0]);
        assert_relative_eq!(data[11], 1.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = triangle();
        a.merge(&triangle());
        assert_eq!(a.vertex_count(), 6);
        assert_eq!(&a.indices[3..], &[3, 4, 5]);
        assert_eq!(a.normals.len(), a.positions.len());
    }

    #[test]
    fn test_transform_translates_positions_only() {
        let mut mesh = triangle();
        mesh.ensure_normals();
        mesh.transform(&Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(&mesh.positions[..3], &[1.0, 2.0, 3.0]);
        assert_relative_eq!(mesh.normals[2], 1.0);
    }

    #[test]
    fn test_invalid_index() {
        let mut mesh = triangle();
        assert_eq!(mesh.invalid_index(), None);
        mesh.indices.push(7);
        assert_eq!(mesh.invalid_index(), Some(7));
    }
}
