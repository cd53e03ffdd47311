// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry baking
//!
//! Copies tessellated parts out of a `GeometrySource` into world-space
//! buffers, or folds them into an axis-aligned box. Part handles are dropped
//! as soon as their data has been read.

use ifc_takeoff_model::{
    Bounds, EntityId, GeometryPart, GeometrySource, Mesh, PartError, VERTEX_STRIDE,
};

/// `M * [x, y, z, 1]` for a column-major 4x4 matrix, dropping w
#[inline]
pub fn transform_point(m: &[f64; 16], [x, y, z]: [f64; 3]) -> [f64; 3] {
    [
        m[0] * x + m[4] * y + m[8] * z + m[12],
        m[1] * x + m[5] * y + m[9] * z + m[13],
        m[2] * x + m[6] * y + m[10] * z + m[14],
    ]
}

/// Feed every world-space vertex position of a part to `visit`
fn visit_world_positions(
    part: &dyn GeometryPart,
    mut visit: impl FnMut([f64; 3]),
) -> Result<usize, PartError> {
    let vertices = part.vertices()?;
    let transform = part.transform();
    let mut count = 0;
    for vertex in vertices.chunks_exact(VERTEX_STRIDE) {
        let local = [vertex[0] as f64, vertex[1] as f64, vertex[2] as f64];
        visit(transform_point(transform, local));
        count += 1;
    }
    Ok(count)
}

fn bake_part(id: EntityId, part: &dyn GeometryPart) -> Result<Mesh, PartError> {
    let mut vertices = Vec::new();
    let count = visit_world_positions(part, |p| {
        vertices.extend_from_slice(&[p[0] as f32, p[1] as f32, p[2] as f32]);
    })?;
    let indices = part.indices()?;
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(PartError {
            entity: id,
            message: format!("index {} past {} vertices", bad, count),
        });
    }
    Ok(Mesh {
        element_id: id,
        vertices,
        indices: indices.to_vec(),
        color: part.color(),
    })
}

/// Bakes parts of one geometry source
#[derive(Clone, Copy)]
pub struct GeometryBaker<'a> {
    source: &'a dyn GeometrySource,
}

impl<'a> GeometryBaker<'a> {
    pub fn new(source: &'a dyn GeometrySource) -> Self {
        Self { source }
    }

    /// World-space meshes of one element, failed parts skipped
    pub fn bake_element(&self, id: EntityId) -> Vec<Mesh> {
        let mut meshes = Vec::new();
        for part in self.source.parts(id) {
            match bake_part(id, part.as_ref()) {
                Ok(mesh) if !mesh.indices.is_empty() => meshes.push(mesh),
                Ok(_) => {}
                Err(err) => log::debug!("[Bake] Skipping part: {}", err),
            }
        }
        meshes
    }

    /// World-space box of one element; `None` without any vertex
    pub fn bounding_box(&self, id: EntityId) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        let mut total = 0;
        for part in self.source.parts(id) {
            match visit_world_positions(part.as_ref(), |p| bounds.expand(p)) {
                Ok(count) => total += count,
                Err(err) => log::debug!("[Bake] Skipping part: {}", err),
            }
        }
        (total > 0).then_some(bounds)
    }

    /// Meshes of every element with geometry, in file order
    pub fn bake_all(&self) -> Vec<Mesh> {
        self.source
            .entities_with_geometry()
            .into_iter()
            .flat_map(|id| self.bake_element(id))
            .collect()
    }
}

/// Box around every vertex of `meshes`
pub fn meshes_bounds(meshes: &[Mesh]) -> Option<Bounds> {
    let mut bounds = Bounds::empty();
    for mesh in meshes {
        for p in mesh.vertices.chunks_exact(3) {
            bounds.expand([p[0] as f64, p[1] as f64, p[2] as f64]);
        }
    }
    bounds.is_valid().then_some(bounds)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_takeoff_model::IDENTITY_TRANSFORM;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Part whose buffers are plain vectors; counts live instances
    pub struct MockPart {
        pub vertices: Result<Vec<f32>, PartError>,
        pub indices: Vec<u32>,
        pub transform: [f64; 16],
        live: Arc<AtomicUsize>,
    }

    impl Drop for MockPart {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl GeometryPart for MockPart {
        fn vertices(&self) -> Result<&[f32], PartError> {
            self.vertices.as_deref().map_err(Clone::clone)
        }

        fn indices(&self) -> Result<&[u32], PartError> {
            Ok(&self.indices)
        }

        fn transform(&self) -> &[f64; 16] {
            &self.transform
        }

        fn color(&self) -> [f32; 4] {
            [0.5, 0.5, 0.5, 1.0]
        }
    }

    /// Part description: positions (3 per vertex) or an error, plus a transform
    #[derive(Clone)]
    pub struct PartShape {
        pub positions: Option<Vec<f32>>,
        pub indices: Vec<u32>,
        pub transform: [f64; 16],
    }

    impl PartShape {
        pub fn boxed(min: [f32; 3], max: [f32; 3]) -> Self {
            let mut positions = Vec::new();
            for &x in &[min[0], max[0]] {
                for &y in &[min[1], max[1]] {
                    for &z in &[min[2], max[2]] {
                        positions.extend_from_slice(&[x, y, z]);
                    }
                }
            }
            Self {
                positions: Some(positions),
                indices: vec![0, 1, 2, 5, 6, 7],
                transform: IDENTITY_TRANSFORM,
            }
        }

        pub fn failed() -> Self {
            Self {
                positions: None,
                indices: Vec::new(),
                transform: IDENTITY_TRANSFORM,
            }
        }
    }

    #[derive(Default)]
    pub struct MockSource {
        pub parts: HashMap<EntityId, Vec<PartShape>>,
        pub order: Vec<EntityId>,
        pub live: Arc<AtomicUsize>,
        pub created: Arc<AtomicUsize>,
    }

    impl MockSource {
        pub fn with(mut self, id: u32, parts: Vec<PartShape>) -> Self {
            self.order.push(EntityId(id));
            self.parts.insert(EntityId(id), parts);
            self
        }
    }

    impl GeometrySource for MockSource {
        fn entities_with_geometry(&self) -> Vec<EntityId> {
            self.order.clone()
        }

        fn parts(&self, id: EntityId) -> Vec<Box<dyn GeometryPart + '_>> {
            let Some(shapes) = self.parts.get(&id) else {
                return Vec::new();
            };
            shapes
                .iter()
                .map(|shape| {
                    self.live.fetch_add(1, Ordering::SeqCst);
                    self.created.fetch_add(1, Ordering::SeqCst);
                    let vertices = shape
                        .positions
                        .as_ref()
                        .map(|p| {
                            p.chunks_exact(3)
                                .flat_map(|v| [v[0], v[1], v[2], 0.0, 0.0, 1.0])
                                .collect()
                        })
                        .ok_or(PartError {
                            entity: id,
                            message: "broken".into(),
                        });
                    Box::new(MockPart {
                        vertices,
                        indices: shape.indices.clone(),
                        transform: shape.transform,
                        live: Arc::clone(&self.live),
                    }) as Box<dyn GeometryPart>
                })
                .collect()
        }
    }

    fn translation(t: [f64; 3]) -> [f64; 16] {
        let mut m = IDENTITY_TRANSFORM;
        m[12..15].copy_from_slice(&t);
        m
    }

    fn triangle(transform: [f64; 16]) -> PartShape {
        PartShape {
            positions: Some(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            indices: vec![0, 1, 2],
            transform,
        }
    }

    #[test]
    fn test_identity_bake_is_exact() {
        let source = MockSource::default().with(1, vec![triangle(IDENTITY_TRANSFORM)]);
        let meshes = GeometryBaker::new(&source).bake_element(EntityId(1));
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertices, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(meshes[0].element_id, EntityId(1));
    }

    #[test]
    fn test_translation_bake() {
        let source = MockSource::default().with(1, vec![triangle(translation([1.0, 2.0, 3.0]))]);
        let meshes = GeometryBaker::new(&source).bake_element(EntityId(1));
        assert_eq!(
            meshes[0].vertices,
            vec![1.0, 2.0, 3.0, 2.0, 2.0, 3.0, 1.0, 3.0, 3.0]
        );
    }

    #[test]
    fn test_column_major_rotation() {
        // 90 degrees about Z: x -> y
        let mut m = IDENTITY_TRANSFORM;
        m[0] = 0.0;
        m[1] = 1.0;
        m[4] = -1.0;
        m[5] = 0.0;
        let p = transform_point(&m, [1.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], 0.0);
        assert_relative_eq!(p[1], 1.0);
    }

    #[test]
    fn test_failed_parts_are_skipped_and_released() {
        let source = MockSource::default().with(
            1,
            vec![
                triangle(IDENTITY_TRANSFORM),
                PartShape::failed(),
                triangle(translation([5.0, 0.0, 0.0])),
            ],
        );
        let baker = GeometryBaker::new(&source);
        assert_eq!(baker.bake_element(EntityId(1)).len(), 2);
        assert_eq!(source.live.load(Ordering::SeqCst), 0);

        let bounds = baker.bounding_box(EntityId(1)).unwrap();
        assert_eq!(bounds.max, [6.0, 1.0, 0.0]);
        assert_eq!(source.live.load(Ordering::SeqCst), 0);
        assert_eq!(source.created.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_out_of_range_index_skips_part() {
        let mut bad = triangle(IDENTITY_TRANSFORM);
        bad.indices = vec![0, 1, 9];
        let source = MockSource::default().with(1, vec![bad]);
        assert!(GeometryBaker::new(&source).bake_element(EntityId(1)).is_empty());
    }

    #[test]
    fn test_bounding_box_without_vertices() {
        let source = MockSource::default().with(1, vec![PartShape::failed()]).with(2, vec![]);
        let baker = GeometryBaker::new(&source);
        assert!(baker.bounding_box(EntityId(1)).is_none());
        assert!(baker.bounding_box(EntityId(2)).is_none());
        assert!(baker.bounding_box(EntityId(3)).is_none());
    }

    #[test]
    fn test_bake_all_and_bounds() {
        let source = MockSource::default()
            .with(1, vec![PartShape::boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])])
            .with(2, vec![PartShape::boxed([2.0, 0.0, -1.0], [3.0, 2.0, 0.0])]);
        let meshes = GeometryBaker::new(&source).bake_all();
        assert_eq!(meshes.len(), 2);
        let bounds = meshes_bounds(&meshes).unwrap();
        assert_eq!(bounds.min, [0.0, 0.0, -1.0]);
        assert_eq!(bounds.max, [3.0, 2.0, 1.0]);
        assert!(meshes_bounds(&[]).is_none());
    }
}
