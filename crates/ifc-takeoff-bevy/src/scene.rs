//! Mesh spawning for the visible part of the model
//!
//! Visible meshes are merged into one opaque and one transparent batch with
//! per-vertex colors. Batches are rebuilt when the model or the storey
//! selection changes.

use crate::Session;
use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use ifc_takeoff_model::{EntityId, Mesh as TakeoffMeshData};
use std::sync::Arc;

/// Scene plugin
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, rebuild_scene_system);
    }
}

/// Marker for spawned model batches
#[derive(Component)]
pub struct TakeoffMesh {
    pub transparent: bool,
}

/// What the current batches were built from
#[derive(Clone, Copy, PartialEq, Eq)]
struct SceneKey {
    takeoff: usize,
    storey: Option<EntityId>,
}

/// Vertex data accumulated for one batch, already in Bevy space
#[derive(Default)]
struct MeshBatch {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    indices: Vec<u32>,
}

impl MeshBatch {
    fn add(&mut self, mesh: &TakeoffMeshData) {
        let offset = self.positions.len() as u32;
        for p in mesh.vertices.chunks_exact(3) {
            // Z-up to Y-up
            self.positions.push([p[0], p[2], -p[1]]);
            self.colors.push(mesh.color);
        }
        self.indices.extend(mesh.indices.iter().map(|i| i + offset));
    }

    fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn build(self) -> Mesh {
        let normals = compute_normals(&self.positions, &self.indices);
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

fn rebuild_scene_system(
    mut commands: Commands,
    session: Res<Session>,
    existing: Query<Entity, With<TakeoffMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut built: Local<Option<SceneKey>>,
) {
    let key = session.takeoff().map(|takeoff| SceneKey {
        takeoff: Arc::as_ptr(takeoff) as usize,
        storey: session.storey_filter().selected(),
    });
    if *built == key {
        return;
    }
    *built = key;

    for entity in &existing {
        commands.entity(entity).despawn();
    }

    let frame = session.frame();
    let mut opaque = MeshBatch::default();
    let mut transparent = MeshBatch::default();
    for mesh in &frame.meshes {
        if mesh.color[3] < 1.0 {
            transparent.add(mesh);
        } else {
            opaque.add(mesh);
        }
    }
    debug!(
        "[Scene] {} meshes visible ({})",
        frame.meshes.len(),
        frame.storey_label
    );

    for (batch, is_transparent) in [(opaque, false), (transparent, true)] {
        if batch.is_empty() {
            continue;
        }
        let material = StandardMaterial {
            base_color: Color::WHITE,
            metallic: 0.0,
            perceptual_roughness: 0.6,
            reflectance: 0.3,
            double_sided: true,
            cull_mode: None,
            alpha_mode: if is_transparent {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            ..default()
        };
        commands.spawn((
            Mesh3d(meshes.add(batch.build())),
            MeshMaterial3d(materials.add(material)),
            Transform::default(),
            TakeoffMesh {
                transparent: is_transparent,
            },
        ));
    }
}

/// Area-weighted vertex normals from triangle positions and indices
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let p0 = Vec3::from_array(positions[i0]);
        let face = (Vec3::from_array(positions[i1]) - p0).cross(Vec3::from_array(positions[i2]) - p0);
        for i in [i0, i1, i2] {
            normals[i] += face;
        }
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(z: f32) -> TakeoffMeshData {
        TakeoffMeshData {
            element_id: EntityId(1),
            vertices: vec![0.0, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z],
            indices: vec![0, 1, 2],
            color: [1.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_batch_offsets_indices_and_swaps_axes() {
        let mut batch = MeshBatch::default();
        batch.add(&triangle(0.0));
        batch.add(&triangle(2.0));
        assert_eq!(batch.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(batch.positions[5], [0.0, 2.0, -1.0]);
        assert_eq!(batch.colors.len(), 6);
    }

    #[test]
    fn test_normals_of_horizontal_triangle_point_up() {
        let mut batch = MeshBatch::default();
        batch.add(&triangle(0.0));
        let normals = compute_normals(&batch.positions, &batch.indices);
        for n in normals {
            assert!((Vec3::from_array(n) - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_normals_skip_bad_indices() {
        let normals = compute_normals(&[[0.0; 3]], &[0, 5, 9]);
        assert_eq!(normals, vec![[0.0, 1.0, 0.0]]);
    }
}
