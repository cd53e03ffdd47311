// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load pipeline and published model store

use crate::aggregate::ModelAggregator;
use crate::bake::{meshes_bounds, GeometryBaker};
use ifc_takeoff_geometry::ShapeSource;
use ifc_takeoff_model::{Bounds, BuildingModel, EntityId, IfcModel, Mesh, Result};
use ifc_takeoff_parser::StepModel;
use parking_lot::RwLock;
use std::sync::Arc;

/// Everything produced from one file
#[derive(Clone, Debug)]
pub struct Takeoff {
    pub model: BuildingModel,
    /// World-space meshes in meters
    pub meshes: Vec<Mesh>,
    /// Box around every mesh, `None` for a model without geometry
    pub bounds: Option<Bounds>,
}

impl Takeoff {
    /// Parse a file buffer, then aggregate and bake side by side
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let start = std::time::Instant::now();

        let model: Arc<dyn IfcModel> = match StepModel::from_bytes(bytes) {
            Ok(model) => Arc::new(model),
            Err(err) => {
                log::warn!("[Loader] Load failed: {}", err);
                return Err(err);
            }
        };
        if model.skipped_records() > 0 {
            log::debug!("[Loader] {} malformed records skipped", model.skipped_records());
        }

        let source = ShapeSource::new(Arc::clone(&model));
        let (building, meshes) = rayon::join(
            || ModelAggregator::new(model.as_ref(), &source).aggregate(),
            || GeometryBaker::new(&source).bake_all(),
        );
        let bounds = meshes_bounds(&meshes);

        log::info!(
            "[Loader] {} ({}): {} elements, {} meshes in {}ms",
            building.project_name,
            building.schema,
            building.elements.len(),
            meshes.len(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            model: building,
            meshes,
            bounds,
        })
    }

    /// Meshes of the elements shown for a storey selection
    ///
    /// An id that names no storey shows everything.
    pub fn meshes_in_storey(&self, storey: Option<EntityId>) -> Vec<&Mesh> {
        match self.model.selected_storey(storey) {
            None => self.meshes.iter().collect(),
            Some(storey) => self
                .meshes
                .iter()
                .filter(|m| storey.element_ids.contains(&m.element_id))
                .collect(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}

/// Holds the currently published takeoff
///
/// Readers get a shared handle; a load replaces it in one assignment.
#[derive(Default)]
pub struct ModelStore {
    current: RwLock<Option<Arc<Takeoff>>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published takeoff
    pub fn publish(&self, takeoff: Takeoff) -> Arc<Takeoff> {
        let takeoff = Arc::new(takeoff);
        *self.current.write() = Some(Arc::clone(&takeoff));
        takeoff
    }

    /// Load and publish a file; on error the previous takeoff stays
    pub fn load(&self, bytes: &[u8]) -> Result<Arc<Takeoff>> {
        Takeoff::from_bytes(bytes).map(|takeoff| self.publish(takeoff))
    }

    pub fn current(&self) -> Option<Arc<Takeoff>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
