// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer session
//!
//! Owns the camera, measurement and overlay state of one viewport and turns
//! discrete pointer and keyboard events into updates. Rendering front ends
//! read a [`FrameSnapshot`] once per frame.

use crate::camera::OrbitCamera;
use crate::config::ViewerConfig;
use crate::dimensions::{DimensionOverlay, Dimensions};
use crate::filter::StoreyFilter;
use crate::measure::{Measurement, MeasurementAnnotation, PickOutcome};
use crate::picking::{pick, screen_to_ndc, Hit};
use ifc_takeoff_core::Takeoff;
use ifc_takeoff_model::{EntityId, Mesh};
use nalgebra::Point3;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    button: PointerButton,
    start: [f64; 2],
    last: [f64; 2],
    dragged: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug)]
pub struct FrameSnapshot<'a> {
    pub eye: Point3<f64>,
    pub target: Point3<f64>,
    pub meshes: Vec<&'a Mesh>,
    pub annotations: &'a [MeasurementAnnotation],
    pub pending: Option<Point3<f64>>,
    pub dimensions: Option<&'a DimensionOverlay>,
    pub measuring: bool,
    pub storey_label: String,
}

/// Interactive state of one viewport
pub struct ViewerSession {
    config: ViewerConfig,
    camera: OrbitCamera,
    measurement: Measurement,
    dimensions: Dimensions,
    filter: StoreyFilter,
    takeoff: Option<Arc<Takeoff>>,
    viewport: [f64; 2],
    press: Option<Press>,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            camera: OrbitCamera::default(),
            measurement: Measurement::default(),
            dimensions: Dimensions::default(),
            filter: StoreyFilter::default(),
            takeoff: None,
            viewport: [1280.0, 720.0],
            press: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn takeoff(&self) -> Option<&Arc<Takeoff>> {
        self.takeoff.as_ref()
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn storey_filter(&self) -> StoreyFilter {
        self.filter
    }

    /// Replace the displayed model
    ///
    /// Recenters the camera, rebuilds the dimension overlay and drops
    /// measurements and the storey selection of the previous model.
    pub fn load(&mut self, takeoff: Arc<Takeoff>) {
        if let Some(bounds) = &takeoff.bounds {
            self.camera.frame_bounds(bounds);
        }
        self.dimensions.set_bounds(takeoff.bounds, &self.config);
        self.measurement.clear();
        self.filter.show_all();
        self.press = None;
        log::info!(
            "[Viewer] Showing {} ({} meshes)",
            takeoff.model.project_name,
            takeoff.meshes.len()
        );
        self.takeoff = Some(takeoff);
    }

    /// Window size in pixels
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = [width.max(1.0), height.max(1.0)];
    }

    pub fn aspect(&self) -> f64 {
        self.viewport[0] / self.viewport[1]
    }

    pub fn pointer_down(&mut self, button: PointerButton, position: [f64; 2]) {
        self.press = Some(Press {
            button,
            start: position,
            last: position,
            dragged: false,
        });
    }

    /// Drag the camera while a button is held
    pub fn pointer_move(&mut self, position: [f64; 2]) {
        let Some(press) = self.press.as_mut() else {
            return;
        };
        let dx = position[0] - press.last[0];
        let dy = position[1] - press.last[1];
        press.last = position;
        let travel = (position[0] - press.start[0]).hypot(position[1] - press.start[1]);
        if travel > self.config.click_threshold {
            press.dragged = true;
        }
        match press.button {
            // dragging down tilts the view up
            PointerButton::Primary => self.camera.orbit(-dx, dy, &self.config),
            PointerButton::Secondary | PointerButton::Middle => {
                self.camera.pan(dx, dy, &self.config)
            }
        }
    }

    /// Release a button; a primary release without a drag is a click
    pub fn pointer_up(&mut self, button: PointerButton, position: [f64; 2]) -> Option<PickOutcome> {
        let press = self.press.take()?;
        if press.button != button {
            return None;
        }
        let travel = (position[0] - press.start[0]).hypot(position[1] - press.start[1]);
        let is_click =
            button == PointerButton::Primary && !press.dragged && travel <= self.config.click_threshold;
        if is_click {
            self.click(position)
        } else {
            None
        }
    }

    pub fn wheel(&mut self, steps: f64) {
        self.camera.zoom(steps, &self.config);
    }

    /// First visible surface under a window position
    pub fn pick_at(&self, position: [f64; 2]) -> Option<Hit> {
        let takeoff = self.takeoff.as_ref()?;
        let ndc = screen_to_ndc(position, self.viewport);
        let ray = self.camera.ray(ndc, self.aspect(), &self.config);
        pick(&ray, self.filter.visible_meshes(&takeoff.model, &takeoff.meshes))
    }

    /// Pick and feed the measurement; no hit does nothing
    pub fn click(&mut self, position: [f64; 2]) -> Option<PickOutcome> {
        let hit = self.pick_at(position)?;
        log::debug!("[Viewer] Picked {} at {:?}", hit.element_id, hit.point);
        Some(self.measurement.pick(hit.point, &self.config))
    }

    pub fn set_measuring(&mut self, on: bool) {
        self.measurement.set_measuring(on);
    }

    pub fn toggle_measuring(&mut self) -> bool {
        self.measurement.toggle()
    }

    pub fn clear_measurements(&mut self) {
        self.measurement.clear();
    }

    pub fn set_dimensions_visible(&mut self, visible: bool) {
        self.dimensions.set_visible(visible, &self.config);
    }

    pub fn toggle_dimensions(&mut self) -> bool {
        self.dimensions.toggle(&self.config)
    }

    /// Isometric view of the whole model
    pub fn home(&mut self) {
        let bounds = self.takeoff.as_ref().and_then(|t| t.bounds);
        self.camera.home(bounds.as_ref());
    }

    pub fn select_storey(&mut self, storey: Option<EntityId>) {
        if let Some(takeoff) = &self.takeoff {
            self.filter.select(storey, &takeoff.model);
        }
    }

    pub fn next_storey(&mut self) {
        if let Some(takeoff) = &self.takeoff {
            self.filter.cycle(&takeoff.model, true);
        }
    }

    pub fn previous_storey(&mut self) {
        if let Some(takeoff) = &self.takeoff {
            self.filter.cycle(&takeoff.model, false);
        }
    }

    pub fn show_all_storeys(&mut self) {
        self.filter.show_all();
    }

    pub fn frame(&self) -> FrameSnapshot<'_> {
        let (meshes, storey_label) = match &self.takeoff {
            Some(takeoff) => (
                self.filter.visible_meshes(&takeoff.model, &takeoff.meshes),
                self.filter.label(&takeoff.model),
            ),
            None => (Vec::new(), String::new()),
        };
        FrameSnapshot {
            eye: self.camera.position(),
            target: self.camera.target,
            meshes,
            annotations: self.measurement.annotations(),
            pending: self.measurement.pending(),
            dimensions: self.dimensions.overlay(),
            measuring: self.measurement.is_measuring(),
            storey_label,
        }
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}
