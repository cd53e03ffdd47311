// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Takeoff Viewer - engine-independent interaction state
//!
//! Camera math, ray picking, distance measurement, dimension overlays and
//! storey filtering over the meshes of a [`Takeoff`]. Front ends feed
//! pointer and keyboard events into a [`ViewerSession`] and draw its
//! [`FrameSnapshot`]. All coordinates are Z-up meters.
//!
//! [`Takeoff`]: ifc_takeoff_core::Takeoff

pub mod camera;
pub mod config;
pub mod dimensions;
pub mod filter;
pub mod measure;
pub mod picking;
pub mod session;

pub use camera::{spherical, OrbitCamera};
pub use config::ViewerConfig;
pub use dimensions::{box_edges, Axis, DimensionLine, DimensionOverlay, Dimensions};
pub use filter::StoreyFilter;
pub use measure::{MeasureMode, Measurement, MeasurementAnnotation, PickOutcome};
pub use picking::{pick, pick_mesh, screen_to_ndc, Hit, Ray};
pub use session::{FrameSnapshot, PointerButton, ViewerSession};
