// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Takeoff Core - semantic extraction and geometry baking
//!
//! Turns a decoded model into a [`BuildingModel`] snapshot and a list of
//! world-space meshes:
//!
//! - [`QuantityResolver`] - named quantities through property definitions
//! - [`SpatialHierarchy`] - storeys and element membership
//! - [`GeometryBaker`] - transformed mesh buffers and bounding boxes
//! - [`ModelAggregator`] - totals with fallback chains
//! - [`Takeoff`] / [`ModelStore`] - the load pipeline and its published result
//!
//! # Example
//!
//! ```ignore
//! use ifc_takeoff_core::ModelStore;
//!
//! let store = ModelStore::new();
//! let takeoff = store.load(&bytes)?;
//! println!("{:?} m2", takeoff.model.gross_floor_area);
//! ```

pub mod aggregate;
pub mod bake;
pub mod fallback;
pub mod pipeline;
pub mod quantity;
pub mod spatial;

pub use aggregate::{round2, ModelAggregator, STRUCTURAL_TYPES};
pub use bake::{meshes_bounds, transform_point, GeometryBaker};
pub use fallback::FallbackChain;
pub use pipeline::{ModelStore, Takeoff};
pub use quantity::QuantityResolver;
pub use spatial::SpatialHierarchy;

pub use ifc_takeoff_model::{
    Bounds, BuildingModel, Element, ElementKind, EntityId, Mesh, ParseError, Storey,
};
