// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Takeoff Model - shared types and traits
//!
//! This crate holds the vocabulary every other takeoff crate speaks:
//!
//! - [`IfcParser`] / [`IfcModel`] - decoding a file and reading the result
//! - [`EntityResolver`] - record lookup and reference resolution
//! - [`GeometrySource`] / [`GeometryPart`] - tessellated parts per element
//! - [`BuildingModel`], [`Mesh`], [`Bounds`] - the aggregated snapshot
//!
//! # Example
//!
//! ```ignore
//! use ifc_takeoff_model::{EntityId, IfcParser};
//!
//! let model = parser.parse(&bytes)?;
//! if let Some(entity) = model.resolver().get(EntityId(123)) {
//!     println!("Entity type: {}", entity.ifc_type);
//! }
//! ```

pub mod building;
pub mod error;
pub mod geometry;
pub mod resolver;
pub mod traits;
pub mod types;

pub use building::*;
pub use error::*;
pub use geometry::*;
pub use resolver::*;
pub use traits::*;
pub use types::*;
