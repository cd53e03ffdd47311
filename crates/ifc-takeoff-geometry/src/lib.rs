// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC Takeoff Geometry
//!
//! Tessellates element bodies into triangle parts. The crate uses the
//! `EntityResolver` trait from `ifc-takeoff-model` for entity lookup, making
//! it independent of any specific parser implementation.
//!
//! ## Overview
//!
//! - **Profiles**: rectangle, circle and arbitrary polylines with voids
//! - **Extrusion**: closed solids from profiles, caps and sides outward-facing
//! - **Explicit meshes**: triangulated face sets and faceted breps
//! - **Placement**: object placement chains, mapped items and operators
//!
//! ## Architecture
//!
//! - [`GeometryProcessor`]: tessellates one kind of representation item
//! - [`GeometryRouter`]: flattens body representations and dispatches items
//! - [`ShapeSource`]: implements `GeometrySource` over a decoded model
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_takeoff_geometry::{extrude_profile, Profile2D, Vector3};
//!
//! let profile = Profile2D::rectangle(2.0, 1.0);
//! let mesh = extrude_profile(&profile, 3.0, Vector3::z())?;
//!
//! println!("Generated {} triangles", mesh.triangle_count());
//! ```

pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod placement;
pub mod processors;
pub mod profile;
pub mod router;
pub mod source;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use error::{Error, Result};
pub use extrusion::extrude_profile;
pub use mesh::Mesh;
pub use profile::{calculate_circle_segments, Profile2D, Triangulation};
pub use router::{GeometryProcessor, GeometryRouter, PlacedItem};
pub use source::{ShapeSource, TessellatedPart};
pub use triangulation::{polygon_normal, triangulate_polygon_with_holes, PlaneBasis};

pub use processors::{
    ExtrudedAreaSolidProcessor, FacetedBrepProcessor, TriangulatedFaceSetProcessor,
};
