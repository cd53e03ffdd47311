// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry source traits
//!
//! A geometry source hands out tessellated parts per element. Each part owns
//! its buffers; dropping the boxed handle releases them.

use crate::{EntityId, PartError};

/// Scalar slots per vertex in [`GeometryPart::vertices`]: position then normal
pub const VERTEX_STRIDE: usize = 6;

/// Column-major 4x4 identity
pub const IDENTITY_TRANSFORM: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// One tessellated piece of an element's body
///
/// Vertex data is in the part's local frame; [`GeometryPart::transform`]
/// takes it to world space.
pub trait GeometryPart {
    /// Interleaved vertices, [`VERTEX_STRIDE`] floats each
    fn vertices(&self) -> Result<&[f32], PartError>;

    /// Triangle indices into [`GeometryPart::vertices`]
    fn indices(&self) -> Result<&[u32], PartError>;

    /// Local-to-world placement, 16 elements in column-major order
    fn transform(&self) -> &[f64; 16];

    /// RGBA display color
    fn color(&self) -> [f32; 4];
}

/// Per-element access to tessellated geometry
pub trait GeometrySource: Send + Sync {
    /// Elements that carry a body representation, in file order
    fn entities_with_geometry(&self) -> Vec<EntityId>;

    /// Tessellate the parts of one element
    ///
    /// Returns an empty list for ids without geometry. Parts whose
    /// tessellation failed are still returned and report the failure from
    /// their buffer accessors.
    fn parts(&self, id: EntityId) -> Vec<Box<dyn GeometryPart + '_>>;
}
