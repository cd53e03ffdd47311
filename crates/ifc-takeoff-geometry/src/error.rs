// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for tessellation

use ifc_takeoff_model::{EntityId, PartError};
use thiserror::Error;

/// Geometry processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Tessellation errors
///
/// These never abort a load. The geometry source turns them into failed
/// parts, which the baker skips.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry processing error
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Missing entity error
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Required attribute missing or of the wrong shape
    #[error("Invalid attribute {index} on {entity}: {message}")]
    InvalidAttribute {
        entity: EntityId,
        index: usize,
        message: &'static str,
    },

    /// Profile processing error
    #[error("Profile error: {0}")]
    Profile(String),

    /// Triangulation error
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// No processor for this representation item
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),
}

impl Error {
    pub fn geometry(msg: impl Into<String>) -> Self {
        Error::Geometry(msg.into())
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        Error::Profile(msg.into())
    }

    pub fn triangulation(msg: impl Into<String>) -> Self {
        Error::Triangulation(msg.into())
    }

    pub fn invalid_attribute(entity: EntityId, index: usize, message: &'static str) -> Self {
        Error::InvalidAttribute {
            entity,
            index,
            message,
        }
    }

    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType(type_name.into())
    }

    /// Attach the owning element for reporting through `GeometryPart`
    pub fn into_part_error(self, entity: EntityId) -> PartError {
        PartError {
            entity,
            message: self.to_string(),
        }
    }
}
