// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for loading a building model

use crate::EntityId;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that abort a whole load
///
/// Individual malformed records never produce one of these; they are skipped
/// where they are read.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The buffer does not start like an ISO-10303-21 exchange file
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// The buffer is not valid UTF-8
    #[error("IFC file is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// A mandatory section is missing
    #[error("Missing {0} section")]
    MissingSection(&'static str),

    /// The DATA section holds no decodable record
    #[error("No decodable entities ({skipped} malformed records skipped)")]
    NoEntities { skipped: usize },

    /// Entity not found
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }
}

/// Error reported by a geometry part whose tessellation failed
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("Geometry part of {entity} failed: {message}")]
pub struct PartError {
    pub entity: EntityId,
    pub message: String,
}
