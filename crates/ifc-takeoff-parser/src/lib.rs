// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Takeoff Parser - ISO-10303-21 reader
//!
//! Reads an exchange file into an arena of decoded records and implements
//! the `ifc-takeoff-model` traits on top of it.
//!
//! # Features
//!
//! - **Record splitting** with `memchr`, aware of strings and comments
//! - **Tokenization** using `nom` combinators and `lexical-core` numbers
//! - **Eager decoding** into an arena with type and property-relation indices
//! - **Header and unit** extraction
//!
//! # Example
//!
//! ```ignore
//! use ifc_takeoff_model::{IfcParser, IfcType};
//! use ifc_takeoff_parser::StepReader;
//!
//! let model = StepReader::new().parse(&bytes)?;
//! let walls = model.resolver().entities_by_type(&IfcType::IfcWall);
//! println!("Found {} walls", walls.len());
//! ```

mod arena;
mod model;
mod scanner;
mod tokenizer;
mod units;

pub use arena::EntityArena;
pub use model::StepModel;
pub use scanner::{parse_header, EntityScanner, RawRecord};
pub use tokenizer::{decode_string, parse_entity, RecordError, Token};
pub use units::extract_unit_scale;

use ifc_takeoff_model::{IfcModel, IfcParser, Result};
use std::sync::Arc;

/// ISO-10303-21 reader implementing `IfcParser`
#[derive(Default, Clone, Copy, Debug)]
pub struct StepReader;

impl StepReader {
    pub fn new() -> Self {
        Self
    }
}

impl IfcParser for StepReader {
    fn parse(&self, bytes: &[u8]) -> Result<Arc<dyn IfcModel>> {
        StepModel::from_bytes(bytes).map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Quick parse function for simple use cases
pub fn parse(bytes: &[u8]) -> Result<Arc<dyn IfcModel>> {
    StepReader::new().parse(bytes)
}
