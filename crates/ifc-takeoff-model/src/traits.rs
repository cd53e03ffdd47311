// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser and model traits

use crate::{EntityResolver, ModelMetadata, Result};
use std::sync::Arc;

/// Entry point for reading an exchange file
///
/// # Example
///
/// ```ignore
/// use ifc_takeoff_model::IfcParser;
///
/// let model = parser.parse(&bytes)?;
/// println!("Schema: {}", model.metadata().schema_version);
/// ```
pub trait IfcParser: Send + Sync {
    /// Decode a whole file
    ///
    /// Fails only when the buffer as a whole is unreadable. Malformed
    /// individual records are skipped.
    fn parse(&self, bytes: &[u8]) -> Result<Arc<dyn IfcModel>>;
}

/// Read-only access to a decoded file
///
/// Models are `Send + Sync` so that aggregation and geometry baking can run
/// on separate threads over the same instance.
pub trait IfcModel: Send + Sync {
    /// Record lookup and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Factor from the file's length unit to meters
    ///
    /// 1.0 for meters, 0.001 for millimeters, 0.3048 for feet.
    fn unit_scale(&self) -> f64;

    /// Header information
    fn metadata(&self) -> &ModelMetadata;

    /// Records dropped while decoding
    fn skipped_records(&self) -> usize {
        0
    }
}
