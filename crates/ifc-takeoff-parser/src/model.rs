// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! StepModel - decoded file implementing `IfcModel`

use crate::arena::EntityArena;
use crate::scanner::{has_iso_magic, parse_header, EntityScanner, ISO_MAGIC};
use crate::units::extract_unit_scale;

use ifc_takeoff_model::{EntityResolver, IfcModel, ModelMetadata, ParseError, Result};

/// A fully decoded exchange file
pub struct StepModel {
    arena: EntityArena,
    unit_scale: f64,
    metadata: ModelMetadata,
}

impl StepModel {
    /// Decode raw file bytes
    ///
    /// Fails only for whole-file problems: invalid UTF-8, a missing
    /// ISO-10303-21 signature or DATA section, or no decodable record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes)?;
        Self::parse(content)
    }

    /// Decode file text
    pub fn parse(content: &str) -> Result<Self> {
        if !has_iso_magic(content) {
            return Err(ParseError::format(format!("missing {} signature", ISO_MAGIC)));
        }
        let scanner = EntityScanner::new(content).ok_or(ParseError::MissingSection("DATA"))?;

        let arena = EntityArena::decode(scanner);
        if arena.is_empty() {
            return Err(ParseError::NoEntities {
                skipped: arena.skipped(),
            });
        }

        let unit_scale = extract_unit_scale(&arena);
        let metadata = parse_header(content);

        log::info!(
            "[Parser] Decoded {} entities ({} skipped), schema {}, unit scale {}",
            arena.len(),
            arena.skipped(),
            if metadata.schema_version.is_empty() { "?" } else { metadata.schema_version.as_str() },
            unit_scale
        );

        Ok(Self {
            arena,
            unit_scale,
            metadata,
        })
    }

    /// Direct access to the arena
    pub fn arena(&self) -> &EntityArena {
        &self.arena
    }
}

impl IfcModel for StepModel {
    fn resolver(&self) -> &dyn EntityResolver {
        &self.arena
    }

    fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn skipped_records(&self) -> usize {
        self.arena.skipped()
    }
}
