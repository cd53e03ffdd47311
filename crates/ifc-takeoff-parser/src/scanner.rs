// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record scanner using SIMD-accelerated byte searching
//!
//! Splits a section of the exchange file into `;`-terminated records without
//! decoding them. Quotes and `/* */` comments are honoured so that a `;`
//! inside a string never ends a record.

use crate::tokenizer::{attribute_list, ws, Token};
use ifc_takeoff_model::ModelMetadata;
use memchr::{memchr, memchr3, memmem};

/// Magic token every exchange file starts with
pub const ISO_MAGIC: &str = "ISO-10303-21";

/// One undecoded record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Record text including the trailing `;`
    pub text: &'a str,
    /// Byte offset of the record in the file
    pub offset: usize,
}

/// Scanner over the records of one section
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Scanner over the DATA section, or `None` if the file has none
    pub fn new(content: &'a str) -> Option<Self> {
        Self::section(content, "DATA;")
    }

    /// Scanner starting right after the first `marker` (e.g. `HEADER;`)
    pub fn section(content: &'a str, marker: &str) -> Option<Self> {
        let start = memmem::find(content.as_bytes(), marker.as_bytes())?;
        Some(Self {
            content,
            pos: start + marker.len(),
        })
    }

    /// Next record of the section; `None` at `ENDSEC;` or end of input
    pub fn next_record(&mut self) -> Option<RawRecord<'a>> {
        let bytes = self.content.as_bytes();
        self.pos = skip_blank(bytes, self.pos);
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let end = record_end(bytes, start);
        self.pos = end;

        let text = &self.content[start..end];
        if text.trim_end_matches(';').trim_end() == "ENDSEC" {
            self.pos = bytes.len();
            return None;
        }
        Some(RawRecord { text, offset: start })
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// True if the buffer opens with the ISO-10303-21 magic
pub fn has_iso_magic(content: &str) -> bool {
    content
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with(ISO_MAGIC)
}

fn skip_blank(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes[pos..].starts_with(b"/*") {
            pos = comment_end(bytes, pos + 2);
        } else {
            return pos;
        }
    }
}

/// Index just past the record's `;`
fn record_end(bytes: &[u8], mut pos: usize) -> usize {
    while let Some(off) = memchr3(b';', b'\'', b'/', &bytes[pos..]) {
        pos += off;
        match bytes[pos] {
            b';' => return pos + 1,
            b'\'' => pos = string_end(bytes, pos + 1),
            _ if bytes.get(pos + 1) == Some(&b'*') => pos = comment_end(bytes, pos + 2),
            _ => pos += 1,
        }
    }
    bytes.len()
}

/// Index just past the closing quote; `pos` points after the opening quote
fn string_end(bytes: &[u8], mut pos: usize) -> usize {
    while let Some(off) = memchr(b'\'', &bytes[pos..]) {
        pos += off;
        if bytes.get(pos + 1) == Some(&b'\'') {
            pos += 2;
        } else {
            return pos + 1;
        }
    }
    bytes.len()
}

fn comment_end(bytes: &[u8], pos: usize) -> usize {
    memmem::find(&bytes[pos..], b"*/")
        .map(|off| pos + off + 2)
        .unwrap_or(bytes.len())
}

/// Read `FILE_NAME` and `FILE_SCHEMA` from the HEADER section
///
/// Missing or malformed entries leave their fields empty.
pub fn parse_header(content: &str) -> ModelMetadata {
    let mut meta = ModelMetadata::default();
    let Some(scanner) = EntityScanner::section(content, "HEADER;") else {
        return meta;
    };

    for record in scanner {
        let Some((keyword, args)) = header_entry(record.text) else {
            continue;
        };
        match keyword.to_ascii_uppercase().as_str() {
            "FILE_SCHEMA" => {
                if let Some(Token::List(schemas)) = args.first() {
                    if let Some(schema) = schemas.iter().find_map(header_string) {
                        meta.schema_version = schema;
                    }
                }
            }
            "FILE_NAME" => {
                // (name, time_stamp, author, organization, preprocessor, originating_system, authorization)
                meta.file_name = args.first().and_then(header_string);
                meta.timestamp = args.get(1).and_then(header_string);
                meta.originating_system = args.get(5).and_then(header_string);
            }
            _ => {}
        }
    }
    meta
}

fn header_entry(text: &str) -> Option<(&str, Vec<Token<'_>>)> {
    let text = text.trim_end_matches(';');
    let paren = text.find('(')?;
    let keyword = text[..paren].trim();
    let (body, _) = ws(&text[paren..]).ok()?;
    let (_, args) = attribute_list(body).ok()?;
    Some((keyword, args))
}

fn header_string(token: &Token<'_>) -> Option<String> {
    match token.to_attribute_value().as_string() {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project; with semicolon',$,$,$,$,$,#2);
/* a comment; with semicolon */
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);#4=IFCWALL('it''s',$,'Wall 1',$,$,#5,#6,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_splits_records() {
        let records: Vec<_> = EntityScanner::new(TEST_IFC).unwrap().collect();
        assert_eq!(records.len(), 4);
        assert!(records[0].text.starts_with("#1=IFCPROJECT"));
        assert!(records[0].text.ends_with("#2);"));
        assert!(records[2].text.starts_with("#3=IFCSIUNIT"));
        assert!(records[3].text.starts_with("#4=IFCWALL('it''s'"));
        assert_eq!(&TEST_IFC[records[1].offset..records[1].offset + 2], "#2");
    }

    #[test]
    fn test_missing_data_section() {
        assert!(EntityScanner::new("ISO-10303-21;\nHEADER;\nENDSEC;\n").is_none());
    }

    #[test]
    fn test_unterminated_record_runs_to_end() {
        let records: Vec<_> = EntityScanner::new("DATA;\n#1=IFCWALL('x'").unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "#1=IFCWALL('x'");
    }

    #[test]
    fn test_iso_magic() {
        assert!(has_iso_magic("\u{feff}  ISO-10303-21;"));
        assert!(!has_iso_magic("<xml/>"));
    }

    #[test]
    fn test_parse_header() {
        let meta = parse_header(TEST_IFC);
        assert_eq!(meta.schema_version, "IFC4");
        assert_eq!(meta.file_name.as_deref(), Some("test.ifc"));
        assert_eq!(meta.timestamp.as_deref(), Some("2024-01-01T00:00:00"));
        assert_eq!(meta.originating_system.as_deref(), Some("App"));
    }
}
