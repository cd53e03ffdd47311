// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record tokenizer built from nom combinators
//!
//! Turns one `#id=TYPE(...);` record into a [`DecodedEntity`].

use ifc_takeoff_model::{AttributeValue, DecodedEntity, EntityId, IfcType};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::{opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::borrow::Cow;
use thiserror::Error;

/// Why a single record could not be decoded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("invalid entity id {0:?}")]
    InvalidId(String),
    #[error("malformed attribute list near {0:?}")]
    Attributes(String),
}

/// Raw token borrowed from the source text
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    EntityRef(u32),
    /// String body with escapes still encoded
    String(&'a str),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Enum(&'a str),
    List(Vec<Token<'a>>),
    TypedValue(&'a str, Vec<Token<'a>>),
    Null,
    Derived,
}

impl Token<'_> {
    /// Convert to an owned attribute, decoding string escapes
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(decode_string(s).into_owned()),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Bool(b) => AttributeValue::Bool(*b),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Token::to_attribute_value).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                name.to_ascii_uppercase(),
                args.iter().map(Token::to_attribute_value).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

// ============================================================================
// Parsing Primitives
// ============================================================================

fn comment(input: &str) -> IResult<&str, ()> {
    value((), (tag("/*"), take_until("*/"), tag("*/"))).parse(input)
}

/// Whitespace and `/* */` comments
pub(crate) fn ws(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), comment)))).parse(input)
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('#')(input)?;
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
    match digits.parse::<u32>() {
        Ok(id) => Ok((rest, Token::EntityRef(id))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// `'text'`, where `''` stands for one quote
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('\'')(input)?;
    let bytes = input.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if bytes.get(end + 1) == Some(&b'\'') {
                end += 2;
                continue;
            }
            return Ok((&input[end + 1..], Token::String(&input[..end])));
        }
        end += 1;
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (input, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let is_float = num_str.contains(['.', 'e', 'E']);
    let token = if is_float {
        lexical_core::parse::<f64>(num_str.as_bytes()).map(Token::Float)
    } else {
        lexical_core::parse::<i64>(num_str.as_bytes()).map(Token::Integer)
    };
    match token {
        Ok(token) => Ok((input, token)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// `.VALUE.`, with `.T.` and `.F.` read as booleans
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, name) = delimited(char('.'), keyword, char('.')).parse(input)?;
    let token = match name {
        "T" => Token::Bool(true),
        "F" => Token::Bool(false),
        _ => Token::Enum(name),
    };
    Ok((input, token))
}

fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    value(Token::Null, char('$')).parse(input)
}

fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    value(Token::Derived, char('*')).parse(input)
}

fn parenthesized(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token<'_>> {
    parenthesized.map(Token::List).parse(input)
}

/// `IFCLABEL('text')`
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = keyword(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = parenthesized(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

/// Top-level `( ... )` of a record or header entry
pub(crate) fn attribute_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    parenthesized(input)
}

// ============================================================================
// String decoding
// ============================================================================

/// Decode the escape sequences of a string body
///
/// Handles `''`, `\\`, `\X\hh` (ISO 8859-1), `\X2\hhhh...\X0\` (UCS-2) and
/// `\S\c` (upper half of the current code page). `\P?\` page switches are
/// dropped. Malformed escapes are kept literally.
pub fn decode_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\'', '\\']) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find(['\'', '\\']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("''") {
            out.push('\'');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\X2\\") {
            match tail.find("\\X0\\") {
                Some(end) if decode_ucs2(&tail[..end], &mut out) => rest = &tail[end + 4..],
                _ => {
                    out.push_str("\\X2\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\S\\") {
            match tail.chars().next() {
                Some(c) if c.is_ascii() => {
                    out.push(char::from(c as u8 + 0x80));
                    rest = &tail[1..];
                }
                _ => {
                    out.push_str("\\S\\");
                    rest = tail;
                }
            }
        } else if rest.starts_with("\\P") && rest.get(3..4) == Some("\\") {
            rest = &rest[4..];
        } else {
            let c = &rest[..1];
            out.push_str(c);
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_ucs2(hex: &str, out: &mut String) -> bool {
    if hex.len() % 4 != 0 || !hex.is_ascii() {
        return false;
    }
    let units: Option<Vec<u16>> = (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
        .collect();
    match units {
        Some(units) => {
            out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
            true
        }
        None => false,
    }
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Decode one record
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity, RecordError> {
    let input = input.trim_start();

    let (input, _) = char::<&str, nom::error::Error<&str>>('#')
        .parse(input)
        .map_err(|_| RecordError::Expected("# at start of entity"))?;

    let (input, id_str) =
        take_while1::<_, &str, nom::error::Error<&str>>(|c: char| c.is_ascii_digit())
            .parse(input)
            .map_err(|_| RecordError::Expected("entity id"))?;
    let id: u32 = id_str
        .parse()
        .map_err(|_| RecordError::InvalidId(id_str.to_string()))?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| RecordError::Expected("= after entity id"))?;

    let (input, type_name) = keyword(input).map_err(|_| RecordError::Expected("type name"))?;
    let (input, _) = ws(input).unwrap_or((input, ()));

    let (rest, tokens) = attribute_list(input).map_err(|_| {
        RecordError::Attributes(input.chars().take(40).collect())
    })?;

    let rest = rest.trim_start();
    if !(rest.is_empty() || rest.starts_with(';')) {
        return Err(RecordError::Attributes(rest.chars().take(40).collect()));
    }

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(Token::to_attribute_value).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_parse_string_keeps_raw_body() {
        let (remaining, token) = step_string("'it''s a test',").unwrap();
        assert_eq!(remaining, ",");
        assert_eq!(token, Token::String("it''s a test"));
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(step_string("'open").is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(number("42").unwrap().1, Token::Integer(42));
        assert_eq!(number("-7").unwrap().1, Token::Integer(-7));
        match number("1.5E-3").unwrap().1 {
            Token::Float(f) => assert!((f - 0.0015).abs() < 1e-12),
            other => panic!("Expected float, got {:?}", other),
        }
        match number("3.").unwrap().1 {
            Token::Float(f) => assert_eq!(f, 3.0),
            other => panic!("Expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_enum_and_bool() {
        assert_eq!(enumeration(".ELEMENT.").unwrap().1, Token::Enum("ELEMENT"));
        assert_eq!(enumeration(".T.").unwrap().1, Token::Bool(true));
        assert_eq!(enumeration(".F.").unwrap().1, Token::Bool(false));
    }

    #[test]
    fn test_parse_nested_list() {
        let (remaining, token) = list("((0.,0.), (1.,0.) )").unwrap();
        assert_eq!(remaining, "");
        match token {
            Token::List(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[0], Token::List(inner) if inner.len() == 2));
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_skips_comments() {
        let (remaining, _) = ws("  /* note */\n  #5").unwrap();
        assert_eq!(remaining, "#5");
    }

    #[test]
    fn test_decode_string_escapes() {
        assert_eq!(decode_string("plain"), "plain");
        assert_eq!(decode_string("it''s"), "it's");
        assert_eq!(decode_string("Gr\\X2\\00FC\\X0\\n"), "Grün");
        assert_eq!(decode_string("\\X\\E4"), "ä");
        assert_eq!(decode_string("a\\\\b"), "a\\b");
        assert_eq!(decode_string("bad \\X2\\ZZ"), "bad \\X2\\ZZ");
    }

    #[test]
    fn test_parse_entity() {
        let entity =
            parse_entity("#1=IFCWALL('abc',$,#2,IFCLABEL('x'),.T.,(#3,#4),*);").unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.ifc_type, IfcType::IfcWall);
        assert_eq!(entity.attributes.len(), 7);
        assert_eq!(entity.get_string(0), Some("abc"));
        assert_eq!(entity.get_ref(2), Some(EntityId(2)));
        assert_eq!(entity.get_string(3), Some("x"));
        assert_eq!(entity.get_bool(4), Some(true));
        assert_eq!(entity.get_refs(5), Some(vec![EntityId(3), EntityId(4)]));
        assert_eq!(entity.get(6), Some(&AttributeValue::Derived));
    }

    #[test]
    fn test_parse_entity_rejects_garbage() {
        assert!(parse_entity("#1=IFCWALL('abc',,#2);").is_err());
        assert!(parse_entity("IFCWALL();").is_err());
        assert!(parse_entity("#1=IFCWALL('abc') junk;").is_err());
    }
}
