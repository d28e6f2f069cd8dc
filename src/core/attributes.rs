//! XML Attribute Parsing
//!
//! Lenient parser for the attribute section of a start tag. Values are
//! entity-decoded; malformed pairs are skipped rather than rejected.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name
    pub name: Cow<'a, [u8]>,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    /// Create a new attribute
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        Attribute {
            name: Cow::Borrowed(name),
            value,
        }
    }

    /// Get the name as a string
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name.as_ref()).ok()
    }

    /// Get the value as a string
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Split a raw tag (`<name attrs...>` or `<name attrs.../>`) into its attribute section
pub fn tag_attribute_bytes(tag: &[u8]) -> &[u8] {
    let mut pos = 1; // Skip '<'
    if matches!(tag.get(1), Some(b'/' | b'?')) {
        pos = 2;
    }
    while pos < tag.len() && is_name_char(tag[pos]) {
        pos += 1;
    }

    let mut end = tag.len();
    if tag.ends_with(b"/>") || tag.ends_with(b"?>") {
        end -= 2;
    } else if tag.ends_with(b">") {
        end -= 1;
    }

    if pos >= end {
        &[]
    } else {
        &tag[pos..end]
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'
pub fn parse_attributes(input: &[u8]) -> Vec<Attribute<'_>> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] == b'/' || input[pos] == b'>' {
            break;
        }

        if !is_name_start_char(input[pos]) {
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() || input[pos] != b'=' {
            // Attribute without value (HTML-style boolean)
            attrs.push(Attribute::new(name, Cow::Borrowed(b"" as &[u8])));
            continue;
        }
        pos += 1; // Skip '='

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        let quote = input[pos];
        if quote != b'"' && quote != b'\'' {
            let value_start = pos;
            while pos < input.len() && !is_whitespace(input[pos]) && input[pos] != b'/' && input[pos] != b'>' {
                pos += 1;
            }
            attrs.push(Attribute::new(name, decode_text(&input[value_start..pos])));
            continue;
        }

        pos += 1; // Skip opening quote
        let value_start = pos;
        while pos < input.len() && input[pos] != quote {
            pos += 1;
        }
        attrs.push(Attribute::new(name, decode_text(&input[value_start..pos])));

        if pos < input.len() {
            pos += 1; // Skip closing quote
        }
    }

    attrs
}

/// Check if byte is whitespace
#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"1\" parent=\"0\"");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name_str(), Some("id"));
        assert_eq!(attrs[0].value_str(), Some("1"));
        assert_eq!(attrs[1].name_str(), Some("parent"));
        assert_eq!(attrs[1].value_str(), Some("0"));
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(b" v='PNCT'");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("PNCT"));
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(" name=\"&quot;Частный корреспондент&quot;\"".as_bytes());
        assert_eq!(attrs[0].value_str(), Some("\"Частный корреспондент\""));
    }

    #[test]
    fn test_whitespace_and_empty() {
        assert!(parse_attributes(b"").is_empty());
        let attrs = parse_attributes(b"  id  =  \"test\"  ");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("test"));
    }

    #[test]
    fn test_tag_attribute_bytes() {
        assert_eq!(tag_attribute_bytes(b"<g v=\"NOUN\"/>"), b" v=\"NOUN\"");
        assert_eq!(tag_attribute_bytes(b"<token id=\"1\" text=\"x\">"), b" id=\"1\" text=\"x\"");
        assert_eq!(tag_attribute_bytes(b"<v>"), b"");
        assert_eq!(tag_attribute_bytes(b"<?xml version=\"1.0\"?>"), b" version=\"1.0\"");
    }
}
