//! XML Attribute Parsing
//!
//! Parses the attribute region of a start tag (everything between the element
//! name and the closing `>` or `/>`).

use super::entities::decode_text;
use super::tokenizer::ParseError;
use super::unicode::is_whitespace_byte;
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a [u8],
    /// Attribute value (normalized, entities decoded)
    pub value: Cow<'a, [u8]>,
    /// Local name (after colon, if namespaced)
    pub local_name: &'a [u8],
    /// Namespace prefix (before colon), if any
    pub prefix: Option<&'a [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        let (prefix, local_name) = split_name(name);
        Attribute {
            name,
            value,
            local_name,
            prefix,
        }
    }

    /// `xmlns` or `xmlns:*`
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == b"xmlns" || self.prefix == Some(&b"xmlns"[..])
    }
}

/// Split a name into prefix and local name at the colon
pub fn split_name(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    match memchr(b':', name) {
        Some(colon) => (Some(&name[..colon]), &name[colon + 1..]),
        None => (None, name),
    }
}

/// Parse attributes from raw tag content.
///
/// `offset` is the absolute position of `input` in the document, used for
/// error positions. With `strict`, a repeated attribute name is an error.
pub fn parse_attributes(
    input: &[u8],
    offset: usize,
    strict: bool,
) -> Result<Vec<Attribute<'_>>, ParseError> {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        while pos < input.len() && is_whitespace_byte(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        let name_start = pos;
        while pos < input.len() && !is_whitespace_byte(input[pos]) && input[pos] != b'=' {
            pos += 1;
        }
        let name = &input[name_start..pos];
        if name.first().is_none_or(|b| matches!(b, b'"' | b'\'' | b'<')) {
            return Err(ParseError::new("Malformed attribute name", offset + name_start));
        }

        while pos < input.len() && is_whitespace_byte(input[pos]) {
            pos += 1;
        }
        if input.get(pos) != Some(&b'=') {
            return Err(ParseError::new("Attribute without value", offset + name_start));
        }
        pos += 1;
        while pos < input.len() && is_whitespace_byte(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(ParseError::new("Attribute value must be quoted", offset + pos)),
        };
        pos += 1;
        let value_len = memchr(quote, &input[pos..])
            .ok_or_else(|| ParseError::new("Unterminated attribute value", offset + pos))?;
        let raw = &input[pos..pos + value_len];
        pos += value_len + 1;

        if raw.contains(&b'<') {
            return Err(ParseError::new("'<' not allowed in attribute value", offset + pos));
        }

        if strict && attrs.iter().any(|a| a.name == name) {
            return Err(ParseError::new("Duplicate attribute", offset + name_start));
        }
        attrs.push(Attribute::new(name, normalize_value(raw)));
    }

    Ok(attrs)
}

/// Attribute-value normalization: literal tab, newline and carriage return
/// become spaces before references are expanded
fn normalize_value(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.iter().any(|&b| matches!(b, b'\t' | b'\n' | b'\r')) {
        return decode_text(raw);
    }
    let normalized: Vec<u8> = raw
        .iter()
        .map(|&b| if matches!(b, b'\t' | b'\n' | b'\r') { b' ' } else { b })
        .collect();
    Cow::Owned(decode_text(&normalized).into_owned())
}
