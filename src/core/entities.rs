//! XML Entity Decoding and Escaping
//!
//! Decoding handles the five predefined entities and numeric character
//! references. Anything else (entities declared in a DTD) is left as-is,
//! since external and internal entity expansion is not performed.
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;

        let decoded = memchr(b';', &input[pos..])
            .and_then(|semi| decode_entity(&input[pos + 1..pos + semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                let mut buf = [0u8; 4];
                result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                pos += semi + 1;
            }
            None => {
                result.push(b'&');
                pos += 1;
            }
        }
    }

    result.extend_from_slice(&input[pos..]);
    result
}

/// Decode a single entity body (between `&` and `;`)
fn decode_entity(entity: &[u8]) -> Option<char> {
    match entity {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x' | b'X', hex @ ..] => {
            let hex = std::str::from_utf8(hex).ok()?;
            char_from_codepoint(u32::from_str_radix(hex, 16).ok()?)
        }
        [b'#', dec @ ..] => {
            let dec = std::str::from_utf8(dec).ok()?;
            char_from_codepoint(dec.parse::<u32>().ok()?)
        }
        _ => None,
    }
}

fn char_from_codepoint(codepoint: u32) -> Option<char> {
    if is_valid_xml_char(codepoint) {
        char::from_u32(codepoint)
    } else {
        None
    }
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Append `input` to `out`, escaping it for element content
pub fn encode_text(input: &str, out: &mut String) {
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&')) {
        out.push_str(input);
        return;
    }
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}

/// Append `input` to `out`, escaping it for a double-quoted attribute value.
/// Whitespace other than space is written as character references so a
/// parser's attribute-value normalization does not alter it.
pub fn encode_attribute(input: &str, out: &mut String) {
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text(b"&lt;hello&gt; &amp; &quot;world&quot;");
        assert_eq!(result.as_ref(), b"<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#x42;&#X43;").as_ref(), b"ABC");
        let emoji = decode_text(b"&#x1F600;");
        assert_eq!(std::str::from_utf8(emoji.as_ref()).unwrap(), "😀");
    }

    #[test]
    fn test_unknown_and_invalid_entities_kept() {
        assert_eq!(decode_text(b"&nbsp;").as_ref(), b"&nbsp;");
        assert_eq!(decode_text(b"&#0;").as_ref(), b"&#0;");
        assert_eq!(decode_text(b"a & b").as_ref(), b"a & b");
    }

    #[test]
    fn test_encode_text() {
        let mut out = String::new();
        encode_text("<hello> & \"world\"", &mut out);
        assert_eq!(out, "&lt;hello&gt; &amp; \"world\"");
    }

    #[test]
    fn test_encode_attribute() {
        let mut out = String::new();
        encode_attribute("a\"b<c\n", &mut out);
        assert_eq!(out, "a&quot;b&lt;c&#10;");
    }
}
