//! Pointer Parser
//!
//! A pointer is either a shorthand (a lone NCName) or a sequence of scheme
//! invocations. Scheme payloads are parsed by the scheme itself; unknown
//! schemes are skipped.

use super::lexer::{Lexeme, Lexer};
use super::pointer::Pointer;
use super::schemes::{PointerPart, SchemeKind};
use crate::error::PointerError;

/// Parse pointer text
pub fn parse(text: &str) -> Result<Pointer, PointerError> {
    let mut lexer = Lexer::new(text);
    let first = lexer.next_lexeme()?;

    if let Lexeme::Name {
        name,
        can_be_scheme: false,
    } = first
    {
        let trailing = lexer.next_lexeme()?;
        if trailing != Lexeme::Eof {
            return Err(PointerError::syntax(
                format!(
                    "a shorthand pointer is a single name, found {} after it",
                    trailing.describe()
                ),
                name.chars().count(),
            ));
        }
        return Ok(Pointer::Shorthand(name.to_string()));
    }

    if first == Lexeme::Eof {
        return Err(PointerError::syntax("empty pointer", 0));
    }

    let mut parts = Vec::new();
    let mut lexeme = first;
    while lexeme != Lexeme::Eof {
        let start = lexer.position();
        let kind = match lexeme {
            Lexeme::Name {
                name,
                can_be_scheme: true,
            } => SchemeKind::lookup("", name),
            Lexeme::QualifiedName {
                prefix,
                local,
                can_be_scheme: true,
            } => match lookup_prefix(&parts, prefix) {
                Some(uri) => SchemeKind::lookup(uri, local),
                None => SchemeKind::Unknown,
            },
            other => {
                return Err(PointerError::syntax(
                    format!("expected a scheme name, found {}", other.describe()),
                    start,
                ))
            }
        };

        // can_be_scheme guarantees the `(`
        lexer.next_char();
        if let Some(part) = kind.parse_payload(&mut lexer)? {
            tracing::trace!(scheme = part.scheme_name(), "parsed pointer part");
            parts.push(part);
        }
        lexer.skip_whitespace();
        lexeme = lexer.next_lexeme()?;
    }

    Ok(Pointer::SchemeBased {
        parts,
        text: text.to_string(),
    })
}

/// Most recent xmlns() binding of `prefix` among the parts parsed so far
fn lookup_prefix<'p>(parts: &'p [PointerPart], prefix: &str) -> Option<&'p str> {
    parts.iter().rev().find_map(|part| match part {
        PointerPart::Xmlns(scheme) if scheme.prefix == prefix => Some(scheme.uri.as_str()),
        _ => None,
    })
}
