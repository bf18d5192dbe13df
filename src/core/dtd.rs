//! Internal DTD subset: attribute-type declarations
//!
//! The only part of a DTD that affects pointer resolution is which attributes
//! are declared with type `ID`, because those values are what shorthand
//! pointers and the `element()` scheme look up. Everything else in the
//! internal subset is skipped.

use memchr::memmem;
use std::collections::HashMap;

/// ID-typed attributes declared in a document type declaration
#[derive(Debug, Default, Clone)]
pub struct DtdDeclarations {
    /// element name -> attribute name declared as `ID`
    id_attributes: HashMap<String, String>,
}

impl DtdDeclarations {
    /// Collect `<!ATTLIST ...>` declarations from DOCTYPE content
    pub fn parse(doctype: &[u8]) -> Self {
        let mut decls = DtdDeclarations::default();
        let Some(open) = memchr::memchr(b'[', doctype) else {
            return decls;
        };

        let subset = &doctype[open + 1..];
        let mut pos = 0;
        while let Some(lt) = memchr::memchr(b'<', &subset[pos..]) {
            pos += lt;
            if subset[pos..].starts_with(b"<!--") {
                pos = match memmem::find(&subset[pos + 4..], b"-->") {
                    Some(end) => pos + 4 + end + 3,
                    None => break,
                };
                continue;
            }
            let end = declaration_end(subset, pos);
            if subset[pos..].starts_with(b"<!ATTLIST") {
                decls.add_attlist(&subset[pos + 9..end]);
            }
            pos = (end + 1).min(subset.len());
        }
        decls
    }

    /// Attribute declared as the ID of `element`, if any
    pub fn id_attribute(&self, element: &str) -> Option<&str> {
        self.id_attributes.get(element).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.id_attributes.is_empty()
    }

    fn add_attlist(&mut self, body: &[u8]) {
        let words = split_declaration(body);
        let mut iter = words.into_iter();
        let Some(element) = iter.next() else {
            return;
        };

        while let (Some(attr), Some(att_type)) = (iter.next(), iter.next()) {
            if att_type == "NOTATION" {
                iter.next();
            }
            let Some(default) = iter.next() else {
                break;
            };
            if default == "#FIXED" {
                iter.next();
            }
            if att_type == "ID" {
                // Validity allows one ID attribute per element; keep the first.
                self.id_attributes.entry(element.clone()).or_insert(attr);
            }
        }
    }
}

/// Index of the `>` ending the declaration that starts at `start`
fn declaration_end(subset: &[u8], start: usize) -> usize {
    let mut quote: Option<u8> = None;
    for (offset, &b) in subset[start..].iter().enumerate() {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return start + offset,
            _ => {}
        }
    }
    subset.len()
}

/// Split declaration content into words, keeping quoted literals and
/// parenthesized groups whole
fn split_declaration(body: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(body);
    let mut words = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_ascii_whitespace() {
            chars.next();
            continue;
        }
        let end = match c {
            '"' | '\'' => {
                chars.next();
                chars.find(|&(_, d)| d == c).map_or(text.len(), |(i, _)| i + 1)
            }
            '(' => chars.find(|&(_, d)| d == ')').map_or(text.len(), |(i, _)| i + 1),
            _ => {
                let mut end = text.len();
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_whitespace() || d == '(' {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                end
            }
        };
        words.push(text[start..end].to_string());
    }

    words
}
