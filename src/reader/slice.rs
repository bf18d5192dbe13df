//! Zero-Copy Slice Reader
//!
//! Pull parser over a byte slice. Names and most content borrow directly from
//! the input; only text with entity references is copied.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::parse_attributes;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};
use std::borrow::Cow;

/// Zero-copy XML reader from a byte slice
pub struct SliceReader<'a> {
    tokenizer: Tokenizer<'a>,
    strict: bool,
    token_start: usize,
    finished: bool,
}

impl<'a> SliceReader<'a> {
    /// Lenient reader: repeated attribute names are accepted
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            tokenizer: Tokenizer::new(input),
            strict: false,
            token_start: 0,
            finished: false,
        }
    }

    /// Strict reader: repeated attribute names are an error
    pub fn new_strict(input: &'a [u8]) -> Self {
        SliceReader {
            strict: true,
            ..Self::new(input)
        }
    }

    /// Byte offset where the most recently returned event started
    pub fn last_position(&self) -> usize {
        self.token_start
    }

    /// Get the next XML event; `EndDocument` once the input is exhausted
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        loop {
            let token = self.tokenizer.next_token()?;
            self.token_start = token.span.0;

            let event = match token.kind {
                TokenKind::Eof => XmlEvent::EndDocument,
                TokenKind::StartTag => XmlEvent::StartElement(self.start_element(token)?),
                TokenKind::EmptyTag => XmlEvent::EmptyElement(self.start_element(token)?),
                TokenKind::EndTag => XmlEvent::EndElement(EndElement {
                    name: token.name.unwrap_or_default(),
                }),
                TokenKind::Text => match token.content {
                    Some(content) if !content.is_empty() => XmlEvent::Text(content),
                    _ => continue,
                },
                TokenKind::CData => XmlEvent::CData(borrowed(token.content)),
                TokenKind::Comment => XmlEvent::Comment(borrowed(token.content)),
                TokenKind::ProcessingInstruction => XmlEvent::ProcessingInstruction {
                    target: token.name.unwrap_or_default(),
                    data: borrowed(token.content),
                },
                TokenKind::XmlDeclaration => XmlEvent::XmlDeclaration,
                TokenKind::DocType => XmlEvent::DocType(borrowed(token.content)),
            };
            return Ok(event);
        }
    }

    fn start_element(&self, token: Token<'a>) -> Result<StartElement<'a>, ParseError> {
        let name = token.name.unwrap_or_default();
        let attributes = match token.content {
            Some(Cow::Borrowed(region)) => {
                parse_attributes(region, token.content_offset, self.strict)?
            }
            _ => Vec::new(),
        };
        Ok(StartElement::new(name, attributes))
    }
}

/// Markup content is never entity-decoded, so it always borrows the input
fn borrowed(content: Option<Cow<'_, [u8]>>) -> &[u8] {
    match content {
        Some(Cow::Borrowed(slice)) => slice,
        _ => &[],
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<XmlEvent<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let event = self.next_event();
        if matches!(event, Ok(XmlEvent::EndDocument) | Err(_)) {
            self.finished = true;
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events() {
        let events: Vec<_> = SliceReader::new(b"<root id='r'><a/>hi<!--c--></root>")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(events.len(), 6);
        match &events[0] {
            XmlEvent::StartElement(start) => {
                assert_eq!(start.name, b"root");
                assert_eq!(start.attribute(b"id"), Some(b"r" as &[u8]));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(events[1], XmlEvent::EmptyElement(_)));
        assert_eq!(events[2], XmlEvent::Text(Cow::Borrowed(b"hi")));
        assert_eq!(events[3], XmlEvent::Comment(b"c"));
        assert!(matches!(events[4], XmlEvent::EndElement(ref e) if e.name == b"root"));
        assert_eq!(events[5], XmlEvent::EndDocument);
    }

    #[test]
    fn test_positions() {
        let mut reader = SliceReader::new(b"<a>\n  <b/></a>");
        reader.next_event().unwrap();
        assert_eq!(reader.last_position(), 0);
        reader.next_event().unwrap();
        assert_eq!(reader.last_position(), 3);
        reader.next_event().unwrap();
        assert_eq!(reader.last_position(), 6);
    }

    #[test]
    fn test_strict_duplicate_attribute() {
        let input = b"<a x='1' x='2'/>";
        assert!(SliceReader::new(input).all(|e| e.is_ok()));
        assert!(SliceReader::new_strict(input).any(|e| e.is_err()));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let results: Vec<_> = SliceReader::new(b"<a><!-- open").collect();
        assert_eq!(results.len(), 2);
        assert!(results[1].is_err());
    }
}
