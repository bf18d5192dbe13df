//! XML Tokenizer
//!
//! Splits a UTF-8 document into markup and character-data tokens. The
//! tokenizer checks lexical shape only (terminated constructs, quoted
//! attribute values); well-formedness of the element structure is checked by
//! the document builder.

use super::entities::decode_text;
use super::scanner::Scanner;
use super::unicode::is_whitespace_byte;
use std::borrow::Cow;
use thiserror::Error;

/// Token types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name attrs>`
    StartTag,
    /// `</name>`
    EndTag,
    /// `<name attrs/>`
    EmptyTag,
    /// Character data (entities decoded)
    Text,
    /// `<![CDATA[...]]>`
    CData,
    /// `<!--...-->`
    Comment,
    /// `<?target data?>`
    ProcessingInstruction,
    /// `<?xml ...?>`
    XmlDeclaration,
    /// `<!DOCTYPE ...>`
    DocType,
    /// End of input
    Eof,
}

/// A token with its source span
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Byte span of the whole construct in the input
    pub span: (usize, usize),
    /// Tag name or PI target
    pub name: Option<&'a [u8]>,
    /// Text-like content, the raw attribute region of a tag, or PI data
    pub content: Option<Cow<'a, [u8]>>,
    /// Absolute offset of `content` in the input (for attribute errors)
    pub content_offset: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
            content_offset: span.0,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>, offset: usize) -> Self {
        self.content = Some(content);
        self.content_offset = offset;
        self
    }
}

/// Lexical error with the byte position where it was detected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: &'static str,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: &'static str, position: usize) -> Self {
        ParseError { message, position }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// XML tokenizer over a byte slice
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let mut scanner = Scanner::new(input);
        if scanner.starts_with(UTF8_BOM) {
            scanner.advance(UTF8_BOM.len());
        }
        Tokenizer { scanner }
    }

    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Produce the next token; `TokenKind::Eof` once the input is exhausted
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        if self.scanner.is_eof() {
            return Ok(Token::new(TokenKind::Eof, (start, start)));
        }
        if self.scanner.peek() == Some(b'<') {
            self.parse_markup(start)
        } else {
            Ok(self.parse_text(start))
        }
    }

    fn parse_text(&mut self, start: usize) -> Token<'a> {
        let end = self
            .scanner
            .find_byte(b'<')
            .unwrap_or(self.scanner.input().len());
        self.scanner.set_position(end);
        let raw = self.scanner.slice(start, end);
        Token::new(TokenKind::Text, (start, end)).with_content(decode_text(raw), start)
    }

    fn parse_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        match self.scanner.peek_at(1) {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'?') => self.parse_processing_instruction(start),
            Some(b'!') => {
                if self.scanner.starts_with(b"<!--") {
                    self.parse_comment(start)
                } else if self.scanner.starts_with(b"<![CDATA[") {
                    self.parse_cdata(start)
                } else if self.scanner.starts_with(b"<!DOCTYPE") {
                    self.parse_doctype(start)
                } else {
                    Err(ParseError::new("Unsupported markup declaration", start))
                }
            }
            _ => self.parse_start_tag(start),
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1);
        let name = self.scanner.read_name();
        if name.is_empty() {
            return Err(ParseError::new("Missing element name", start));
        }
        let attrs_start = self.scanner.position();
        let close = self
            .scanner
            .find_tag_end_quoted()
            .ok_or(ParseError::new("Unterminated start tag", start))?;
        self.scanner.set_position(close + 1);

        let mut attrs_end = close;
        while attrs_end > attrs_start && is_whitespace_byte(self.scanner.input()[attrs_end - 1]) {
            attrs_end -= 1;
        }
        let is_empty = attrs_end > attrs_start && self.scanner.input()[attrs_end - 1] == b'/';
        if is_empty {
            attrs_end -= 1;
        }
        let region = self.scanner.slice(attrs_start, attrs_end);
        if !region.is_empty() && !is_whitespace_byte(region[0]) {
            return Err(ParseError::new("Expected whitespace after element name", attrs_start));
        }

        let kind = if is_empty {
            TokenKind::EmptyTag
        } else {
            TokenKind::StartTag
        };
        Ok(Token::new(kind, (start, close + 1))
            .with_name(name)
            .with_content(Cow::Borrowed(region), attrs_start))
    }

    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2);
        let name = self.scanner.read_name();
        if name.is_empty() {
            return Err(ParseError::new("Missing element name in end tag", start));
        }
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(ParseError::new("Malformed end tag", self.scanner.position()));
        }
        self.scanner.advance(1);
        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
    }

    fn parse_processing_instruction(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let close = self
            .scanner
            .find_seq_from(start + 2, b"?>")
            .ok_or(ParseError::new("Unterminated processing instruction", start))?;
        self.scanner.advance(2);
        let target = self.scanner.read_name();
        if target.is_empty() {
            return Err(ParseError::new("Missing processing instruction target", start));
        }
        self.scanner.skip_whitespace();
        let data_start = self.scanner.position().min(close);
        let data = self.scanner.slice(data_start, close);
        self.scanner.set_position(close + 2);

        let kind = if target.eq_ignore_ascii_case(b"xml") {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };
        Ok(Token::new(kind, (start, close + 2))
            .with_name(target)
            .with_content(Cow::Borrowed(data), data_start))
    }

    fn parse_comment(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let body = start + 4;
        let close = self
            .scanner
            .find_seq_from(body, b"-->")
            .ok_or(ParseError::new("Unterminated comment", start))?;
        self.scanner.set_position(close + 3);
        Ok(Token::new(TokenKind::Comment, (start, close + 3))
            .with_content(Cow::Borrowed(self.scanner.slice(body, close)), body))
    }

    fn parse_cdata(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let body = start + 9;
        let close = self
            .scanner
            .find_seq_from(body, b"]]>")
            .ok_or(ParseError::new("Unterminated CDATA section", start))?;
        self.scanner.set_position(close + 3);
        Ok(Token::new(TokenKind::CData, (start, close + 3))
            .with_content(Cow::Borrowed(self.scanner.slice(body, close)), body))
    }

    /// DOCTYPE, including an internal subset whose declarations may contain
    /// `>` inside brackets, quoted literals or comments
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let input = self.scanner.input();
        let body = start + 9;
        let mut pos = body;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while pos < input.len() {
            let b = input[pos];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => depth += 1,
                    b']' => depth = depth.saturating_sub(1),
                    b'<' if input[pos..].starts_with(b"<!--") => {
                        pos = self
                            .scanner
                            .find_seq_from(pos + 4, b"-->")
                            .ok_or(ParseError::new("Unterminated comment in DOCTYPE", pos))?
                            + 2;
                    }
                    b'>' if depth == 0 => {
                        self.scanner.set_position(pos + 1);
                        return Ok(Token::new(TokenKind::DocType, (start, pos + 1))
                            .with_content(Cow::Borrowed(&input[body..pos]), body));
                    }
                    _ => {}
                },
            }
            pos += 1;
        }

        Err(ParseError::new("Unterminated DOCTYPE", start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &[u8]) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(input);
        let mut kinds = Vec::new();
        loop {
            let token = tokenizer.next_token().unwrap();
            if token.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    #[test]
    fn test_element_tokens() {
        assert_eq!(
            kinds(b"<root a='1'><b/>text</root>"),
            vec![
                TokenKind::StartTag,
                TokenKind::EmptyTag,
                TokenKind::Text,
                TokenKind::EndTag
            ]
        );
    }

    #[test]
    fn test_start_tag_content() {
        let mut tokenizer = Tokenizer::new(b"<p:item id=\"x>y\" />");
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::EmptyTag);
        assert_eq!(token.name, Some(b"p:item" as &[u8]));
        assert_eq!(token.content.unwrap().as_ref(), b" id=\"x>y\" ");
        assert_eq!(token.content_offset, 7);
    }

    #[test]
    fn test_text_is_decoded() {
        let mut tokenizer = Tokenizer::new(b"a &lt; b<x/>");
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.content.unwrap().as_ref(), b"a < b");
        assert_eq!(token.span, (0, 8));
    }

    #[test]
    fn test_markup_declarations() {
        assert_eq!(
            kinds(b"\xEF\xBB\xBF<?xml version='1.0'?><!DOCTYPE r [<!ATTLIST r id ID #IMPLIED>]><!-- c --><?pi data?><r><![CDATA[<x>]]></r>"),
            vec![
                TokenKind::XmlDeclaration,
                TokenKind::DocType,
                TokenKind::Comment,
                TokenKind::ProcessingInstruction,
                TokenKind::StartTag,
                TokenKind::CData,
                TokenKind::EndTag
            ]
        );
    }

    #[test]
    fn test_processing_instruction_parts() {
        let mut tokenizer = Tokenizer::new(b"<?target  some data?>");
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.name, Some(b"target" as &[u8]));
        assert_eq!(token.content.unwrap().as_ref(), b"some data");
    }

    #[test]
    fn test_unterminated_constructs() {
        for input in [
            &b"<!-- open"[..],
            b"<![CDATA[ open",
            b"<?pi open",
            b"<a b='c'",
            b"<!DOCTYPE r [",
            b"</a",
            b"< a>",
        ] {
            let mut tokenizer = Tokenizer::new(input);
            assert!(tokenizer.next_token().is_err(), "{:?}", input);
        }
    }
}
