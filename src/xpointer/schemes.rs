//! Scheme Parts
//!
//! Each built-in scheme parses its own payload from the lexer. Parsers
//! return `Ok(None)` for a payload that is valid but selects nothing, so the
//! part is dropped without failing the pointer.

use super::lexer::{Lexeme, Lexer};
use crate::error::PointerError;
use std::fmt;

/// Built-in scheme identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Element,
    Xmlns,
    XPath1,
    XPointer,
    Unknown,
}

impl SchemeKind {
    /// Resolve a scheme by namespace URI and local name. The built-in
    /// schemes live in the empty namespace.
    pub fn lookup(namespace: &str, name: &str) -> Self {
        if !namespace.is_empty() {
            return SchemeKind::Unknown;
        }
        match name {
            "element" => SchemeKind::Element,
            "xmlns" => SchemeKind::Xmlns,
            "xpath1" => SchemeKind::XPath1,
            "xpointer" => SchemeKind::XPointer,
            _ => SchemeKind::Unknown,
        }
    }

    /// Parse this scheme's payload. The lexer must sit just after the
    /// opening `(`; on success the closing `)` has been consumed.
    pub fn parse_payload(self, lexer: &mut Lexer<'_>) -> Result<Option<PointerPart>, PointerError> {
        match self {
            SchemeKind::Element => Ok(ElementScheme::parse(lexer)?.map(PointerPart::Element)),
            SchemeKind::Xmlns => Ok(Some(PointerPart::Xmlns(XmlnsScheme::parse(lexer)?))),
            SchemeKind::XPath1 => Ok(expression_payload(lexer)?.map(PointerPart::XPath1)),
            SchemeKind::XPointer => Ok(expression_payload(lexer)?.map(PointerPart::XPointer)),
            SchemeKind::Unknown => {
                let skipped = lexer.parse_escaped_data()?;
                tracing::trace!(payload = %skipped, "skipping unknown scheme");
                Ok(None)
            }
        }
    }
}

/// One parsed scheme invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerPart {
    Element(ElementScheme),
    Xmlns(XmlnsScheme),
    XPath1(String),
    /// XPath-expression subset of the xpointer() scheme
    XPointer(String),
}

impl PointerPart {
    /// XPath expression this part evaluates; `None` for xmlns()
    pub fn expression(&self) -> Option<&str> {
        match self {
            PointerPart::Element(scheme) => Some(scheme.expression.as_str()),
            PointerPart::Xmlns(_) => None,
            PointerPart::XPath1(expr) | PointerPart::XPointer(expr) => Some(expr.as_str()),
        }
    }

    pub fn scheme_name(&self) -> &'static str {
        match self {
            PointerPart::Element(_) => "element",
            PointerPart::Xmlns(_) => "xmlns",
            PointerPart::XPath1(_) => "xpath1",
            PointerPart::XPointer(_) => "xpointer",
        }
    }
}

impl fmt::Display for PointerPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerPart::Xmlns(scheme) => {
                write!(f, "xmlns({}={})", scheme.prefix, escape(&scheme.uri))
            }
            PointerPart::Element(scheme) => write!(f, "element({})", scheme.payload()),
            PointerPart::XPath1(expr) | PointerPart::XPointer(expr) => {
                write!(f, "{}({})", self.scheme_name(), escape(expr))
            }
        }
    }
}

/// Escape `^`, `(` and `)` for use inside a scheme payload
pub fn escape(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for c in data.chars() {
        if matches!(c, '^' | '(' | ')') {
            out.push('^');
        }
        out.push(c);
    }
    out
}

/// element(): an optional ID followed by 1-based child element positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementScheme {
    pub name: Option<String>,
    pub child_sequence: Vec<i32>,
    /// Equivalent XPath expression
    pub expression: String,
}

impl ElementScheme {
    pub fn new(name: Option<String>, child_sequence: Vec<i32>) -> Self {
        let mut expression = match &name {
            Some(name) => format!("id('{name}')"),
            None => String::new(),
        };
        for step in &child_sequence {
            expression.push_str(&format!("/*[{step}]"));
        }
        ElementScheme {
            name,
            child_sequence,
            expression,
        }
    }

    fn payload(&self) -> String {
        let mut out = self.name.clone().unwrap_or_default();
        for step in &self.child_sequence {
            out.push_str(&format!("/{step}"));
        }
        out
    }

    fn parse(lexer: &mut Lexer<'_>) -> Result<Option<Self>, PointerError> {
        let mut name = None;
        let mut lexeme = lexer.next_lexeme()?;
        match lexeme {
            Lexeme::RightParen => return Ok(None),
            Lexeme::Name { name: n, .. } => {
                name = Some(n.to_string());
                lexeme = lexer.next_lexeme()?;
            }
            Lexeme::Slash => {}
            other => return Err(unexpected(&other, "an element name or `/`", lexer)),
        }

        let mut child_sequence = Vec::new();
        loop {
            match lexeme {
                Lexeme::RightParen => break,
                Lexeme::Slash => {
                    let at = lexer.position();
                    match lexer.next_lexeme()? {
                        Lexeme::Number(0) => {
                            return Err(PointerError::syntax("child positions start at 1", at))
                        }
                        Lexeme::Number(n) => child_sequence.push(n),
                        other => return Err(unexpected(&other, "a child position", lexer)),
                    }
                }
                other => return Err(unexpected(&other, "`/` or `)`", lexer)),
            }
            lexeme = lexer.next_lexeme()?;
        }

        if name.is_none() && child_sequence.is_empty() {
            return Ok(None);
        }
        Ok(Some(ElementScheme::new(name, child_sequence)))
    }
}

/// xmlns(): binds a prefix for the parts that follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlnsScheme {
    pub prefix: String,
    pub uri: String,
}

impl XmlnsScheme {
    fn parse(lexer: &mut Lexer<'_>) -> Result<Self, PointerError> {
        lexer.skip_whitespace();
        let prefix = match lexer.next_lexeme()? {
            Lexeme::Name { name, .. } => name.to_string(),
            other => return Err(unexpected(&other, "a namespace prefix", lexer)),
        };
        lexer.skip_whitespace();
        match lexer.next_lexeme()? {
            Lexeme::Equals => {}
            other => return Err(unexpected(&other, "`=`", lexer)),
        }
        lexer.skip_whitespace();
        let uri = lexer.parse_escaped_data()?;
        Ok(XmlnsScheme { prefix, uri })
    }
}

/// xpath1() and xpointer() payloads; blank expressions select nothing
fn expression_payload(lexer: &mut Lexer<'_>) -> Result<Option<String>, PointerError> {
    let data = lexer.parse_escaped_data()?;
    if data.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(data))
}

fn unexpected(found: &Lexeme<'_>, expected: &str, lexer: &Lexer<'_>) -> PointerError {
    PointerError::syntax(
        format!("expected {expected}, found {}", found.describe()),
        lexer.position(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payload(kind: SchemeKind, text: &str) -> Result<Option<PointerPart>, PointerError> {
        let mut lexer = Lexer::new(text);
        kind.parse_payload(&mut lexer)
    }

    #[rstest]
    #[case("intro)", "id('intro')")]
    #[case("intro/2/1)", "id('intro')/*[2]/*[1]")]
    #[case("/1/3)", "/*[1]/*[3]")]
    fn test_element_expression(#[case] text: &str, #[case] expected: &str) {
        let part = payload(SchemeKind::Element, text).unwrap().unwrap();
        assert_eq!(part.expression(), Some(expected));
    }

    #[rstest]
    #[case("/1/0)")]
    #[case("1/33/foo)")]
    #[case("/1/foo)")]
    #[case("p:intro)")]
    #[case("intro 1)")]
    #[case("/1")]
    fn test_element_errors(#[case] text: &str) {
        assert!(payload(SchemeKind::Element, text).unwrap_err().is_syntax());
    }

    #[test]
    fn test_element_empty_is_no_part() {
        assert_eq!(payload(SchemeKind::Element, ")").unwrap(), None);
    }

    #[rstest]
    #[case("p=http://foo.com^))", "http://foo.com)")]
    #[case("p=http://foo.com^()", "http://foo.com(")]
    #[case(" p = urn:x )", "urn:x ")]
    fn test_xmlns_payload(#[case] text: &str, #[case] uri: &str) {
        let part = payload(SchemeKind::Xmlns, text).unwrap().unwrap();
        assert_eq!(
            part,
            PointerPart::Xmlns(XmlnsScheme {
                prefix: "p".to_string(),
                uri: uri.to_string()
            })
        );
        assert_eq!(part.expression(), None);
    }

    #[rstest]
    #[case("p http://foo.com)")]
    #[case("=urn:x)")]
    #[case("p=http://fo^o.com)")]
    fn test_xmlns_errors(#[case] text: &str) {
        assert!(payload(SchemeKind::Xmlns, text).unwrap_err().is_syntax());
    }

    #[test]
    fn test_expression_payloads() {
        let part = payload(SchemeKind::XPath1, "//a[@b='^(x^)'])").unwrap().unwrap();
        assert_eq!(part, PointerPart::XPath1("//a[@b='(x)']".to_string()));
        assert_eq!(payload(SchemeKind::XPointer, "  )").unwrap(), None);
        assert_eq!(payload(SchemeKind::Unknown, "any(thing))").unwrap(), None);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(SchemeKind::lookup("", "xpath1"), SchemeKind::XPath1);
        assert_eq!(SchemeKind::lookup("urn:x", "xpath1"), SchemeKind::Unknown);
        assert_eq!(SchemeKind::lookup("", "foo"), SchemeKind::Unknown);
    }

    #[test]
    fn test_display_escapes() {
        let part = PointerPart::XPath1("f(^)".to_string());
        assert_eq!(part.to_string(), "xpath1(f^(^^^))");
        let element = PointerPart::Element(ElementScheme::new(None, vec![1, 2]));
        assert_eq!(element.to_string(), "element(/1/2)");
    }
}
