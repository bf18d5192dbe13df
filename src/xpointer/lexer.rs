//! Pointer Lexer
//!
//! Produces one lexeme at a time. Scheme payloads are not tokenized up
//! front: the parser either keeps pulling lexemes (structured payloads) or
//! asks for the raw escaped data up to the closing parenthesis.
//!
//! Error positions are character offsets into the pointer text.

use crate::core::unicode::{is_ncname_char, is_ncname_start_char, is_xml_whitespace};
use crate::error::PointerError;

/// Pointer lexeme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme<'a> {
    /// NCName; `can_be_scheme` when directly followed by `(`
    Name { name: &'a str, can_be_scheme: bool },
    QualifiedName {
        prefix: &'a str,
        local: &'a str,
        can_be_scheme: bool,
    },
    LeftParen,
    RightParen,
    Circumflex,
    Number(i32),
    Equals,
    /// A run of whitespace
    Space,
    Slash,
    Eof,
}

impl Lexeme<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Lexeme::Name { .. } => "name",
            Lexeme::QualifiedName { .. } => "qualified name",
            Lexeme::LeftParen => "`(`",
            Lexeme::RightParen => "`)`",
            Lexeme::Circumflex => "`^`",
            Lexeme::Number(_) => "number",
            Lexeme::Equals => "`=`",
            Lexeme::Space => "whitespace",
            Lexeme::Slash => "`/`",
            Lexeme::Eof => "end of pointer",
        }
    }
}

/// Pointer lexer
pub struct Lexer<'a> {
    input: &'a str,
    /// Byte offset of the next unread character
    pos: usize,
    /// Character offset of the next unread character
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            offset: 0,
        }
    }

    /// Character offset of the next unread character
    pub fn position(&self) -> usize {
        self.offset
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Consume one character
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.offset += 1;
        Some(c)
    }

    /// Consume a whitespace run; true when anything was skipped
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_xml_whitespace) {
            self.next_char();
        }
        self.pos > start
    }

    /// Consume an NCName at the current position
    pub fn parse_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ncname_start_char) {
            return None;
        }
        self.next_char();
        while self.peek().is_some_and(is_ncname_char) {
            self.next_char();
        }
        Some(&self.input[start..self.pos])
    }

    /// Consume raw scheme data up to the balanced closing `)`, which is
    /// consumed too. `^` escapes `^`, `(` and `)`.
    pub fn parse_escaped_data(&mut self) -> Result<String, PointerError> {
        let mut data = String::new();
        let mut depth = 0usize;
        loop {
            let at = self.offset;
            match self.next_char() {
                None => return Err(PointerError::syntax("unterminated scheme data", at)),
                Some('^') => match self.next_char() {
                    Some(c @ ('^' | '(' | ')')) => data.push(c),
                    Some(_) => {
                        return Err(PointerError::syntax(
                            "`^` must be followed by `^`, `(` or `)`",
                            at,
                        ))
                    }
                    None => return Err(PointerError::syntax("unterminated escape", at)),
                },
                Some('(') => {
                    depth += 1;
                    data.push('(');
                }
                Some(')') if depth == 0 => return Ok(data),
                Some(')') => {
                    depth -= 1;
                    data.push(')');
                }
                Some(c) => data.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<i32, PointerError> {
        let start = self.offset;
        let mut value: i32 = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.next_char();
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit as i32))
                .ok_or_else(|| PointerError::syntax("number out of range", start))?;
        }
        Ok(value)
    }

    pub fn next_lexeme(&mut self) -> Result<Lexeme<'a>, PointerError> {
        let Some(c) = self.peek() else {
            return Ok(Lexeme::Eof);
        };
        let lexeme = match c {
            '(' => Lexeme::LeftParen,
            ')' => Lexeme::RightParen,
            '^' => Lexeme::Circumflex,
            '=' => Lexeme::Equals,
            '/' => Lexeme::Slash,
            c if is_xml_whitespace(c) => {
                self.skip_whitespace();
                return Ok(Lexeme::Space);
            }
            '0'..='9' => return self.parse_number().map(Lexeme::Number),
            c if is_ncname_start_char(c) => return self.name_lexeme(),
            other => {
                return Err(PointerError::syntax(
                    format!("unexpected character `{other}`"),
                    self.offset,
                ))
            }
        };
        self.next_char();
        Ok(lexeme)
    }

    fn name_lexeme(&mut self) -> Result<Lexeme<'a>, PointerError> {
        let Some(name) = self.parse_name() else {
            return Err(PointerError::syntax("expected a name", self.offset));
        };
        if self.peek() != Some(':') {
            return Ok(Lexeme::Name {
                name,
                can_be_scheme: self.peek() == Some('('),
            });
        }
        self.next_char();
        let Some(local) = self.parse_name() else {
            return Err(PointerError::syntax(
                "expected a local name after `:`",
                self.offset,
            ));
        };
        Ok(Lexeme::QualifiedName {
            prefix: name,
            local,
            can_be_scheme: self.peek() == Some('('),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(input: &str) -> Vec<Lexeme<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let lexeme = lexer.next_lexeme().unwrap();
            if lexeme == Lexeme::Eof {
                return out;
            }
            out.push(lexeme);
        }
    }

    #[test]
    fn test_names_and_scheme_flag() {
        assert_eq!(
            lexemes("foo bar("),
            vec![
                Lexeme::Name {
                    name: "foo",
                    can_be_scheme: false
                },
                Lexeme::Space,
                Lexeme::Name {
                    name: "bar",
                    can_be_scheme: true
                },
                Lexeme::LeftParen,
            ]
        );
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            lexemes("p:xpath1("),
            vec![
                Lexeme::QualifiedName {
                    prefix: "p",
                    local: "xpath1",
                    can_be_scheme: true
                },
                Lexeme::LeftParen,
            ]
        );
        let err = Lexer::new("p:1").next_lexeme().unwrap_err();
        assert_eq!(err, PointerError::syntax("expected a local name after `:`", 2));
    }

    #[test]
    fn test_child_sequence_lexemes() {
        assert_eq!(
            lexemes("/1/23"),
            vec![
                Lexeme::Slash,
                Lexeme::Number(1),
                Lexeme::Slash,
                Lexeme::Number(23)
            ]
        );
    }

    #[test]
    fn test_number_overflow() {
        assert_eq!(
            Lexer::new("2147483647").next_lexeme().unwrap(),
            Lexeme::Number(i32::MAX)
        );
        assert!(Lexer::new("2147483648").next_lexeme().unwrap_err().is_syntax());
    }

    #[test]
    fn test_escaped_data() {
        let mut lexer = Lexer::new("a^(b^)c^^ (x(y)) ) rest");
        assert_eq!(lexer.parse_escaped_data().unwrap(), "a(b)c^ (x(y)) ");
        assert_eq!(lexer.next_lexeme().unwrap(), Lexeme::Space);
    }

    #[test]
    fn test_escaped_data_errors() {
        let err = Lexer::new("fo^o)").parse_escaped_data().unwrap_err();
        assert_eq!(err, PointerError::syntax("`^` must be followed by `^`, `(` or `)`", 2));
        assert!(Lexer::new("(abc)").parse_escaped_data().is_err());
        assert!(Lexer::new("abc^").parse_escaped_data().is_err());
    }

    #[test]
    fn test_character_offsets() {
        let mut lexer = Lexer::new("é é");
        lexer.next_lexeme().unwrap();
        assert_eq!(lexer.position(), 1);
        let mut lexer = Lexer::new("éé!");
        assert_eq!(lexer.parse_name(), Some("éé"));
        assert_eq!(
            lexer.next_lexeme().unwrap_err(),
            PointerError::syntax("unexpected character `!`", 2)
        );
    }
}
