//! XPath Lexer
//!
//! Tokenizes XPath expressions. `*` and the operator names (`and`, `or`,
//! `mod`, `div`) are disambiguated by the preceding token: they are
//! operators only where an operand has just ended.

use crate::core::unicode::{is_ncname_char, is_ncname_start_char, is_xml_whitespace};
use crate::error::XPathError;

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Multiply,    // * in operator position
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,
    Or,
    Mod,
    Div,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    DoubleColon,

    Number(f64),
    Literal(String),
    /// `$name` or `$prefix:name`
    Variable(String),

    /// `*`, `prefix:*`, `name` or `prefix:name`; `local` is `None` for `*`
    NameTest {
        prefix: Option<String>,
        local: Option<String>,
    },
    /// QName followed by `(`
    FunctionName(String),
    /// `node`, `text`, `comment`, `processing-instruction` followed by `(`
    NodeType(String),
    /// Name followed by `::`
    AxisName(String),

    Eof,
}

impl Token {
    /// Tokens after which `*` and operator names are read as operands
    fn expects_operand(&self) -> bool {
        matches!(
            self,
            Token::At
                | Token::DoubleColon
                | Token::LeftParen
                | Token::LeftBracket
                | Token::Comma
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Multiply
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
                | Token::And
                | Token::Or
                | Token::Mod
                | Token::Div
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    operator_allowed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            operator_allowed: false,
        }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !is_xml_whitespace(c) {
                break;
            }
            self.advance(c.len_utf8());
        }
    }

    /// Next token and the byte offset where it starts
    pub fn next_token(&mut self) -> Result<(Token, usize), XPathError> {
        self.skip_whitespace();
        let start = self.pos;
        let token = self.scan(start)?;
        self.operator_allowed = !token.expects_operand();
        Ok((token, start))
    }

    fn scan(&mut self, start: usize) -> Result<Token, XPathError> {
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let token = match c {
            '/' => {
                if self.peek_at(1) == Some('/') {
                    self.advance(2);
                    Token::DoubleSlash
                } else {
                    self.advance(1);
                    Token::Slash
                }
            }
            '.' => match self.peek_at(1) {
                Some('.') => {
                    self.advance(2);
                    Token::DoubleDot
                }
                Some(d) if d.is_ascii_digit() => self.read_number(),
                _ => {
                    self.advance(1);
                    Token::Dot
                }
            },
            '!' if self.peek_at(1) == Some('=') => {
                self.advance(2);
                Token::NotEq
            }
            '<' | '>' => {
                let with_eq = self.peek_at(1) == Some('=');
                self.advance(if with_eq { 2 } else { 1 });
                match (c, with_eq) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::LtEq,
                    (_, false) => Token::Gt,
                    (_, true) => Token::GtEq,
                }
            }
            ':' if self.peek_at(1) == Some(':') => {
                self.advance(2);
                Token::DoubleColon
            }
            '*' => {
                self.advance(1);
                if self.operator_allowed {
                    Token::Multiply
                } else {
                    Token::NameTest {
                        prefix: None,
                        local: None,
                    }
                }
            }
            '"' | '\'' => self.read_literal(c, start)?,
            '$' => {
                self.advance(1);
                let name = self.read_qname();
                if name.is_empty() {
                    return Err(XPathError::syntax("expected a variable name after `$`", start));
                }
                Token::Variable(name.to_string())
            }
            '0'..='9' => self.read_number(),
            _ if is_ncname_start_char(c) => self.read_name(),
            _ => {
                let simple = match c {
                    '@' => Token::At,
                    '|' => Token::Pipe,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '=' => Token::Eq,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '[' => Token::LeftBracket,
                    ']' => Token::RightBracket,
                    ',' => Token::Comma,
                    _ => {
                        return Err(XPathError::syntax(
                            format!("unexpected character `{}`", c),
                            start,
                        ))
                    }
                };
                self.advance(1);
                simple
            }
        };
        Ok(token)
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }
        let text = &self.input[start..self.pos];
        Token::Number(text.parse().unwrap_or(f64::NAN))
    }

    fn read_literal(&mut self, quote: char, start: usize) -> Result<Token, XPathError> {
        self.advance(1);
        let body = self.remaining();
        match body.find(quote) {
            Some(end) => {
                let value = body[..end].to_string();
                self.advance(end + 1);
                Ok(Token::Literal(value))
            }
            None => Err(XPathError::syntax("unterminated string literal", start)),
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        if self.peek().is_some_and(is_ncname_start_char) {
            while let Some(c) = self.peek() {
                if !is_ncname_char(c) {
                    break;
                }
                self.advance(c.len_utf8());
            }
        }
        &self.input[start..self.pos]
    }

    /// `NCName` or `NCName:NCName`
    fn read_qname(&mut self) -> &'a str {
        let start = self.pos;
        self.read_ncname();
        if self.peek() == Some(':') && self.peek_at(1).is_some_and(is_ncname_start_char) {
            self.advance(1);
            self.read_ncname();
        }
        &self.input[start..self.pos]
    }

    fn read_name(&mut self) -> Token {
        let name = self.read_ncname();

        if self.operator_allowed {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // prefix:* and prefix:local
        if self.peek() == Some(':') {
            match self.peek_at(1) {
                Some('*') => {
                    self.advance(2);
                    return Token::NameTest {
                        prefix: Some(name.to_string()),
                        local: None,
                    };
                }
                Some(c) if is_ncname_start_char(c) => {
                    self.advance(1);
                    let local = self.read_ncname();
                    return self.classify(format!("{}:{}", name, local), Some(name), local);
                }
                _ => {}
            }
        }
        self.classify(name.to_string(), None, name)
    }

    /// Decide between function name, node type, axis name and name test by
    /// looking past whitespace at what follows
    fn classify(&mut self, qname: String, prefix: Option<&str>, local: &str) -> Token {
        let rest = self.remaining().trim_start_matches(is_xml_whitespace);
        if prefix.is_none() && rest.starts_with("::") {
            return Token::AxisName(qname);
        }
        if rest.starts_with('(') {
            if prefix.is_none()
                && matches!(local, "node" | "text" | "comment" | "processing-instruction")
            {
                return Token::NodeType(qname);
            }
            return Token::FunctionName(qname);
        }
        Token::NameTest {
            prefix: prefix.map(str::to_string),
            local: Some(local.to_string()),
        }
    }
}

/// Tokenize an entire expression, ending with `Eof`
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, XPathError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let (token, pos) = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push((token, pos));
        if done {
            return Ok(tokens);
        }
    }
}
