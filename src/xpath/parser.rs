//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions. Abbreviations are
//! expanded while parsing: `.` is `self::node()`, `..` is `parent::node()`,
//! `@` is the attribute axis and `//` inserts `descendant-or-self::node()`.

use super::lexer::{tokenize, Token};
use crate::error::XPathError;

/// XPath expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Number(f64),
    Literal(String),
    Variable(String),
    Function(String, Vec<Expr>),
    /// Primary expression filtered by predicates
    Filter(Box<Expr>, Vec<Expr>),
    Path(PathStart, Vec<Step>),
}

/// Where a location path starts
#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// `/...`: the document node
    Root,
    /// Relative path: the context node
    Context,
    /// `expr/...`: the node-set of a filter expression
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// The operator with its operands swapped: `a < b` is `b > a`
    pub fn flip(self) -> Self {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::LtEq => BinaryOp::GtEq,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::GtEq => BinaryOp::LtEq,
            other => other,
        }
    }
}

/// Location step in a path
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn abbreviated(axis: Axis) -> Self {
        Step {
            axis,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    SelfAxis,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        let axis = match s {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "self" => Axis::SelfAxis,
            "attribute" => Axis::Attribute,
            "namespace" => Axis::Namespace,
            _ => return None,
        };
        Some(axis)
    }

    /// Reverse axes number their nodes in reverse document order
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`: any node of the axis' principal type
    Any,
    /// Unprefixed name: no namespace
    Name(String),
    /// `prefix:local`
    QName { prefix: String, local: String },
    /// `prefix:*`
    NamespaceWildcard(String),
    Node,
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
}

/// Parse an XPath expression
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(XPathError::syntax(
            format!("unexpected {:?} after expression", other),
            parser.offset(),
        )),
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|(token, _)| token)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|&(_, offset)| offset)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), XPathError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(XPathError::syntax(format!("expected {}", what), self.offset()))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, XPathError> {
        self.parse_or_expr()
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, XPathError>,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, XPathError> {
        let mut left = next(self)?;
        while let Some(op) = operator(self.peek()) {
            self.advance();
            let right = next(self)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_or_expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(Self::parse_and_expr, |t| {
            matches!(t, Token::Or).then_some(BinaryOp::Or)
        })
    }

    fn parse_and_expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(Self::parse_equality_expr, |t| {
            matches!(t, Token::And).then_some(BinaryOp::And)
        })
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(Self::parse_relational_expr, |t| match t {
            Token::Eq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(Self::parse_additive_expr, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(Self::parse_multiplicative_expr, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(Self::parse_unary_expr, |t| match t {
            Token::Multiply => Some(BinaryOp::Mul),
            Token::Div => Some(BinaryOp::Div),
            Token::Mod => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, XPathError> {
        if *self.peek() == Token::Minus {
            self.advance();
            let inner = self.parse_unary_expr()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_union_expr()
    }

    fn parse_union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_expr()?;
        while *self.peek() == Token::Pipe {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_expr(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Token::Slash => {
                self.advance();
                let steps = if self.starts_step() {
                    self.parse_relative_path()?
                } else {
                    Vec::new()
                };
                Ok(Expr::Path(PathStart::Root, steps))
            }
            Token::DoubleSlash => {
                self.advance();
                let mut steps = vec![Step::abbreviated(Axis::DescendantOrSelf)];
                steps.extend(self.parse_relative_path()?);
                Ok(Expr::Path(PathStart::Root, steps))
            }
            _ if self.starts_step() => {
                let steps = self.parse_relative_path()?;
                Ok(Expr::Path(PathStart::Context, steps))
            }
            _ => self.parse_filter_path(),
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Token::Dot
                | Token::DoubleDot
                | Token::At
                | Token::AxisName(_)
                | Token::NameTest { .. }
                | Token::NodeType(_)
        )
    }

    /// FilterExpr, optionally followed by `/` or `//` and a relative path
    fn parse_filter_path(&mut self) -> Result<Expr, XPathError> {
        let primary = self.parse_primary_expr()?;
        let mut predicates = Vec::new();
        while *self.peek() == Token::LeftBracket {
            predicates.push(self.parse_predicate()?);
        }
        let filter = if predicates.is_empty() {
            primary
        } else {
            Expr::Filter(Box::new(primary), predicates)
        };

        let mut steps = Vec::new();
        match self.peek() {
            Token::Slash => {
                self.advance();
            }
            Token::DoubleSlash => {
                self.advance();
                steps.push(Step::abbreviated(Axis::DescendantOrSelf));
            }
            _ => return Ok(filter),
        }
        steps.extend(self.parse_relative_path()?);
        Ok(Expr::Path(PathStart::Expr(Box::new(filter)), steps))
    }

    fn parse_relative_path(&mut self) -> Result<Vec<Step>, XPathError> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                Token::Slash => {
                    self.advance();
                }
                Token::DoubleSlash => {
                    self.advance();
                    steps.push(Step::abbreviated(Axis::DescendantOrSelf));
                }
                _ => return Ok(steps),
            }
            steps.push(self.parse_step()?);
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let axis = match self.peek().clone() {
            Token::Dot => {
                self.advance();
                return Ok(Step::abbreviated(Axis::SelfAxis));
            }
            Token::DoubleDot => {
                self.advance();
                return Ok(Step::abbreviated(Axis::Parent));
            }
            Token::At => {
                self.advance();
                Axis::Attribute
            }
            Token::AxisName(name) => {
                let offset = self.offset();
                self.advance();
                let axis = Axis::from_name(&name).ok_or_else(|| {
                    XPathError::syntax(format!("unknown axis `{}`", name), offset)
                })?;
                self.expect(Token::DoubleColon, "`::`")?;
                axis
            }
            _ => Axis::Child,
        };

        let node_test = self.parse_node_test()?;
        let mut predicates = Vec::new();
        while *self.peek() == Token::LeftBracket {
            predicates.push(self.parse_predicate()?);
        }
        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        let offset = self.offset();
        match self.advance() {
            Token::NameTest { prefix, local } => Ok(match (prefix, local) {
                (None, None) => NodeTest::Any,
                (None, Some(local)) => NodeTest::Name(local),
                (Some(prefix), None) => NodeTest::NamespaceWildcard(prefix),
                (Some(prefix), Some(local)) => NodeTest::QName { prefix, local },
            }),
            Token::NodeType(kind) => {
                self.expect(Token::LeftParen, "`(`")?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => {
                        let target = match self.peek().clone() {
                            Token::Literal(target) => {
                                self.advance();
                                Some(target)
                            }
                            _ => None,
                        };
                        NodeTest::ProcessingInstruction(target)
                    }
                };
                self.expect(Token::RightParen, "`)`")?;
                Ok(test)
            }
            other => Err(XPathError::syntax(
                format!("expected a node test, found {:?}", other),
                offset,
            )),
        }
    }

    fn parse_predicate(&mut self) -> Result<Expr, XPathError> {
        self.expect(Token::LeftBracket, "`[`")?;
        let expr = self.parse_expr()?;
        self.expect(Token::RightBracket, "`]`")?;
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, XPathError> {
        let offset = self.offset();
        match self.advance() {
            Token::Variable(name) => Ok(Expr::Variable(name)),
            Token::Literal(value) => Ok(Expr::Literal(value)),
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::LeftParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen, "`)`")?;
                Ok(expr)
            }
            Token::FunctionName(name) => {
                self.expect(Token::LeftParen, "`(`")?;
                let mut args = Vec::new();
                if *self.peek() != Token::RightParen {
                    args.push(self.parse_expr()?);
                    while *self.peek() == Token::Comma {
                        self.advance();
                        args.push(self.parse_expr()?);
                    }
                }
                self.expect(Token::RightParen, "`)`")?;
                Ok(Expr::Function(name, args))
            }
            Token::Eof => Err(XPathError::syntax("unexpected end of expression", offset)),
            other => Err(XPathError::syntax(format!("unexpected {:?}", other), offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(name: &str) -> Step {
        Step {
            axis: Axis::Child,
            node_test: NodeTest::Name(name.to_string()),
            predicates: Vec::new(),
        }
    }

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert_eq!(expr, Expr::Path(PathStart::Root, vec![child("root"), child("child")]));
    }

    #[test]
    fn test_abbreviations() {
        let Expr::Path(PathStart::Context, steps) = parse(".//a/..").unwrap() else {
            panic!("expected a relative path");
        };
        let axes: Vec<_> = steps.iter().map(|s| s.axis).collect();
        assert_eq!(
            axes,
            vec![Axis::SelfAxis, Axis::DescendantOrSelf, Axis::Child, Axis::Parent]
        );
    }

    #[test]
    fn test_predicate() {
        let Expr::Path(_, steps) = parse("item[@id='test'][2]").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(steps[0].predicates.len(), 2);
        assert_eq!(steps[0].predicates[1], Expr::Number(2.0));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3 = 7 or false()").unwrap();
        let Expr::Binary(left, BinaryOp::Or, _) = expr else {
            panic!("or binds loosest");
        };
        assert!(matches!(*left, Expr::Binary(_, BinaryOp::Eq, _)));
    }

    #[test]
    fn test_filter_path() {
        let expr = parse("id('a')/b").unwrap();
        let Expr::Path(PathStart::Expr(start), steps) = expr else {
            panic!("expected a filtered path");
        };
        assert!(matches!(*start, Expr::Function(ref name, _) if name == "id"));
        assert_eq!(steps, vec![child("b")]);
    }

    #[test]
    fn test_root_only_and_union() {
        assert_eq!(parse("/").unwrap(), Expr::Path(PathStart::Root, Vec::new()));
        assert!(matches!(parse("a | b").unwrap(), Expr::Union(_, _)));
    }

    #[test]
    fn test_node_tests() {
        let Expr::Path(_, steps) =
            parse("p:a/p:*/text()/processing-instruction('x')/attribute::*").unwrap()
        else {
            panic!("expected a path");
        };
        assert_eq!(
            steps[0].node_test,
            NodeTest::QName {
                prefix: "p".to_string(),
                local: "a".to_string()
            }
        );
        assert_eq!(steps[1].node_test, NodeTest::NamespaceWildcard("p".to_string()));
        assert_eq!(steps[2].node_test, NodeTest::Text);
        assert_eq!(
            steps[3].node_test,
            NodeTest::ProcessingInstruction(Some("x".to_string()))
        );
        assert_eq!(steps[4].axis, Axis::Attribute);
        assert_eq!(steps[4].node_test, NodeTest::Any);
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["", "/a/", "a[", "foo(", "a b", "bogus::x", "1 +"] {
            assert!(
                matches!(parse(input), Err(XPathError::Syntax { .. })),
                "{input:?}"
            );
        }
    }
}
