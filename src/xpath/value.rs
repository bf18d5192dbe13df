//! XPath Value Types
//!
//! XPath 1.0 has four data types: node-set, boolean, number, and string.
//! Attribute values are carried as a string list since attributes are not
//! nodes in the arena.

use crate::dom::{node_string_value, DocumentAccess, NodeId};

/// XPath value types
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum XPathValue {
    /// A set of nodes in document order, no duplicates
    NodeSet(Vec<NodeId>),
    Boolean(bool),
    Number(f64),
    String(String),
    /// Values selected on the attribute axis, in document order
    StringList(Vec<String>),
}

impl XPathValue {
    pub fn empty_nodeset() -> Self {
        XPathValue::NodeSet(Vec::new())
    }

    pub fn single_node(id: NodeId) -> Self {
        XPathValue::NodeSet(vec![id])
    }

    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::Boolean(_) => "boolean",
            XPathValue::Number(_) => "number",
            XPathValue::String(_) => "string",
            XPathValue::StringList(_) => "attribute values",
        }
    }

    /// boolean() semantics
    pub fn to_boolean(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::StringList(list) => !list.is_empty(),
        }
    }

    /// number() semantics
    pub fn to_number<D: DocumentAccess>(&self, doc: &D) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            other => string_to_number(&other.to_string_value(doc)),
        }
    }

    /// string() semantics: node-sets take the string-value of their first node
    pub fn to_string_value<D: DocumentAccess>(&self, doc: &D) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&id| node_string_value(doc, id))
                .unwrap_or_default(),
            XPathValue::Boolean(b) => b.to_string(),
            XPathValue::Number(n) => number_to_string(*n),
            XPathValue::String(s) => s.clone(),
            XPathValue::StringList(list) => list.first().cloned().unwrap_or_default(),
        }
    }

    pub fn is_nodeset(&self) -> bool {
        matches!(self, XPathValue::NodeSet(_))
    }

    pub fn as_nodeset(&self) -> Option<&[NodeId]> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn into_nodeset(self) -> Option<Vec<NodeId>> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl Default for XPathValue {
    fn default() -> Self {
        Self::empty_nodeset()
    }
}

impl From<bool> for XPathValue {
    fn from(b: bool) -> Self {
        XPathValue::Boolean(b)
    }
}

impl From<f64> for XPathValue {
    fn from(n: f64) -> Self {
        XPathValue::Number(n)
    }
}

impl From<String> for XPathValue {
    fn from(s: String) -> Self {
        XPathValue::String(s)
    }
}

impl From<&str> for XPathValue {
    fn from(s: &str) -> Self {
        XPathValue::String(s.to_string())
    }
}

impl From<Vec<NodeId>> for XPathValue {
    fn from(nodes: Vec<NodeId>) -> Self {
        XPathValue::NodeSet(nodes)
    }
}

/// XPath number syntax: optional `-`, digits with at most one `.`,
/// surrounding whitespace allowed. Anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// XPath number formatting: no exponent, integers without a fraction
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;

    #[test]
    fn test_boolean_conversion() {
        assert!(XPathValue::Boolean(true).to_boolean());
        assert!(!XPathValue::Number(f64::NAN).to_boolean());
        assert!(!XPathValue::String(String::new()).to_boolean());
        assert!(XPathValue::single_node(0).to_boolean());
        assert!(!XPathValue::StringList(Vec::new()).to_boolean());
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("-1.5"), -1.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert!(string_to_number("1e3").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("+1").is_nan());
        assert!(string_to_number("").is_nan());
        assert!(string_to_number(".").is_nan());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_nodeset_string_value() {
        let doc = XmlDocument::parse(b"<r><a>12</a><a>x</a></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let first = doc.first_child_of(root).unwrap();
        let value = XPathValue::NodeSet(doc.children(root).collect());
        assert_eq!(value.to_string_value(&doc), "12");
        assert_eq!(value.to_number(&doc), 12.0);
        assert_eq!(XPathValue::single_node(first).to_string_value(&doc), "12");
        assert_eq!(XPathValue::empty_nodeset().to_string_value(&doc), "");
    }
}
