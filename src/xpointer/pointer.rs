//! Parsed pointers and their resolution

use super::context::NamespaceBindings;
use super::parser;
use super::schemes::PointerPart;
use crate::dom::{DocumentAccess, NodeCursor, NodeId};
use crate::error::PointerError;
use crate::xpath::{self, NamespaceContext, NoNamespaces, XPathValue};
use std::fmt;
use std::str::FromStr;

/// A parsed pointer. Stateless: evaluate it against any number of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pointer {
    /// Bare NCName, resolved through the document's ID index
    Shorthand(String),
    /// Scheme parts in declaration order, with the original text
    SchemeBased {
        parts: Vec<PointerPart>,
        text: String,
    },
}

impl Pointer {
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        parser::parse(text)
    }

    pub fn parts(&self) -> &[PointerPart] {
        match self {
            Pointer::Shorthand(_) => &[],
            Pointer::SchemeBased { parts, .. } => parts,
        }
    }

    /// Resolve against the document `cursor` belongs to.
    ///
    /// Scheme parts are tried in order and the first one selecting a
    /// non-empty node-set (elements, text or attributes) wins. xmlns() parts never match but bind prefixes
    /// for the parts after them. Expression failures only disqualify the
    /// failing part.
    #[tracing::instrument(level = "debug", skip_all, fields(pointer = %self))]
    pub fn evaluate<D: DocumentAccess>(
        &self,
        cursor: NodeCursor<'_, D>,
    ) -> Result<NodeSequence, PointerError> {
        match self {
            Pointer::Shorthand(name) => {
                let expr = format!("id('{name}')");
                match select(cursor, &expr, &NoNamespaces) {
                    Some(items) => Ok(NodeSequence::new(items)),
                    None => Err(PointerError::NoSubresources(name.clone())),
                }
            }
            Pointer::SchemeBased { parts, text } => {
                let mut bindings = NamespaceBindings::new();
                for part in parts {
                    if let PointerPart::Xmlns(scheme) = part {
                        bindings.declare(scheme.prefix.as_str(), scheme.uri.as_str());
                        continue;
                    }
                    let Some(expr) = part.expression() else {
                        continue;
                    };
                    if let Some(items) = select(cursor, expr, &bindings) {
                        tracing::debug!(
                            scheme = part.scheme_name(),
                            matches = items.len(),
                            "part matched"
                        );
                        return Ok(NodeSequence::new(items));
                    }
                }
                Err(PointerError::NoSubresources(text.clone()))
            }
        }
    }
}

/// Non-empty node-set selected by `expr`, or `None`
fn select<D: DocumentAccess>(
    cursor: NodeCursor<'_, D>,
    expr: &str,
    namespaces: &dyn NamespaceContext,
) -> Option<Vec<Selected>> {
    match xpath::evaluate_with(cursor.doc(), cursor.node(), expr, namespaces) {
        Ok(XPathValue::NodeSet(nodes)) if !nodes.is_empty() => {
            Some(nodes.into_iter().map(Selected::Node).collect())
        }
        Ok(XPathValue::StringList(values)) if !values.is_empty() => {
            Some(values.into_iter().map(Selected::Attribute).collect())
        }
        Ok(other) => {
            tracing::debug!(expr, result = other.type_name(), "part selected nothing");
            None
        }
        Err(err) => {
            tracing::debug!(expr, error = %err, "part expression failed");
            None
        }
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pointer::Shorthand(name) => f.write_str(name),
            Pointer::SchemeBased { text, .. } => f.write_str(text),
        }
    }
}

/// One item selected by a pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected {
    Node(NodeId),
    /// Value of a selected attribute. Attributes are not arena nodes, so
    /// only the value is carried; it streams as text.
    Attribute(String),
}

impl Selected {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Selected::Node(id) => Some(*id),
            Selected::Attribute(_) => None,
        }
    }
}

/// Items selected by a pointer, in document order, positioned at the first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSequence {
    items: Vec<Selected>,
    position: usize,
}

impl NodeSequence {
    pub(crate) fn new(items: Vec<Selected>) -> Self {
        NodeSequence { items, position: 0 }
    }

    pub fn current(&self) -> Option<&Selected> {
        self.items.get(self.position)
    }

    /// Current item when it is a node
    pub fn current_node(&self) -> Option<NodeId> {
        self.current().and_then(Selected::node)
    }

    /// Step to the next item; false once the sequence is exhausted
    pub fn move_next(&mut self) -> bool {
        if self.position < self.items.len() {
            self.position += 1;
        }
        self.position < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Selected] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Selected> {
        self.items
    }
}

impl Iterator for NodeSequence {
    type Item = Selected;

    fn next(&mut self) -> Option<Selected> {
        let current = self.current()?.clone();
        self.position += 1;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use rstest::rstest;

    const DOC: &[u8] = br#"<doc xmlns:b="urn:books">
  <intro id="X"><p>one</p><p>two</p></intro>
  <b:shelf><b:book xml:id="B1">Rust</b:book></b:shelf>
  <tail/>
</doc>"#;

    fn doc() -> XmlDocument {
        XmlDocument::parse(DOC).unwrap()
    }

    fn resolve(doc: &XmlDocument, text: &str) -> Result<Vec<String>, PointerError> {
        let pointer = Pointer::parse(text)?;
        let items = pointer.evaluate(NodeCursor::document(doc))?;
        Ok(items
            .map(|item| match item {
                Selected::Node(n) => doc.node_name(n).unwrap_or_default().to_string(),
                Selected::Attribute(value) => format!("@{value}"),
            })
            .collect())
    }

    #[test]
    fn test_shorthand_and_element_agree() {
        let doc = doc();
        let shorthand = Pointer::parse("X").unwrap();
        let element = Pointer::parse("element(X)").unwrap();
        let a = shorthand.evaluate(NodeCursor::document(&doc)).unwrap();
        let b = element.evaluate(NodeCursor::document(&doc)).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.len(), 1);
        assert_eq!(doc.get_attribute(a.current_node().unwrap(), "id"), Some("X"));
    }

    #[rstest]
    #[case("element(X/2)", &["p"])]
    #[case("element(/1/1)", &["intro"])]
    #[case("element(/1)", &["doc"])]
    #[case("B1", &["b:book"])]
    #[case("xpath1(//p)", &["p", "p"])]
    #[case("xpointer(/doc/tail)", &["tail"])]
    fn test_resolution(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(resolve(&doc(), text).unwrap(), expected);
    }

    #[test]
    fn test_first_match_wins() {
        let doc = doc();
        assert_eq!(
            resolve(&doc, "xpath1(//missing) xpath1(//tail) xpath1(//p)").unwrap(),
            ["tail"]
        );
    }

    #[test]
    fn test_failures_are_skipped() {
        let doc = doc();
        assert_eq!(
            resolve(&doc, "xpath1(/foo) foo(abr) xpath1(count(//p)) xpath1(//@missing) xpath1(//tail)")
                .unwrap(),
            ["tail"]
        );
        // never raises anything but NoSubresources
        assert_eq!(
            resolve(&doc, "xpath1(/foo) foo(abr)").unwrap_err(),
            PointerError::NoSubresources("xpath1(/foo) foo(abr)".to_string())
        );
        assert_eq!(
            resolve(&doc, "xpath1(]]) xpath1(q:x)").unwrap_err(),
            PointerError::NoSubresources("xpath1(]]) xpath1(q:x)".to_string())
        );
    }

    #[test]
    fn test_missing_shorthand() {
        assert_eq!(
            resolve(&doc(), "nope").unwrap_err(),
            PointerError::NoSubresources("nope".to_string())
        );
    }

    #[test]
    fn test_xmlns_scoping() {
        let doc = doc();
        // bindings only reach later parts
        assert!(resolve(&doc, "xpath1(//x:book) xmlns(x=urn:books)").is_err());
        assert_eq!(
            resolve(&doc, "xmlns(x=urn:books) xpath1(//x:book)").unwrap(),
            ["b:book"]
        );
        // redeclaration shadows
        assert!(resolve(&doc, "xmlns(x=urn:books) xmlns(x=urn:other) xpath1(//x:book)").is_err());
    }

    #[test]
    fn test_relative_to_cursor() {
        let doc = doc();
        let intro = doc.element_by_id("X").unwrap();
        let pointer = Pointer::parse("xpath1(p[2])").unwrap();
        let nodes = pointer.evaluate(NodeCursor::new(&doc, intro)).unwrap();
        assert_eq!(node_text(&doc, &nodes), ["two"]);
    }

    fn node_text(doc: &XmlDocument, nodes: &NodeSequence) -> Vec<String> {
        nodes
            .as_slice()
            .iter()
            .filter_map(Selected::node)
            .map(|n| crate::dom::node_string_value(doc, n))
            .collect()
    }

    #[test]
    fn test_node_sequence_navigation() {
        let mut seq = NodeSequence::new(vec![
            Selected::Node(3),
            Selected::Attribute("v".to_string()),
        ]);
        assert_eq!(seq.current(), Some(&Selected::Node(3)));
        assert_eq!(seq.current_node(), Some(3));
        assert!(seq.move_next());
        assert_eq!(seq.current(), Some(&Selected::Attribute("v".to_string())));
        assert_eq!(seq.current_node(), None);
        assert!(!seq.move_next());
        assert_eq!(seq.current(), None);
        assert!(!seq.move_next());
    }

    #[test]
    fn test_attribute_selection_wins() {
        let doc = XmlDocument::parse(br#"<r id="a"><s/><t id="b"/></r>"#).unwrap();
        assert_eq!(resolve(&doc, "xpath1(//@id) xpath1(//s)").unwrap(), ["@a", "@b"]);
        assert_eq!(resolve(&doc, "xpath1(//s/@id) xpath1(//s)").unwrap(), ["s"]);
        assert_eq!(resolve(&doc, "xpath1(/r/@id)").unwrap(), ["@a"]);
    }

    #[test]
    fn test_display_and_from_str() {
        let pointer: Pointer = "xpath1(/a) foo(b)".parse().unwrap();
        assert_eq!(pointer.to_string(), "xpath1(/a) foo(b)");
        assert_eq!(pointer.parts().len(), 1);
        assert_eq!(Pointer::Shorthand("x".to_string()).to_string(), "x");
    }
}
