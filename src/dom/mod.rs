//! DOM Module - Arena-based XML Document
//!
//! - Arena allocation for nodes, NodeId (u32) indices in document order
//! - String interning for names, URIs and character data
//! - Namespace resolution while building
//! - Cursors for navigation, including a subtree-bounded cursor
//! - Serialization back to XML text

pub mod cursor;
pub mod document;
pub mod namespace;
pub mod node;
pub mod serialize;
pub mod strings;

pub use cursor::{NodeCursor, SubtreeCursor};
pub use document::{ParseOptions, XmlDocument};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use strings::StringPool;

/// 1-based line and column of a node in its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePosition {
    pub line: u32,
    pub column: u32,
}

/// Read access to a document tree.
///
/// These are the navigation primitives everything else is written against:
/// XPath evaluation, pointer resolution, cursors and serialization.
pub trait DocumentAccess {
    /// The document node; always present
    fn document_node_id(&self) -> NodeId {
        0
    }

    fn root_element_id(&self) -> Option<NodeId>;

    fn get_node(&self, id: NodeId) -> Option<&XmlNode>;

    fn strings(&self) -> &StringPool;

    /// Attributes of an element, namespace declarations included
    fn attributes(&self, id: NodeId) -> &[XmlAttribute];

    /// Element whose ID-typed attribute has this value
    fn element_by_id(&self, value: &str) -> Option<NodeId>;

    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.first_child
    }

    fn last_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.last_child
    }

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.next_sibling
    }

    fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.prev_sibling
    }

    /// Qualified name of an element, or target of a processing instruction
    fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => {
                Some(self.strings().get(node.name_id))
            }
            _ => None,
        }
    }

    fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element => Some(self.strings().get(node.local_id)),
            NodeKind::ProcessingInstruction => Some(self.strings().get(node.name_id)),
            _ => None,
        }
    }

    fn node_prefix(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        (node.prefix_id != 0).then(|| self.strings().get(node.prefix_id))
    }

    fn node_namespace_uri(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        (node.namespace_id != 0).then(|| self.strings().get(node.namespace_id))
    }

    /// Character data of text, CDATA, comment and PI nodes
    fn node_value(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Text
            | NodeKind::CData
            | NodeKind::Comment
            | NodeKind::ProcessingInstruction => Some(self.strings().get(node.value_id)),
            _ => None,
        }
    }

    /// Attribute value by qualified name, ignoring namespace declarations
    fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let strings = self.strings();
        self.attributes(id)
            .iter()
            .find(|a| !a.is_namespace_decl && strings.get(a.name_id) == name)
            .map(|a| strings.get(a.value_id))
    }

    fn children(&self, id: NodeId) -> Children<'_, Self>
    where
        Self: Sized,
    {
        Children {
            doc: self,
            next: self.first_child_of(id),
        }
    }

    /// All descendants in document order
    fn descendants(&self, id: NodeId) -> Vec<NodeId>
    where
        Self: Sized,
    {
        let mut result = Vec::new();
        let mut current = self.first_child_of(id);
        while let Some(node) = current {
            result.push(node);
            current = self
                .first_child_of(node)
                .or_else(|| next_outside(self, node, id));
        }
        result
    }
}

/// Next node in document order after `node`'s subtree, staying inside `root`
fn next_outside<D: DocumentAccess>(doc: &D, mut node: NodeId, root: NodeId) -> Option<NodeId> {
    loop {
        if node == root {
            return None;
        }
        if let Some(sibling) = doc.next_sibling_of(node) {
            return Some(sibling);
        }
        node = doc.parent_of(node)?;
    }
}

/// Iterator over the children of a node
pub struct Children<'d, D> {
    doc: &'d D,
    next: Option<NodeId>,
}

impl<D: DocumentAccess> Iterator for Children<'_, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling_of(current);
        Some(current)
    }
}

/// Source-position capability. Documents built from text provide it;
/// other `DocumentAccess` implementations need not.
pub trait NodeLineInfo {
    fn line_position(&self, id: NodeId) -> Option<LinePosition>;
}

/// XPath string-value of a node: concatenated descendant text for elements
/// and the document, the character data for everything else
pub fn node_string_value<D: DocumentAccess>(doc: &D, id: NodeId) -> String {
    match doc.node_kind_of(id) {
        Some(NodeKind::Element) | Some(NodeKind::Document) => doc
            .descendants(id)
            .into_iter()
            .filter(|&n| matches!(doc.node_kind_of(n), Some(NodeKind::Text | NodeKind::CData)))
            .filter_map(|n| doc.node_value(n))
            .collect(),
        Some(_) => doc.node_value(id).unwrap_or_default().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_and_descendants() {
        let doc = XmlDocument::parse(b"<r><a><b/>t</a><c/></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.node_name(children[1]), Some("c"));
        // a, b, "t", c
        assert_eq!(doc.descendants(root).len(), 4);
        assert_eq!(doc.descendants(children[1]).len(), 0);
    }

    #[test]
    fn test_node_string_value() {
        let doc = XmlDocument::parse(b"<r>one<a>two<![CDATA[<3>]]></a><!--x--></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(node_string_value(&doc, root), "onetwo<3>");
        assert_eq!(node_string_value(&doc, 0), "onetwo<3>");
    }

    #[test]
    fn test_names_and_values() {
        let doc = XmlDocument::parse(b"<p:r xmlns:p='urn:p' a='1'><?go now?></p:r>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("p:r"));
        assert_eq!(doc.node_local_name(root), Some("r"));
        assert_eq!(doc.node_prefix(root), Some("p"));
        assert_eq!(doc.node_namespace_uri(root), Some("urn:p"));
        assert_eq!(doc.get_attribute(root, "a"), Some("1"));
        assert_eq!(doc.get_attribute(root, "xmlns:p"), None);

        let pi = doc.first_child_of(root).unwrap();
        assert_eq!(doc.node_name(pi), Some("go"));
        assert_eq!(doc.node_value(pi), Some("now"));
    }
}
