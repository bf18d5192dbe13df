//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Ids are
//! assigned in document order, so sorting ids sorts nodes.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Document,
    Element,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Qualified name (elements) or target (PIs), interned
    pub name_id: u32,
    /// Local part of the name, interned
    pub local_id: u32,
    /// Namespace prefix, or 0
    pub prefix_id: u32,
    /// Resolved namespace URI, or 0
    pub namespace_id: u32,
    /// Text, CDATA, comment or PI data, interned
    pub value_id: u32,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    pub attr_count: u32,
    /// Depth in document tree (document node is 0)
    pub depth: u16,
    /// Byte offset of the construct in the source
    pub offset: u32,
}

impl XmlNode {
    pub fn new(kind: NodeKind, parent: Option<NodeId>, depth: u16, offset: u32) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            local_id: 0,
            prefix_id: 0,
            namespace_id: 0,
            value_id: 0,
            attr_start: 0,
            attr_count: 0,
            depth,
            offset,
        }
    }

    pub fn document() -> Self {
        Self::new(NodeKind::Document, None, 0, 0)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// Qualified name, interned
    pub name_id: u32,
    pub local_id: u32,
    pub prefix_id: u32,
    /// Resolved namespace URI, or 0 (unprefixed attributes have none)
    pub namespace_id: u32,
    pub value_id: u32,
    /// `xmlns` / `xmlns:*` declarations are kept for serialization but are
    /// not attributes as far as XPath is concerned
    pub is_namespace_decl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::new(NodeKind::Element, Some(0), 1, 12);
        assert!(elem.is_element());
        assert!(!elem.has_children());
        assert_eq!(elem.parent, Some(0));
        assert_eq!(elem.offset, 12);
    }
}
