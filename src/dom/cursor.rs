//! Tree cursors
//!
//! `NodeCursor` is a borrowed position used while evaluating pointers.
//! `SubtreeCursor` owns a handle on its document and is bound to one node:
//! that node acts as the root of a standalone document, so no move can leave
//! its subtree.

use super::node::{NodeId, NodeKind};
use super::DocumentAccess;
use std::sync::Arc;

/// A position in a borrowed document
pub struct NodeCursor<'d, D> {
    doc: &'d D,
    node: NodeId,
}

impl<D> Clone for NodeCursor<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for NodeCursor<'_, D> {}

impl<D> std::fmt::Debug for NodeCursor<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCursor").field("node", &self.node).finish()
    }
}

impl<'d, D: DocumentAccess> NodeCursor<'d, D> {
    /// Cursor on the document node
    pub fn document(doc: &'d D) -> Self {
        NodeCursor {
            doc,
            node: doc.document_node_id(),
        }
    }

    pub fn new(doc: &'d D, node: NodeId) -> Self {
        NodeCursor { doc, node }
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn doc(&self) -> &'d D {
        self.doc
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.doc.node_kind_of(self.node)
    }

    pub fn first_child(&self) -> Option<Self> {
        self.doc.first_child_of(self.node).map(|n| self.at(n))
    }

    pub fn next_sibling(&self) -> Option<Self> {
        self.doc.next_sibling_of(self.node).map(|n| self.at(n))
    }

    pub fn parent(&self) -> Option<Self> {
        self.doc.parent_of(self.node).map(|n| self.at(n))
    }

    fn at(&self, node: NodeId) -> Self {
        NodeCursor {
            doc: self.doc,
            node,
        }
    }
}

/// Cursor confined to the subtree of one node
#[derive(Debug)]
pub struct SubtreeCursor<D> {
    doc: Arc<D>,
    root: NodeId,
    current: NodeId,
    /// Depth of `current` below `root`
    depth: usize,
}

impl<D> Clone for SubtreeCursor<D> {
    fn clone(&self) -> Self {
        SubtreeCursor {
            doc: Arc::clone(&self.doc),
            root: self.root,
            current: self.current,
            depth: self.depth,
        }
    }
}

impl<D: DocumentAccess> SubtreeCursor<D> {
    pub fn new(doc: Arc<D>, root: NodeId) -> Self {
        SubtreeCursor {
            doc,
            root,
            current: root,
            depth: 0,
        }
    }

    pub fn move_to_first_child(&mut self) -> bool {
        match self.doc.first_child_of(self.current) {
            Some(child) => {
                self.current = child;
                self.depth += 1;
                true
            }
            None => false,
        }
    }

    /// False at the root: the bound node has no siblings
    pub fn move_to_next_sibling(&mut self) -> bool {
        if self.current == self.root {
            return false;
        }
        match self.doc.next_sibling_of(self.current) {
            Some(sibling) => {
                self.current = sibling;
                true
            }
            None => false,
        }
    }

    /// False at the root: the bound node has no parent
    pub fn move_to_parent(&mut self) -> bool {
        if self.current == self.root {
            return false;
        }
        match self.doc.parent_of(self.current) {
            Some(parent) => {
                self.current = parent;
                self.depth -= 1;
                true
            }
            None => false,
        }
    }

    pub fn move_to_root(&mut self) {
        self.current = self.root;
        self.depth = 0;
    }

    #[inline]
    pub fn current(&self) -> NodeId {
        self.current
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> &Arc<D> {
        &self.doc
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.doc.node_kind_of(self.current)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_at_root(&self) -> bool {
        self.current == self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;

    fn sample() -> Arc<XmlDocument> {
        Arc::new(XmlDocument::parse(b"<r><a><x/><y/></a><b/></r>").unwrap())
    }

    #[test]
    fn test_node_cursor_navigation() {
        let doc = sample();
        let cursor = NodeCursor::document(doc.as_ref());
        assert_eq!(cursor.kind(), Some(NodeKind::Document));
        let root = cursor.first_child().unwrap();
        assert_eq!(doc.node_name(root.node()), Some("r"));
        let a = root.first_child().unwrap();
        let b = a.next_sibling().unwrap();
        assert_eq!(doc.node_name(b.node()), Some("b"));
        assert_eq!(b.parent().unwrap().node(), root.node());
        assert!(cursor.parent().is_none());
    }

    #[test]
    fn test_subtree_cursor_is_bounded() {
        let doc = sample();
        let root = doc.root_element_id().unwrap();
        let a = doc.first_child_of(root).unwrap();
        let mut cursor = SubtreeCursor::new(Arc::clone(&doc), a);

        // b is a's sibling but outside the subtree
        assert!(!cursor.move_to_next_sibling());
        assert!(!cursor.move_to_parent());
        assert_eq!(cursor.current(), a);

        assert!(cursor.move_to_first_child());
        assert_eq!(cursor.depth(), 1);
        assert!(cursor.move_to_next_sibling());
        assert_eq!(doc.node_name(cursor.current()), Some("y"));
        assert!(!cursor.move_to_next_sibling());
        assert!(cursor.move_to_parent());
        assert!(cursor.is_at_root());
        assert_eq!(cursor.depth(), 0);
    }

    #[test]
    fn test_move_to_root() {
        let doc = sample();
        let root = doc.root_element_id().unwrap();
        let mut cursor = SubtreeCursor::new(doc, root);
        cursor.move_to_first_child();
        cursor.move_to_first_child();
        assert_eq!(cursor.depth(), 2);
        cursor.move_to_root();
        assert_eq!(cursor.current(), root);
        assert_eq!(cursor.kind(), Some(NodeKind::Element));
    }
}
