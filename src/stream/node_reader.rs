//! Token reader over a document or one node's subtree

use super::{LineInfo, ReadState, TokenReader, XmlToken};
use crate::dom::namespace::inherited_declarations;
use crate::dom::{DocumentAccess, LinePosition, NodeId, NodeKind, NodeLineInfo, SubtreeCursor};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Nothing read yet
    Start,
    /// Emit the node under the cursor
    Enter,
    /// Emit the end tag of the element under the cursor
    Leave,
    Done,
}

/// Forward-only reader over the subtree of one node. A document node
/// streams its children; any other node streams itself.
#[derive(Debug)]
pub struct NodeReader<D> {
    cursor: SubtreeCursor<D>,
    step: Step,
    /// Cursor depth of the root's children when the root is a document node
    base_depth: usize,
    depth: usize,
    last_node: Option<NodeId>,
}

impl<D: DocumentAccess> NodeReader<D> {
    pub fn new(doc: Arc<D>, root: NodeId) -> Self {
        let base_depth = usize::from(doc.node_kind_of(root) == Some(NodeKind::Document));
        NodeReader {
            cursor: SubtreeCursor::new(doc, root),
            step: Step::Start,
            base_depth,
            depth: 0,
            last_node: None,
        }
    }

    /// Reader over a whole document
    pub fn document(doc: Arc<D>) -> Self {
        let root = doc.document_node_id();
        Self::new(doc, root)
    }

    pub fn root(&self) -> NodeId {
        self.cursor.root()
    }

    /// Node that produced the last token
    pub fn current_node(&self) -> Option<NodeId> {
        self.last_node
    }

    pub fn document_handle(&self) -> &Arc<D> {
        self.cursor.document()
    }

    fn advance(&mut self) {
        self.step = if self.cursor.move_to_next_sibling() {
            Step::Enter
        } else if self.cursor.move_to_parent() {
            Step::Leave
        } else {
            Step::Done
        };
    }

    fn emit(&mut self, token: XmlToken) -> Option<XmlToken> {
        self.depth = self.cursor.depth().saturating_sub(self.base_depth);
        self.last_node = Some(self.cursor.current());
        Some(token)
    }

    /// Start tag token. The root element also carries the namespace
    /// declarations it inherits, so the stream stands alone.
    fn start_token(&self, node: NodeId, is_empty: bool) -> XmlToken {
        let doc = self.cursor.document();
        let strings = doc.strings();
        let mut attributes = if node == self.cursor.root() {
            inherited_declarations(&**doc, node)
        } else {
            Vec::new()
        };
        attributes.extend(doc.attributes(node).iter().map(|a| {
            (
                strings.get(a.name_id).to_string(),
                strings.get(a.value_id).to_string(),
            )
        }));
        XmlToken::StartElement {
            name: doc.node_name(node).unwrap_or_default().to_string(),
            prefix: doc.node_prefix(node).map(str::to_string),
            local_name: doc.node_local_name(node).unwrap_or_default().to_string(),
            namespace_uri: doc.node_namespace_uri(node).map(str::to_string),
            attributes,
            is_empty,
        }
    }

    fn leaf_token(&self, node: NodeId, kind: NodeKind) -> Option<XmlToken> {
        let doc = self.cursor.document();
        let value = doc.node_value(node).unwrap_or_default().to_string();
        match kind {
            NodeKind::Text => Some(XmlToken::Text(value)),
            NodeKind::CData => Some(XmlToken::CData(value)),
            NodeKind::Comment => Some(XmlToken::Comment(value)),
            NodeKind::ProcessingInstruction => Some(XmlToken::ProcessingInstruction {
                target: doc.node_name(node).unwrap_or_default().to_string(),
                data: value,
            }),
            NodeKind::Element | NodeKind::Document => None,
        }
    }
}

impl<D: DocumentAccess> TokenReader for NodeReader<D> {
    fn read(&mut self) -> Option<XmlToken> {
        loop {
            match self.step {
                Step::Done => return None,
                Step::Start => {
                    self.cursor.move_to_root();
                    self.step = Step::Enter;
                }
                Step::Enter => {
                    let node = self.cursor.current();
                    match self.cursor.kind() {
                        Some(NodeKind::Document) => {
                            if !self.cursor.move_to_first_child() {
                                self.advance();
                            }
                        }
                        Some(NodeKind::Element) => {
                            let has_children = self.cursor.document().first_child_of(node).is_some();
                            let token = self.start_token(node, !has_children);
                            let emitted = self.emit(token);
                            if has_children {
                                self.cursor.move_to_first_child();
                                self.step = Step::Enter;
                            } else {
                                self.advance();
                            }
                            return emitted;
                        }
                        Some(kind) => {
                            let token = self.leaf_token(node, kind);
                            let emitted = token.and_then(|t| self.emit(t));
                            self.advance();
                            if emitted.is_some() {
                                return emitted;
                            }
                        }
                        None => self.step = Step::Done,
                    }
                }
                Step::Leave => {
                    let node = self.cursor.current();
                    if self.cursor.kind() == Some(NodeKind::Element) {
                        let name = self
                            .cursor
                            .document()
                            .node_name(node)
                            .unwrap_or_default()
                            .to_string();
                        let emitted = self.emit(XmlToken::EndElement { name });
                        self.advance();
                        return emitted;
                    }
                    self.advance();
                }
            }
        }
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn read_state(&self) -> ReadState {
        match self.step {
            Step::Start => ReadState::Initial,
            Step::Done => ReadState::EndOfFile,
            Step::Enter | Step::Leave => ReadState::Interactive,
        }
    }
}

impl<D: DocumentAccess + NodeLineInfo> LineInfo for NodeReader<D> {
    fn line_position(&self) -> Option<LinePosition> {
        self.cursor.document().line_position(self.last_node?)
    }
}
