//! XPath Axes
//!
//! Node axes return their nodes in axis order: document order for forward
//! axes, reverse document order for reverse axes. The attribute axis yields
//! values rather than nodes and is handled by `attribute_values`.

use super::parser::{Axis, NodeTest};
use crate::dom::{DocumentAccess, NodeId, NodeKind};
use crate::error::XPathError;
use crate::xpath::eval::NamespaceContext;

/// Nodes on `axis` from `context`, in axis order
pub fn navigate<D: DocumentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => doc.descendants(context),
        Axis::DescendantOrSelf => {
            let mut nodes = vec![context];
            nodes.extend(doc.descendants(context));
            nodes
        }
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Ancestor => ancestors(doc, context),
        Axis::AncestorOrSelf => {
            let mut nodes = vec![context];
            nodes.extend(ancestors(doc, context));
            nodes
        }
        Axis::FollowingSibling => siblings(doc, context, D::next_sibling_of),
        Axis::PrecedingSibling => siblings(doc, context, D::prev_sibling_of),
        Axis::Following => following(doc, context),
        Axis::Preceding => preceding(doc, context),
        Axis::SelfAxis => vec![context],
        // attributes and namespace nodes are not arena nodes
        Axis::Attribute | Axis::Namespace => Vec::new(),
    }
}

fn ancestors<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut current = doc.parent_of(context);
    while let Some(node) = current {
        nodes.push(node);
        current = doc.parent_of(node);
    }
    nodes
}

fn siblings<D: DocumentAccess>(
    doc: &D,
    context: NodeId,
    step: fn(&D, NodeId) -> Option<NodeId>,
) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut current = step(doc, context);
    while let Some(node) = current {
        nodes.push(node);
        current = step(doc, node);
    }
    nodes
}

fn following<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut current = Some(context);
    while let Some(node) = current {
        let mut sibling = doc.next_sibling_of(node);
        while let Some(s) = sibling {
            nodes.push(s);
            nodes.extend(doc.descendants(s));
            sibling = doc.next_sibling_of(s);
        }
        current = doc.parent_of(node);
    }
    nodes
}

fn preceding<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut current = Some(context);
    while let Some(node) = current {
        let mut sibling = doc.prev_sibling_of(node);
        while let Some(s) = sibling {
            let mut subtree = vec![s];
            subtree.extend(doc.descendants(s));
            nodes.extend(subtree.into_iter().rev());
            sibling = doc.prev_sibling_of(s);
        }
        current = doc.parent_of(node);
    }
    nodes
}

/// Check a node against a node test. The principal node type of every node
/// axis is element.
pub fn matches_node_test<D: DocumentAccess>(
    doc: &D,
    node: NodeId,
    test: &NodeTest,
    namespaces: &dyn NamespaceContext,
) -> Result<bool, XPathError> {
    let Some(kind) = doc.node_kind_of(node) else {
        return Ok(false);
    };
    let matched = match test {
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target
                    .as_deref()
                    .is_none_or(|t| doc.node_name(node) == Some(t))
        }
        NodeTest::Any => kind == NodeKind::Element,
        NodeTest::Name(local) => {
            kind == NodeKind::Element
                && doc.node_namespace_uri(node).is_none()
                && doc.node_local_name(node) == Some(local.as_str())
        }
        NodeTest::QName { prefix, local } => {
            let uri = resolve_prefix(namespaces, prefix)?;
            kind == NodeKind::Element
                && doc.node_namespace_uri(node) == Some(uri)
                && doc.node_local_name(node) == Some(local.as_str())
        }
        NodeTest::NamespaceWildcard(prefix) => {
            let uri = resolve_prefix(namespaces, prefix)?;
            kind == NodeKind::Element && doc.node_namespace_uri(node) == Some(uri)
        }
    };
    Ok(matched)
}

/// Values of the attributes of `node` selected by `test`
pub fn attribute_values<D: DocumentAccess>(
    doc: &D,
    node: NodeId,
    test: &NodeTest,
    namespaces: &dyn NamespaceContext,
) -> Result<Vec<String>, XPathError> {
    let strings = doc.strings();
    let expected_uri = match test {
        NodeTest::QName { prefix, .. } | NodeTest::NamespaceWildcard(prefix) => {
            Some(resolve_prefix(namespaces, prefix)?)
        }
        _ => None,
    };

    let mut values = Vec::new();
    for attr in doc.attributes(node).iter().filter(|a| !a.is_namespace_decl) {
        let local = strings.get(attr.local_id);
        let uri = strings.get(attr.namespace_id);
        let selected = match test {
            NodeTest::Any | NodeTest::Node => true,
            NodeTest::Name(name) => attr.namespace_id == 0 && local == name,
            NodeTest::QName { local: name, .. } => Some(uri) == expected_uri && local == name,
            NodeTest::NamespaceWildcard(_) => Some(uri) == expected_uri,
            NodeTest::Text | NodeTest::Comment | NodeTest::ProcessingInstruction(_) => false,
        };
        if selected {
            values.push(strings.get(attr.value_id).to_string());
        }
    }
    Ok(values)
}

fn resolve_prefix<'n>(
    namespaces: &'n dyn NamespaceContext,
    prefix: &str,
) -> Result<&'n str, XPathError> {
    namespaces
        .lookup_namespace(prefix)
        .ok_or_else(|| XPathError::UnboundPrefix(prefix.to_string()))
}
