//! Namespace Resolution
//!
//! Scoped prefix bindings used while building a document. Each element opens
//! a scope; declarations made on it disappear when the element closes.

use super::node::NodeId;
use super::strings::StringPool;
use super::DocumentAccess;

/// Namespace bound to the `xml` prefix in every document
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace of `xmlns` declarations themselves
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

#[derive(Debug, Clone, Copy)]
struct Binding {
    /// 0 for the default namespace
    prefix_id: u32,
    /// 0 when the declaration undeclares (`xmlns=""`)
    uri_id: u32,
    depth: u16,
}

/// Stack of in-scope namespace bindings, innermost last
#[derive(Debug)]
pub struct NamespaceScopes {
    bindings: Vec<Binding>,
    depth: u16,
    xml_prefix_id: u32,
    xmlns_prefix_id: u32,
}

impl NamespaceScopes {
    /// Scopes with `xml` and `xmlns` pre-bound
    pub fn new(strings: &mut StringPool) -> Self {
        let xml_prefix_id = strings.intern("xml");
        let xmlns_prefix_id = strings.intern("xmlns");
        let bindings = vec![
            Binding {
                prefix_id: xml_prefix_id,
                uri_id: strings.intern(XML_NAMESPACE),
                depth: 0,
            },
            Binding {
                prefix_id: xmlns_prefix_id,
                uri_id: strings.intern(XMLNS_NAMESPACE),
                depth: 0,
            },
        ];
        NamespaceScopes {
            bindings,
            depth: 0,
            xml_prefix_id,
            xmlns_prefix_id,
        }
    }

    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while self.bindings.last().is_some_and(|b| b.depth >= self.depth && b.depth > 0) {
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Bind `prefix_id` (0 = default namespace) in the current scope.
    /// The reserved `xml` and `xmlns` prefixes cannot be rebound.
    pub fn declare(&mut self, prefix_id: u32, uri_id: u32) {
        if prefix_id != 0 && (prefix_id == self.xml_prefix_id || prefix_id == self.xmlns_prefix_id)
        {
            return;
        }
        self.bindings.push(Binding {
            prefix_id,
            uri_id,
            depth: self.depth,
        });
    }

    /// Namespace URI id for a prefix; `None` if unbound. The default
    /// namespace resolves to `Some(0)` when undeclared.
    pub fn resolve(&self, prefix_id: u32) -> Option<u32> {
        let found = self
            .bindings
            .iter()
            .rev()
            .find(|b| b.prefix_id == prefix_id)
            .map(|b| b.uri_id);
        if prefix_id == 0 {
            Some(found.unwrap_or(0))
        } else {
            found.filter(|&uri| uri != 0)
        }
    }
}

/// Namespace declarations in scope at `id` that it does not make itself, as
/// `(xmlns[:prefix], uri)` pairs, outermost ancestor first. A prefix whose
/// nearest declaration is an undeclaration (`xmlns=""`) is left out.
pub fn inherited_declarations<D: DocumentAccess>(doc: &D, id: NodeId) -> Vec<(String, String)> {
    let strings = doc.strings();
    let mut seen: Vec<&str> = doc
        .attributes(id)
        .iter()
        .filter(|a| a.is_namespace_decl)
        .map(|a| strings.get(a.name_id))
        .collect();
    let mut levels = Vec::new();
    let mut ancestor = doc.parent_of(id);
    while let Some(node) = ancestor {
        let mut level = Vec::new();
        for attr in doc.attributes(node).iter().filter(|a| a.is_namespace_decl) {
            let name = strings.get(attr.name_id);
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            let uri = strings.get(attr.value_id);
            if !uri.is_empty() {
                level.push((name.to_string(), uri.to_string()));
            }
        }
        levels.push(level);
        ancestor = doc.parent_of(node);
    }
    levels.into_iter().rev().flatten().collect()
}
