//! Namespace bindings collected from xmlns() parts

use crate::dom::namespace::XML_NAMESPACE;
use crate::xpath::NamespaceContext;

/// Prefix bindings scoped to one pointer evaluation. Later declarations of a
/// prefix shadow earlier ones.
#[derive(Debug, Clone)]
pub struct NamespaceBindings {
    bindings: Vec<(String, String)>,
}

impl NamespaceBindings {
    /// Bindings with only `xml` declared
    pub fn new() -> Self {
        NamespaceBindings {
            bindings: vec![("xml".to_string(), XML_NAMESPACE.to_string())],
        }
    }

    pub fn declare(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.bindings.push((prefix.into(), uri.into()));
    }

    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for NamespaceBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceContext for NamespaceBindings {
    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.lookup(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_prefix_prebound() {
        let bindings = NamespaceBindings::new();
        assert_eq!(bindings.lookup("xml"), Some(XML_NAMESPACE));
        assert_eq!(bindings.lookup("p"), None);
    }

    #[test]
    fn test_most_recent_wins() {
        let mut bindings = NamespaceBindings::new();
        bindings.declare("p", "urn:one");
        bindings.declare("q", "urn:q");
        bindings.declare("p", "urn:two");
        assert_eq!(bindings.lookup_namespace("p"), Some("urn:two"));
        assert_eq!(bindings.lookup_namespace("q"), Some("urn:q"));
        assert_eq!(bindings.len(), 4);
    }
}
