//! Node serialization
//!
//! Writes a node and its subtree back out as XML text. Namespace
//! declarations are written where they appeared, plus the inherited ones on
//! the fragment's top element; elements without children use the
//! self-closing form.

use super::namespace::inherited_declarations;
use super::node::{NodeId, NodeKind};
use super::DocumentAccess;
use crate::core::entities::{encode_attribute, encode_text};

/// Serialize a node (and its subtree) into a new string
pub fn node_to_xml<D: DocumentAccess>(doc: &D, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

/// Append the serialization of a node to `out`. An element is written as a
/// standalone fragment: the namespace declarations it inherits are repeated
/// on its start tag.
pub fn write_node<D: DocumentAccess>(doc: &D, id: NodeId, out: &mut String) {
    if doc.node_kind_of(id) == Some(NodeKind::Element) {
        let inherited = inherited_declarations(doc, id);
        write_element(doc, id, &inherited, out);
    } else {
        write_content(doc, id, out);
    }
}

fn write_content<D: DocumentAccess>(doc: &D, id: NodeId, out: &mut String) {
    let Some(kind) = doc.node_kind_of(id) else {
        return;
    };
    match kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_content(doc, child, out);
            }
        }
        NodeKind::Element => write_element(doc, id, &[], out),
        NodeKind::Text => encode_text(doc.node_value(id).unwrap_or_default(), out),
        NodeKind::CData => write_cdata(doc.node_value(id).unwrap_or_default(), out),
        NodeKind::Comment => write_comment(doc.node_value(id).unwrap_or_default(), out),
        NodeKind::ProcessingInstruction => write_processing_instruction(
            doc.node_name(id).unwrap_or_default(),
            doc.node_value(id).unwrap_or_default(),
            out,
        ),
    }
}

fn write_element<D: DocumentAccess>(
    doc: &D,
    id: NodeId,
    inherited: &[(String, String)],
    out: &mut String,
) {
    let has_children = doc.first_child_of(id).is_some();
    write_start_tag(doc, id, inherited, !has_children, out);
    if has_children {
        for child in doc.children(id) {
            write_content(doc, child, out);
        }
        write_end_tag(doc.node_name(id).unwrap_or_default(), out);
    }
}

/// `<name attr="v"...>` or `<name attr="v".../>`, with `inherited`
/// declarations ahead of the element's own attributes
pub fn write_start_tag<D: DocumentAccess>(
    doc: &D,
    id: NodeId,
    inherited: &[(String, String)],
    self_closing: bool,
    out: &mut String,
) {
    let strings = doc.strings();
    let declarations = inherited.iter().map(|(name, uri)| (name.as_str(), uri.as_str()));
    let own = doc
        .attributes(id)
        .iter()
        .map(|a| (strings.get(a.name_id), strings.get(a.value_id)));
    write_tag(
        doc.node_name(id).unwrap_or_default(),
        declarations.chain(own),
        self_closing,
        out,
    );
}

pub(crate) fn write_tag<'s>(
    name: &str,
    attributes: impl IntoIterator<Item = (&'s str, &'s str)>,
    self_closing: bool,
    out: &mut String,
) {
    out.push('<');
    out.push_str(name);
    for (attr_name, value) in attributes {
        out.push(' ');
        out.push_str(attr_name);
        out.push_str("=\"");
        encode_attribute(value, out);
        out.push('"');
    }
    out.push_str(if self_closing { "/>" } else { ">" });
}

pub(crate) fn write_end_tag(name: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub(crate) fn write_cdata(content: &str, out: &mut String) {
    out.push_str("<![CDATA[");
    out.push_str(content);
    out.push_str("]]>");
}

pub(crate) fn write_comment(content: &str, out: &mut String) {
    out.push_str("<!--");
    out.push_str(content);
    out.push_str("-->");
}

pub(crate) fn write_processing_instruction(target: &str, data: &str, out: &mut String) {
    out.push_str("<?");
    out.push_str(target);
    if !data.is_empty() {
        out.push(' ');
        out.push_str(data);
    }
    out.push_str("?>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;

    #[test]
    fn test_element_round_trip() {
        let input = r#"<r xmlns:p="urn:p"><p:a x="1 &amp; 2">t &lt; u</p:a><b/><!--c--><?pi d?><![CDATA[<raw>]]></r>"#;
        let doc = XmlDocument::parse(input.as_bytes()).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(node_to_xml(&doc, root), input);
    }

    #[test]
    fn test_empty_element_self_closes() {
        let doc = XmlDocument::parse(b"<r><a></a></r>").unwrap();
        let a = doc.first_child_of(doc.root_element_id().unwrap()).unwrap();
        assert_eq!(node_to_xml(&doc, a), "<a/>");
    }

    #[test]
    fn test_fragment_repeats_inherited_declarations() {
        let doc = XmlDocument::parse(br#"<r xmlns:p="urn:p" xmlns="urn:d"><p:a><b/></p:a></r>"#).unwrap();
        let a = doc.first_child_of(doc.root_element_id().unwrap()).unwrap();
        assert_eq!(
            node_to_xml(&doc, a),
            r#"<p:a xmlns:p="urn:p" xmlns="urn:d"><b/></p:a>"#
        );
    }

    #[test]
    fn test_text_node_and_document() {
        let doc = XmlDocument::parse(b"<!--top--><r>a&gt;b</r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let text = doc.first_child_of(root).unwrap();
        assert_eq!(node_to_xml(&doc, text), "a&gt;b");
        assert_eq!(node_to_xml(&doc, 0), "<!--top--><r>a&gt;b</r>");
    }
}
