//! Owned stream tokens

use crate::core::entities::encode_text;
use crate::dom::serialize::{
    write_cdata, write_comment, write_end_tag, write_processing_instruction, write_tag,
};

/// One token of a forward-only XML stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// Start tag. An element without content is a single token with
    /// `is_empty` set and no matching `EndElement`.
    StartElement {
        name: String,
        prefix: Option<String>,
        local_name: String,
        namespace_uri: Option<String>,
        /// Qualified name and value, namespace declarations included
        attributes: Vec<(String, String)>,
        is_empty: bool,
    },
    EndElement { name: String },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl XmlToken {
    /// Append the XML form of this token
    pub fn write_to(&self, out: &mut String) {
        match self {
            XmlToken::StartElement {
                name,
                attributes,
                is_empty,
                ..
            } => write_tag(
                name,
                attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())),
                *is_empty,
                out,
            ),
            XmlToken::EndElement { name } => write_end_tag(name, out),
            XmlToken::Text(text) => encode_text(text, out),
            XmlToken::CData(text) => write_cdata(text, out),
            XmlToken::Comment(text) => write_comment(text, out),
            XmlToken::ProcessingInstruction { target, data } => {
                write_processing_instruction(target, data, out)
            }
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Element name or PI target
    pub fn name(&self) -> Option<&str> {
        match self {
            XmlToken::StartElement { name, .. } | XmlToken::EndElement { name } => Some(name),
            XmlToken::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, XmlToken::StartElement { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tokens() {
        let start = XmlToken::StartElement {
            name: "p:a".to_string(),
            prefix: Some("p".to_string()),
            local_name: "a".to_string(),
            namespace_uri: Some("urn:p".to_string()),
            attributes: vec![("x".to_string(), "1 < \"2\"".to_string())],
            is_empty: false,
        };
        let mut out = String::new();
        start.write_to(&mut out);
        XmlToken::Text("a & b".to_string()).write_to(&mut out);
        XmlToken::EndElement {
            name: "p:a".to_string(),
        }
        .write_to(&mut out);
        assert_eq!(out, "<p:a x=\"1 &lt; &quot;2&quot;\">a &amp; b</p:a>");
        assert_eq!(start.name(), Some("p:a"));
    }

    #[test]
    fn test_other_tokens() {
        assert_eq!(XmlToken::Comment(" c ".to_string()).to_xml(), "<!-- c -->");
        assert_eq!(XmlToken::CData("<x>".to_string()).to_xml(), "<![CDATA[<x>]]>");
        let pi = XmlToken::ProcessingInstruction {
            target: "pi".to_string(),
            data: String::new(),
        };
        assert_eq!(pi.to_xml(), "<?pi?>");
        assert_eq!(pi.name(), Some("pi"));
    }
}
