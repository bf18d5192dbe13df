//! XML Event Types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::{split_name, Attribute};
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    /// `<name attrs...>`
    StartElement(StartElement<'a>),
    /// `</name>`
    EndElement(EndElement<'a>),
    /// `<name attrs.../>`
    EmptyElement(StartElement<'a>),
    /// Text content between tags (entities decoded)
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(&'a [u8]),
    /// Comment content
    Comment(&'a [u8]),
    /// `<?target data?>`
    ProcessingInstruction { target: &'a [u8], data: &'a [u8] },
    /// `<?xml ...?>`
    XmlDeclaration,
    /// DOCTYPE declaration content
    DocType(&'a [u8]),
    /// End of document
    EndDocument,
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a [u8],
    /// Local name (after colon)
    pub local_name: &'a [u8],
    /// Namespace prefix (before colon), if any
    pub prefix: Option<&'a [u8]>,
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a [u8], attributes: Vec<Attribute<'a>>) -> Self {
        let (prefix, local_name) = split_name(name);
        StartElement {
            name,
            local_name,
            prefix,
            attributes,
        }
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, name: &[u8]) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement<'a> {
    pub name: &'a [u8],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element_names() {
        let attrs = vec![Attribute::new(b"id", Cow::Borrowed(b"x"))];
        let start = StartElement::new(b"p:item", attrs);
        assert_eq!(start.prefix, Some(b"p" as &[u8]));
        assert_eq!(start.local_name, b"item");
        assert_eq!(start.attribute(b"id"), Some(b"x" as &[u8]));
        assert_eq!(start.attribute(b"missing"), None);
    }
}
