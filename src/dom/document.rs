//! XML Document - Arena-based DOM representation
//!
//! Documents are fully owned and immutable once built, so they can be shared
//! as `Arc<XmlDocument>` across threads and held by a document cache.

use super::namespace::NamespaceScopes;
use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use super::{DocumentAccess, LinePosition, NodeLineInfo};
use crate::core::attributes::Attribute;
use crate::core::dtd::DtdDeclarations;
use crate::core::tokenizer::ParseError;
use crate::core::unicode::is_whitespace_byte;
use crate::error::DocumentError;
use crate::reader::buffered::read_all;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;

/// Options for building a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject mismatched or unclosed tags, multiple roots, character data
    /// outside the root element, repeated attributes and unbound prefixes.
    /// When false the builder recovers: stray end tags are ignored, open
    /// elements are closed at end of input.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { strict: true }
    }
}

impl ParseOptions {
    pub fn lenient() -> Self {
        ParseOptions { strict: false }
    }
}

/// An XML document stored in arena format
#[derive(Debug)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    attributes: Vec<XmlAttribute>,
    strings: StringPool,
    root_element: Option<NodeId>,
    /// ID value -> element, first occurrence wins
    ids: HashMap<String, NodeId>,
    /// Source position per node, indexed by NodeId
    positions: Vec<LinePosition>,
    base_uri: Option<String>,
}

impl XmlDocument {
    /// Parse a document in strict mode
    pub fn parse(input: &[u8]) -> Result<Self, DocumentError> {
        Self::parse_with(input, ParseOptions::default())
    }

    pub fn parse_with(input: &[u8], options: ParseOptions) -> Result<Self, DocumentError> {
        if let Err(e) = std::str::from_utf8(input) {
            return Err(DocumentError::InvalidUtf8(e.valid_up_to()));
        }
        let mut builder = Builder::new(input, options.strict);
        builder.run()?;
        let doc = builder.finish()?;
        tracing::trace!(
            nodes = doc.nodes.len(),
            ids = doc.ids.len(),
            strict = options.strict,
            "built document"
        );
        Ok(doc)
    }

    /// Drain a forward-only source and build a document from it
    pub fn from_reader<R: Read>(reader: R, options: ParseOptions) -> Result<Self, DocumentError> {
        let bytes = read_all(reader)?;
        Self::parse_with(&bytes, options)
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Identifier the document was materialized from, if any
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root_element.and_then(|id| self.node_name(id))
    }
}

impl DocumentAccess for XmlDocument {
    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    #[inline]
    fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn strings(&self) -> &StringPool {
        &self.strings
    }

    fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match self.get_node(id) {
            Some(node) if node.is_element() => {
                let start = node.attr_start as usize;
                let end = start + node.attr_count as usize;
                self.attributes.get(start..end).unwrap_or(&[])
            }
            _ => &[],
        }
    }

    fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.ids.get(value).copied()
    }
}

impl NodeLineInfo for XmlDocument {
    fn line_position(&self, id: NodeId) -> Option<LinePosition> {
        self.positions.get(id as usize).copied()
    }
}

fn malformed(err: ParseError) -> DocumentError {
    DocumentError::malformed(err.message, err.position)
}

fn text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Builds the arena from reader events
struct Builder<'a> {
    input: &'a [u8],
    reader: SliceReader<'a>,
    strict: bool,
    nodes: Vec<XmlNode>,
    attributes: Vec<XmlAttribute>,
    strings: StringPool,
    scopes: NamespaceScopes,
    /// Open elements; the document node is always at the bottom
    stack: Vec<NodeId>,
    root_element: Option<NodeId>,
    ids: HashMap<String, NodeId>,
    dtd: DtdDeclarations,
}

impl<'a> Builder<'a> {
    fn new(input: &'a [u8], strict: bool) -> Self {
        let mut strings = StringPool::new();
        let scopes = NamespaceScopes::new(&mut strings);
        let reader = if strict {
            SliceReader::new_strict(input)
        } else {
            SliceReader::new(input)
        };
        Builder {
            input,
            reader,
            strict,
            nodes: vec![XmlNode::document()],
            attributes: Vec::new(),
            strings,
            scopes,
            stack: vec![0],
            root_element: None,
            ids: HashMap::new(),
            dtd: DtdDeclarations::default(),
        }
    }

    fn run(&mut self) -> Result<(), DocumentError> {
        loop {
            let event = self.reader.next_event().map_err(malformed)?;
            let offset = self.reader.last_position();
            match event {
                XmlEvent::StartElement(start) => self.open_element(start, offset, false)?,
                XmlEvent::EmptyElement(start) => self.open_element(start, offset, true)?,
                XmlEvent::EndElement(end) => self.close_element(end.name, offset)?,
                XmlEvent::Text(content) => {
                    if self.stack.len() == 1 {
                        if self.strict && !content.iter().all(|&b| is_whitespace_byte(b)) {
                            return Err(DocumentError::malformed(
                                "character data outside the root element",
                                offset,
                            ));
                        }
                        continue;
                    }
                    self.add_leaf(NodeKind::Text, 0, &content, offset);
                }
                XmlEvent::CData(content) => {
                    if self.stack.len() == 1 {
                        if self.strict {
                            return Err(DocumentError::malformed(
                                "CDATA section outside the root element",
                                offset,
                            ));
                        }
                        continue;
                    }
                    self.add_leaf(NodeKind::CData, 0, content, offset);
                }
                XmlEvent::Comment(content) => {
                    self.add_leaf(NodeKind::Comment, 0, content, offset);
                }
                XmlEvent::ProcessingInstruction { target, data } => {
                    let target_id = self.strings.intern(&text(target));
                    self.add_leaf(NodeKind::ProcessingInstruction, target_id, data, offset);
                }
                XmlEvent::DocType(content) => {
                    if self.root_element.is_some() && self.strict {
                        return Err(DocumentError::malformed(
                            "DOCTYPE after the root element",
                            offset,
                        ));
                    }
                    self.dtd = DtdDeclarations::parse(content);
                }
                XmlEvent::XmlDeclaration => {}
                XmlEvent::EndDocument => break,
            }
        }

        if self.stack.len() > 1 && self.strict {
            let open = self.stack[1];
            let name = self.strings.get(self.nodes[open as usize].name_id).to_string();
            return Err(DocumentError::malformed(
                format!("unclosed element <{}>", name),
                self.input.len(),
            ));
        }
        Ok(())
    }

    fn open_element(
        &mut self,
        start: StartElement<'a>,
        offset: usize,
        is_empty: bool,
    ) -> Result<(), DocumentError> {
        let parent = self.stack.last().copied().unwrap_or(0);
        if parent == 0 && self.root_element.is_some() && self.strict {
            return Err(DocumentError::malformed("multiple root elements", offset));
        }

        self.scopes.push_scope();
        for attr in start.attributes.iter().filter(|a| a.is_namespace_declaration()) {
            let prefix_id = if attr.prefix.is_some() {
                self.strings.intern(&text(attr.local_name))
            } else {
                0
            };
            let uri_id = self.strings.intern(&text(&attr.value));
            self.scopes.declare(prefix_id, uri_id);
        }

        let element_name = text(start.name);
        let mut node = XmlNode::new(
            NodeKind::Element,
            Some(parent),
            self.stack.len() as u16,
            offset as u32,
        );
        node.name_id = self.strings.intern(&element_name);
        node.local_id = self.strings.intern(&text(start.local_name));
        node.prefix_id = start
            .prefix
            .map(|p| self.strings.intern(&text(p)))
            .unwrap_or(0);
        node.namespace_id = self.resolve(node.prefix_id, offset)?;

        let node_id = self.nodes.len() as NodeId;
        node.attr_start = self.attributes.len() as u32;
        node.attr_count = start.attributes.len() as u32;
        let id_attribute = self.dtd.id_attribute(&element_name).map(str::to_string);
        for attr in &start.attributes {
            self.add_attribute(attr, node_id, id_attribute.as_deref(), offset)?;
        }

        self.nodes.push(node);
        self.link_child(parent, node_id);
        if parent == 0 && self.root_element.is_none() {
            self.root_element = Some(node_id);
        }

        if is_empty {
            self.scopes.pop_scope();
        } else {
            self.stack.push(node_id);
        }
        Ok(())
    }

    fn add_attribute(
        &mut self,
        attr: &Attribute<'_>,
        owner: NodeId,
        dtd_id_attribute: Option<&str>,
        offset: usize,
    ) -> Result<(), DocumentError> {
        let name = text(attr.name);
        let value = text(&attr.value);
        let is_namespace_decl = attr.is_namespace_declaration();

        let prefix_id = attr
            .prefix
            .map(|p| self.strings.intern(&text(p)))
            .unwrap_or(0);
        // unprefixed attributes are in no namespace, not the default one
        let namespace_id = if is_namespace_decl || prefix_id == 0 {
            0
        } else {
            self.resolve(prefix_id, offset)?
        };

        let is_id = name == "xml:id" || name == "id" || dtd_id_attribute == Some(name.as_ref());
        if is_id && !is_namespace_decl {
            let key = value.trim();
            if !key.is_empty() && !self.ids.contains_key(key) {
                self.ids.insert(key.to_string(), owner);
            }
        }

        let stored = XmlAttribute {
            name_id: self.strings.intern(&name),
            local_id: self.strings.intern(&text(attr.local_name)),
            prefix_id,
            namespace_id,
            value_id: self.strings.intern(&value),
            is_namespace_decl,
        };
        self.attributes.push(stored);
        Ok(())
    }

    /// Namespace URI id for a prefix id in the current scope
    fn resolve(&self, prefix_id: u32, offset: usize) -> Result<u32, DocumentError> {
        match self.scopes.resolve(prefix_id) {
            Some(uri) => Ok(uri),
            None if self.strict => {
                let prefix = self.strings.get(prefix_id);
                Err(DocumentError::malformed(
                    format!("unbound namespace prefix `{}`", prefix),
                    offset,
                ))
            }
            None => Ok(0),
        }
    }

    fn close_element(&mut self, name: &[u8], offset: usize) -> Result<(), DocumentError> {
        let name = text(name);
        let matches = |builder: &Self, id: NodeId| {
            builder.strings.get(builder.nodes[id as usize].name_id) == name
        };

        let top = self.stack.last().copied().unwrap_or(0);
        if top != 0 && matches(self, top) {
            self.pop_element();
            return Ok(());
        }
        if self.strict {
            let message = if top == 0 {
                format!("unexpected end tag </{}>", name)
            } else {
                format!(
                    "end tag </{}> does not match <{}>",
                    name,
                    self.strings.get(self.nodes[top as usize].name_id)
                )
            };
            return Err(DocumentError::malformed(message, offset));
        }

        // lenient: close up to the nearest open element with this name
        if let Some(depth) = self.stack.iter().skip(1).rposition(|&id| matches(self, id)) {
            while self.stack.len() > depth + 1 {
                self.pop_element();
            }
        }
        Ok(())
    }

    fn pop_element(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
            self.scopes.pop_scope();
        }
    }

    fn add_leaf(&mut self, kind: NodeKind, name_id: u32, content: &[u8], offset: usize) {
        let parent = self.stack.last().copied().unwrap_or(0);
        let mut node = XmlNode::new(kind, Some(parent), self.stack.len() as u16, offset as u32);
        node.name_id = name_id;
        node.local_id = name_id;
        node.value_id = self.strings.intern(&text(content));
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent, node_id);
    }

    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        match self.nodes[parent_id as usize].last_child {
            Some(last) => {
                self.nodes[child_id as usize].prev_sibling = Some(last);
                self.nodes[last as usize].next_sibling = Some(child_id);
            }
            None => self.nodes[parent_id as usize].first_child = Some(child_id),
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    fn finish(self) -> Result<XmlDocument, DocumentError> {
        let root_element = self.root_element.ok_or(DocumentError::NoRootElement)?;
        let positions = line_positions(self.input, &self.nodes);
        Ok(XmlDocument {
            nodes: self.nodes,
            attributes: self.attributes,
            strings: self.strings,
            root_element: Some(root_element),
            ids: self.ids,
            positions,
            base_uri: None,
        })
    }
}

/// 1-based line and column (in characters) for every node offset
fn line_positions(input: &[u8], nodes: &[XmlNode]) -> Vec<LinePosition> {
    let mut line_starts = vec![0usize];
    line_starts.extend(memchr::memchr_iter(b'\n', input).map(|nl| nl + 1));

    nodes
        .iter()
        .map(|node| {
            let offset = (node.offset as usize).min(input.len());
            let line = line_starts.partition_point(|&start| start <= offset);
            let line_start = line_starts[line - 1];
            let column = input[line_start..offset]
                .iter()
                .filter(|&&b| (b & 0xC0) != 0x80)
                .count();
            LinePosition {
                line: line as u32,
                column: column as u32 + 1,
            }
        })
        .collect()
}
