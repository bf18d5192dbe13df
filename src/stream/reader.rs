//! Pointer-scoped token reader
//!
//! Resolution happens eagerly in `new` and `restart`, so a bad pointer or
//! document is reported there rather than on the first read. Matches are
//! then streamed back to back through one bounded [`NodeReader`] at a time.

use super::node_reader::NodeReader;
use super::source::{ReaderSettings, Source};
use super::{LineInfo, ReadState, TokenReader, XmlToken};
use crate::dom::{LinePosition, NodeCursor, NodeId, XmlDocument};
use crate::error::ReaderError;
use crate::xpointer::{NodeSequence, Pointer, Selected};
use std::sync::Arc;

/// Where the reader is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Parsing, materializing and evaluating
    Resolving,
    /// A node reader over the current match is active
    Streaming,
    /// The current match is exhausted; moving to the next one
    Advancing,
    Finished,
}

/// Reader over the match being streamed
#[derive(Debug)]
enum MatchReader {
    Node(NodeReader<XmlDocument>),
    /// A selected attribute: one text token, then nothing
    Value(Option<String>),
}

impl MatchReader {
    fn read(&mut self) -> Option<XmlToken> {
        match self {
            MatchReader::Node(reader) => reader.read(),
            MatchReader::Value(value) => value.take().map(XmlToken::Text),
        }
    }

    fn depth(&self) -> usize {
        match self {
            MatchReader::Node(reader) => reader.depth(),
            MatchReader::Value(_) => 0,
        }
    }
}

/// Streams every node a pointer selects as one token stream
#[derive(Debug)]
pub struct XPointerReader {
    settings: ReaderSettings,
    phase: Phase,
    pointer: Option<Pointer>,
    document: Option<Arc<XmlDocument>>,
    matches: Option<NodeSequence>,
    current: Option<MatchReader>,
    started: bool,
}

impl XPointerReader {
    pub fn new(source: Source, pointer: &str) -> Result<Self, ReaderError> {
        Self::with_settings(source, pointer, ReaderSettings::default())
    }

    pub fn with_settings(
        source: Source,
        pointer: &str,
        settings: ReaderSettings,
    ) -> Result<Self, ReaderError> {
        let mut reader = XPointerReader {
            settings,
            phase: Phase::Finished,
            pointer: None,
            document: None,
            matches: None,
            current: None,
            started: false,
        };
        reader.restart(source, pointer)?;
        Ok(reader)
    }

    /// Drop all state and resolve `pointer` against `source`. On failure the
    /// reader is left finished.
    #[tracing::instrument(level = "debug", skip_all, fields(pointer = %pointer))]
    pub fn restart(&mut self, source: Source, pointer: &str) -> Result<(), ReaderError> {
        self.pointer = None;
        self.document = None;
        self.matches = None;
        self.current = None;
        self.started = false;
        self.transition(Phase::Resolving);

        match self.resolve(source, pointer) {
            Ok(()) => {
                self.open_current();
                Ok(())
            }
            Err(err) => {
                tracing::debug!(error = %err, "resolution failed");
                self.transition(Phase::Finished);
                Err(err)
            }
        }
    }

    fn resolve(&mut self, source: Source, text: &str) -> Result<(), ReaderError> {
        let pointer = Pointer::parse(text)?;
        let document = source.materialize(&self.settings)?;
        let matches = pointer.evaluate(NodeCursor::document(document.as_ref()))?;
        tracing::debug!(matches = matches.len(), "pointer resolved");
        self.pointer = Some(pointer);
        self.document = Some(document);
        self.matches = Some(matches);
        Ok(())
    }

    /// Open a reader on the current match, or finish
    fn open_current(&mut self) {
        let selected = self.matches.as_ref().and_then(NodeSequence::current).cloned();
        let reader = match (selected, self.document.clone()) {
            (Some(Selected::Node(node)), Some(doc)) => {
                Some(MatchReader::Node(NodeReader::new(doc, node)))
            }
            (Some(Selected::Attribute(value)), Some(_)) => Some(MatchReader::Value(Some(value))),
            _ => None,
        };
        self.current = reader;
        if self.current.is_some() {
            self.transition(Phase::Streaming);
        } else {
            self.transition(Phase::Finished);
        }
    }

    fn transition(&mut self, phase: Phase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "reader phase");
        self.phase = phase;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pointer(&self) -> Option<&Pointer> {
        self.pointer.as_ref()
    }

    pub fn document(&self) -> Option<&Arc<XmlDocument>> {
        self.document.as_ref()
    }

    /// Number of nodes the pointer selected
    pub fn match_count(&self) -> usize {
        self.matches.as_ref().map_or(0, NodeSequence::len)
    }

    /// Node currently being streamed; `None` while streaming an attribute
    pub fn current_match(&self) -> Option<NodeId> {
        match self.phase {
            Phase::Streaming | Phase::Advancing => {
                self.matches.as_ref().and_then(NodeSequence::current_node)
            }
            Phase::Resolving | Phase::Finished => None,
        }
    }
}

impl TokenReader for XPointerReader {
    fn read(&mut self) -> Option<XmlToken> {
        self.started = true;
        loop {
            match self.phase {
                Phase::Resolving | Phase::Finished => return None,
                Phase::Streaming => {
                    if let Some(token) = self.current.as_mut().and_then(MatchReader::read) {
                        return Some(token);
                    }
                    self.transition(Phase::Advancing);
                }
                Phase::Advancing => {
                    let more = self.matches.as_mut().is_some_and(NodeSequence::move_next);
                    if more {
                        self.open_current();
                    } else {
                        self.current = None;
                        self.transition(Phase::Finished);
                    }
                }
            }
        }
    }

    fn depth(&self) -> usize {
        self.current.as_ref().map_or(0, MatchReader::depth)
    }

    fn read_state(&self) -> ReadState {
        match self.phase {
            Phase::Finished => ReadState::EndOfFile,
            _ if !self.started => ReadState::Initial,
            _ => ReadState::Interactive,
        }
    }
}

impl LineInfo for XPointerReader {
    fn line_position(&self) -> Option<LinePosition> {
        match self.current.as_ref()? {
            MatchReader::Node(reader) => reader.line_position(),
            MatchReader::Value(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DocumentCache;
    use crate::dom::serialize::node_to_xml;
    use crate::dom::DocumentAccess;
    use crate::error::PointerError;
    use std::io::Cursor;
    use std::num::NonZeroUsize;

    const DOC: &str = r#"<lib>
  <book id="b1"><title>One</title></book>
  <note>skip</note>
  <book id="b2"><title>Two</title><extra/></book>
  <book id="b3"/>
</lib>"#;

    fn doc() -> Arc<XmlDocument> {
        Arc::new(XmlDocument::parse(DOC.as_bytes()).unwrap())
    }

    fn drain(reader: &mut XPointerReader) -> String {
        let mut out = String::new();
        reader.write_remaining(&mut out);
        out
    }

    #[test]
    fn test_matches_stream_back_to_back() {
        let doc = doc();
        let mut reader = XPointerReader::new(Source::document(Arc::clone(&doc)), "xpath1(//book)")
            .unwrap();
        assert_eq!(reader.phase(), Phase::Streaming);
        assert_eq!(reader.read_state(), ReadState::Initial);
        assert_eq!(reader.match_count(), 3);

        let expected: String = crate::xpath::evaluate(doc.as_ref(), "//book")
            .unwrap()
            .into_nodeset()
            .unwrap()
            .into_iter()
            .map(|n| node_to_xml(doc.as_ref(), n))
            .collect();
        assert_eq!(drain(&mut reader), expected);
        assert_eq!(
            expected,
            r#"<book id="b1"><title>One</title></book><book id="b2"><title>Two</title><extra/></book><book id="b3"/>"#
        );
        assert_eq!(reader.phase(), Phase::Finished);
        assert!(reader.is_eof());
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn test_depth_is_relative_to_match() {
        let mut reader = XPointerReader::new(Source::document(doc()), "b2").unwrap();
        let mut depths = Vec::new();
        while reader.read().is_some() {
            depths.push(reader.depth());
        }
        // <book><title>Two</title><extra/></book>
        assert_eq!(depths, [0, 1, 2, 1, 1, 0]);
    }

    #[test]
    fn test_current_match_advances() {
        let doc = doc();
        let mut reader =
            XPointerReader::new(Source::document(Arc::clone(&doc)), "xpath1(//book[@id!='b2'])")
                .unwrap();
        let first = reader.current_match().unwrap();
        assert_eq!(doc.element_by_id("b1"), Some(first));
        // <book> <title> One </title> </book>
        for _ in 0..5 {
            reader.read();
        }
        assert_eq!(reader.current_match(), Some(first));
        reader.read();
        assert_eq!(reader.current_match(), doc.element_by_id("b3"));
        assert_eq!(reader.read(), None);
        assert_eq!(reader.current_match(), None);
    }

    #[test]
    fn test_resolution_errors_are_synchronous() {
        let err = XPointerReader::new(Source::document(doc()), "too bad").unwrap_err();
        assert!(matches!(err, ReaderError::Pointer(PointerError::Syntax { .. })));

        let err = XPointerReader::new(Source::document(doc()), "xpath1(//missing)").unwrap_err();
        assert!(matches!(err, ReaderError::Pointer(PointerError::NoSubresources(_))));

        let err = XPointerReader::new(Source::bytes("<a>"), "xpath1(/a)").unwrap_err();
        assert!(matches!(err, ReaderError::Document(_)));
    }

    #[test]
    fn test_restart_after_full_read() {
        let doc = doc();
        let mut reader = XPointerReader::new(Source::document(Arc::clone(&doc)), "b1").unwrap();
        assert_eq!(drain(&mut reader), r#"<book id="b1"><title>One</title></book>"#);

        reader
            .restart(Source::document(Arc::clone(&doc)), "element(/1/2)")
            .unwrap();
        assert_eq!(reader.read_state(), ReadState::Initial);
        assert_eq!(drain(&mut reader), "<note>skip</note>");

        reader
            .restart(Source::bytes("<x><y/></x>"), "xpointer(/x/y)")
            .unwrap();
        assert_eq!(drain(&mut reader), "<y/>");
    }

    #[test]
    fn test_failed_restart_leaves_no_stale_tokens() {
        let mut reader = XPointerReader::new(Source::document(doc()), "b2").unwrap();
        reader.read();
        assert!(reader.restart(Source::document(doc()), "nope").is_err());
        assert_eq!(reader.phase(), Phase::Finished);
        assert_eq!(reader.match_count(), 0);
        assert!(reader.document().is_none());
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn test_cached_stream_sources() {
        let cache = Arc::new(DocumentCache::new(NonZeroUsize::new(8).unwrap()));
        let settings = ReaderSettings::default().cache(Arc::clone(&cache));
        let open = |xml: &str| {
            XPointerReader::with_settings(
                Source::stream_with_base_uri(Cursor::new(xml.as_bytes().to_vec()), "/tmp/lib.xml"),
                "xpath1(/*)",
                settings.clone(),
            )
            .unwrap()
        };
        let first = open("<a/>");
        let second = open("<b/>");
        assert!(Arc::ptr_eq(
            first.document().unwrap(),
            second.document().unwrap()
        ));
        drop((first, second));
        let mut third = open("<b/>");
        assert_eq!(drain(&mut third), "<b/>");
    }

    #[test]
    fn test_prefixed_match_keeps_namespace_declarations() {
        let doc = XmlDocument::parse(br#"<r xmlns:p="urn:p"><p:a>t</p:a><p:a/></r>"#).unwrap();
        let mut reader =
            XPointerReader::new(Source::from(doc), "xmlns(x=urn:p) xpath1(//x:a)").unwrap();
        match reader.read() {
            Some(XmlToken::StartElement { attributes, namespace_uri, .. }) => {
                assert_eq!(attributes, [("xmlns:p".to_string(), "urn:p".to_string())]);
                assert_eq!(namespace_uri.as_deref(), Some("urn:p"));
            }
            other => panic!("expected a start tag, got {other:?}"),
        }
        assert_eq!(drain(&mut reader), r#"t</p:a><p:a xmlns:p="urn:p"/>"#);
    }

    #[test]
    fn test_attribute_matches_stream_as_text() {
        let mut reader =
            XPointerReader::new(Source::document(doc()), "xpath1(//book/@id) xpath1(//note)")
                .unwrap();
        assert_eq!(reader.match_count(), 3);
        assert_eq!(reader.current_match(), None);
        assert_eq!(reader.read(), Some(XmlToken::Text("b1".to_string())));
        assert_eq!(reader.depth(), 0);
        assert_eq!(reader.line_position(), None);
        assert_eq!(drain(&mut reader), "b2b3");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_line_info_follows_current_match() {
        let mut reader = XPointerReader::new(Source::document(doc()), "xpath1(//title)").unwrap();
        reader.read();
        assert_eq!(
            reader.line_position(),
            Some(LinePosition { line: 2, column: 17 })
        );
        reader.read();
        reader.read();
        reader.read();
        assert_eq!(
            reader.line_position(),
            Some(LinePosition { line: 4, column: 17 })
        );
    }
}
