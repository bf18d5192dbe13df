//! Streaming Readers
//!
//! Forward-only token streams over materialized documents. [`NodeReader`]
//! streams a document or a single subtree; [`XPointerReader`] streams every
//! node a pointer selects, one after another, as a single token stream.

pub mod node_reader;
pub mod reader;
pub mod source;
pub mod token;

pub use node_reader::NodeReader;
pub use reader::{Phase, XPointerReader};
pub use source::{ReaderSettings, Source};
pub use token::XmlToken;

use crate::dom::LinePosition;

/// Lifecycle of a token reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Nothing has been read yet
    Initial,
    Interactive,
    EndOfFile,
}

/// Forward-only token stream
pub trait TokenReader {
    /// Next token, or `None` at the end of the stream
    fn read(&mut self) -> Option<XmlToken>;

    /// Depth of the last token, relative to the top of the stream
    fn depth(&self) -> usize;

    fn read_state(&self) -> ReadState;

    fn is_eof(&self) -> bool {
        self.read_state() == ReadState::EndOfFile
    }

    /// Drain the stream, serializing every token into `out`
    fn write_remaining(&mut self, out: &mut String) {
        while let Some(token) = self.read() {
            token.write_to(out);
        }
    }
}

/// Source position of the last token read, where the document kept one
pub trait LineInfo {
    fn line_position(&self) -> Option<LinePosition>;

    fn has_line_info(&self) -> bool {
        self.line_position().is_some()
    }
}
