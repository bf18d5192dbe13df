//! SIMD-accelerated XML scanning using memchr
//!
//! The tokenizer only ever needs three kinds of search: a single delimiter
//! byte, a multi-byte terminator (`-->`, `?>`, `]]>`), and a tag end that
//! skips over quoted attribute values.

use memchr::memchr;
use memchr::memmem;

use super::unicode::is_whitespace_byte;

/// Cursor over raw document bytes
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Skip space, tab, newline and carriage return
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace_byte(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Absolute position of the next `byte` at or after the cursor
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Absolute position of the next occurrence of `needle`, searching from `from`
    #[inline]
    pub fn find_seq_from(&self, from: usize, needle: &[u8]) -> Option<usize> {
        let from = from.min(self.input.len());
        memmem::find(&self.input[from..], needle).map(|i| from + i)
    }

    /// Position of the `>` closing the current tag, ignoring `>` inside
    /// single- or double-quoted attribute values
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut quote: Option<u8> = None;
        for (offset, &b) in self.input[self.pos..].iter().enumerate() {
            match (quote, b) {
                (None, b'"' | b'\'') => quote = Some(b),
                (Some(q), _) if q == b => quote = None,
                (None, b'>') => return Some(self.pos + offset),
                _ => {}
            }
        }
        None
    }

    /// Read bytes up to whitespace, `/`, `>` or `=` (a tag or attribute name)
    pub fn read_name(&mut self) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace_byte(b) || matches!(b, b'/' | b'>' | b'=' | b'?') {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }
}
