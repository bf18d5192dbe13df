//! RustyXPointer - XPointer resolution with streaming fragment readers
//!
//! Layers:
//! - core / reader / dom: XML tokenizer, pull reader and arena DOM
//! - xpath: XPath 1.0 engine used by the pointer schemes
//! - xpointer: pointer lexer, parser, schemes and first-match resolution
//! - stream: forward-only token readers, including the pointer-scoped one
//! - cache: weakly held documents keyed by absolute identifier
//! - strategy: parallel batch resolution (Rayon)
//!
//! The NIF functions at the bottom of this file are thin adapters over
//! those layers.

use rustler::{Binary, Encoder, Env, ResourceArc, Term};
use std::io::Cursor;

pub mod cache;
pub mod core;
pub mod dom;
pub mod error;
pub mod reader;
pub mod stream;
pub mod strategy;
pub mod xpath;
pub mod xpointer;

mod resource;
mod term;

pub use cache::{DocumentCache, DEFAULT_CACHE_CAPACITY};
pub use dom::{NodeCursor, XmlDocument};
pub use error::{DocumentError, PointerError, ReaderError, XPathError};
pub use stream::{ReaderSettings, Source, TokenReader, XPointerReader, XmlToken};
pub use xpointer::{NodeSequence, Pointer, PointerPart, Selected};

use resource::{XPointerReaderRef, XPointerReaderResource};
use term::{
    document_error_to_term, error_tuple, pointer_error_to_term, pointer_to_term,
    reader_error_to_term, str_to_binary, tokens_to_term, xml_list_to_term,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Pointer Parsing
// ============================================================================

/// Parse a pointer without resolving it
#[rustler::nif]
fn parse_pointer<'a>(env: Env<'a>, pointer: &str) -> Term<'a> {
    match Pointer::parse(pointer) {
        Ok(parsed) => (term::ok(), pointer_to_term(env, &parsed)).encode(env),
        Err(err) => error_tuple(env, pointer_error_to_term(env, &err)),
    }
}

// ============================================================================
// Streaming Reader
// ============================================================================

fn bytes_source(input: &Binary, base_uri: Option<String>) -> Source {
    let bytes = input.as_slice().to_vec();
    match base_uri {
        Some(uri) => Source::stream_with_base_uri(Cursor::new(bytes), uri),
        None => Source::bytes(bytes),
    }
}

fn open_reader<'a>(env: Env<'a>, source: Source, pointer: &str) -> Term<'a> {
    match XPointerReader::new(source, pointer) {
        Ok(reader) => {
            let arc = ResourceArc::new(XPointerReaderResource::new(reader));
            (term::ok(), arc).encode(env)
        }
        Err(err) => error_tuple(env, reader_error_to_term(env, &err)),
    }
}

/// Open a reader over an XML binary. With a base URI the materialized
/// document is shared through the document cache.
#[rustler::nif(schedule = "DirtyCpu")]
fn reader_open<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    pointer: &str,
    base_uri: Option<String>,
) -> Term<'a> {
    open_reader(env, bytes_source(&input, base_uri), pointer)
}

/// Open a reader over a file path or `file:` URI
#[rustler::nif(schedule = "DirtyIo")]
fn reader_open_file<'a>(env: Env<'a>, path: &str, pointer: &str) -> Term<'a> {
    open_reader(env, Source::location(path), pointer)
}

/// Re-resolve an existing reader against a new document and pointer
#[rustler::nif(schedule = "DirtyCpu")]
fn reader_restart<'a>(
    env: Env<'a>,
    reader: XPointerReaderRef,
    input: Binary<'a>,
    pointer: &str,
    base_uri: Option<String>,
) -> Term<'a> {
    let source = bytes_source(&input, base_uri);
    match reader.with_reader(|r| r.restart(source, pointer)) {
        Ok(()) => term::ok().encode(env),
        Err(err) => error_tuple(env, reader_error_to_term(env, &err)),
    }
}

/// Read up to `max` tokens; an empty list means end of stream
#[rustler::nif]
fn reader_read<'a>(env: Env<'a>, reader: XPointerReaderRef, max: usize) -> Term<'a> {
    let tokens = reader.with_reader(|r| {
        let mut tokens = Vec::with_capacity(max.min(1024));
        while tokens.len() < max {
            match r.read() {
                Some(token) => tokens.push(token),
                None => break,
            }
        }
        tokens
    });
    tokens_to_term(env, tokens)
}

/// Serialize the rest of the stream
#[rustler::nif]
fn reader_read_xml<'a>(env: Env<'a>, reader: XPointerReaderRef) -> Term<'a> {
    let xml = reader.with_reader(|r| {
        let mut out = String::new();
        r.write_remaining(&mut out);
        out
    });
    str_to_binary(env, &xml)
}

// ============================================================================
// Batch Resolution
// ============================================================================

/// Resolve many pointers against one document in parallel. Each entry is
/// `{:ok, [xml]}` or `{:error, reason}`, in input order.
#[rustler::nif(schedule = "DirtyCpu")]
fn resolve_many<'a>(env: Env<'a>, input: Binary<'a>, pointers: Vec<&str>) -> Term<'a> {
    let doc = match XmlDocument::parse(input.as_slice()) {
        Ok(doc) => doc,
        Err(err) => {
            let reason = document_error_to_term(env, &err);
            let entries: Vec<Term<'a>> =
                pointers.iter().map(|_| error_tuple(env, reason)).collect();
            return entries.encode(env);
        }
    };

    let results = strategy::resolve_to_xml(&doc, &pointers);
    let entries: Vec<Term<'a>> = results
        .into_iter()
        .map(|result| match result {
            Ok(fragments) => (term::ok(), xml_list_to_term(env, fragments)).encode(env),
            Err(err) => error_tuple(env, pointer_error_to_term(env, &err)),
        })
        .collect();
    entries.encode(env)
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Live documents in the process-wide cache
#[rustler::nif]
fn document_cache_size() -> usize {
    DocumentCache::global().len()
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyXPointer.Native");
