//! Elixir Term Conversion Utilities
//!
//! Converts pointers, stream tokens and errors to Elixir terms.

use crate::error::{DocumentError, PointerError, ReaderError};
use crate::stream::XmlToken;
use crate::xpointer::{Pointer, PointerPart};
use rustler::{Encoder, Env, NewBinary, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    shorthand,
    scheme_based,
    element,
    xmlns,
    xpath1,
    xpointer,
    syntax_error,
    no_subresources,
    malformed_document,
    io_error,
    invalid_location,
    start_element,
    end_element,
    text,
    cdata,
    comment,
    processing_instruction,
}

/// Create a binary from a string
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Build a list from terms without an intermediate Vec of terms
fn list_from<'a, T, F>(env: Env<'a>, items: Vec<T>, mut convert: F) -> Term<'a>
where
    F: FnMut(T) -> Term<'a>,
{
    let mut list = Term::list_new_empty(env);
    for item in items.into_iter().rev() {
        list = list.list_prepend(convert(item));
    }
    list
}

/// `{:shorthand, name}` or `{:scheme_based, parts}`
pub fn pointer_to_term<'a>(env: Env<'a>, pointer: &Pointer) -> Term<'a> {
    match pointer {
        Pointer::Shorthand(name) => (shorthand(), str_to_binary(env, name)).encode(env),
        Pointer::SchemeBased { parts, .. } => {
            let parts: Vec<&PointerPart> = parts.iter().collect();
            let parts = list_from(env, parts, |part| part_to_term(env, part));
            (scheme_based(), parts).encode(env)
        }
    }
}

fn part_to_term<'a>(env: Env<'a>, part: &PointerPart) -> Term<'a> {
    match part {
        PointerPart::Element(scheme) => {
            (element(), str_to_binary(env, &scheme.expression)).encode(env)
        }
        PointerPart::Xmlns(scheme) => (
            xmlns(),
            str_to_binary(env, &scheme.prefix),
            str_to_binary(env, &scheme.uri),
        )
            .encode(env),
        PointerPart::XPath1(expr) => (xpath1(), str_to_binary(env, expr)).encode(env),
        PointerPart::XPointer(expr) => (xpointer(), str_to_binary(env, expr)).encode(env),
    }
}

/// Convert a stream token
pub fn token_to_term<'a>(env: Env<'a>, token: XmlToken) -> Term<'a> {
    match token {
        XmlToken::StartElement {
            name,
            attributes,
            is_empty,
            ..
        } => {
            let attrs = list_from(env, attributes, |(k, v)| {
                (str_to_binary(env, &k), str_to_binary(env, &v)).encode(env)
            });
            (start_element(), str_to_binary(env, &name), attrs, is_empty).encode(env)
        }
        XmlToken::EndElement { name } => (end_element(), str_to_binary(env, &name)).encode(env),
        XmlToken::Text(content) => (text(), str_to_binary(env, &content)).encode(env),
        XmlToken::CData(content) => (cdata(), str_to_binary(env, &content)).encode(env),
        XmlToken::Comment(content) => (comment(), str_to_binary(env, &content)).encode(env),
        XmlToken::ProcessingInstruction { target, data } => (
            processing_instruction(),
            str_to_binary(env, &target),
            str_to_binary(env, &data),
        )
            .encode(env),
    }
}

pub fn tokens_to_term<'a>(env: Env<'a>, tokens: Vec<XmlToken>) -> Term<'a> {
    list_from(env, tokens, |token| token_to_term(env, token))
}

/// List of XML binaries
pub fn xml_list_to_term<'a>(env: Env<'a>, fragments: Vec<String>) -> Term<'a> {
    list_from(env, fragments, |xml| str_to_binary(env, &xml))
}

pub fn pointer_error_to_term<'a>(env: Env<'a>, err: &PointerError) -> Term<'a> {
    match err {
        PointerError::Syntax { .. } => (syntax_error(), err.to_string()).encode(env),
        PointerError::NoSubresources(pointer) => {
            (no_subresources(), str_to_binary(env, pointer)).encode(env)
        }
    }
}

pub fn document_error_to_term<'a>(env: Env<'a>, err: &DocumentError) -> Term<'a> {
    match err {
        DocumentError::Io(_) => (io_error(), err.to_string()).encode(env),
        DocumentError::InvalidLocation { location, .. } => {
            (invalid_location(), str_to_binary(env, location)).encode(env)
        }
        DocumentError::Malformed { .. }
        | DocumentError::InvalidUtf8(_)
        | DocumentError::NoRootElement => (malformed_document(), err.to_string()).encode(env),
    }
}

pub fn reader_error_to_term<'a>(env: Env<'a>, err: &ReaderError) -> Term<'a> {
    match err {
        ReaderError::Pointer(err) => pointer_error_to_term(env, err),
        ReaderError::Document(err) => document_error_to_term(env, err),
    }
}

/// `{:error, reason}`
pub fn error_tuple<'a>(env: Env<'a>, reason: Term<'a>) -> Term<'a> {
    (error(), reason).encode(env)
}
