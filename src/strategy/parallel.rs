//! Parallel Pointer Resolution
//!
//! Uses Rayon to resolve many pointers against one shared document. Each
//! pointer is parsed and evaluated independently; results keep input order.

use crate::core::entities::encode_text;
use crate::dom::serialize::node_to_xml;
use crate::dom::{DocumentAccess, NodeCursor};
use crate::error::PointerError;
use crate::xpointer::{Pointer, Selected};
use rayon::prelude::*;

/// Resolve each pointer from the document node
pub fn resolve_parallel<D, S>(doc: &D, pointers: &[S]) -> Vec<Result<Vec<Selected>, PointerError>>
where
    D: DocumentAccess + Sync,
    S: AsRef<str> + Sync,
{
    pointers
        .par_iter()
        .map(|text| resolve_one(doc, text.as_ref()))
        .collect()
}

/// Resolve each pointer and serialize every selected item. Attribute
/// values come out as escaped text.
pub fn resolve_to_xml<D, S>(doc: &D, pointers: &[S]) -> Vec<Result<Vec<String>, PointerError>>
where
    D: DocumentAccess + Sync,
    S: AsRef<str> + Sync,
{
    pointers
        .par_iter()
        .map(|text| {
            let items = resolve_one(doc, text.as_ref())?;
            Ok(items.par_iter().map(|item| item_to_xml(doc, item)).collect())
        })
        .collect()
}

fn item_to_xml<D: DocumentAccess>(doc: &D, item: &Selected) -> String {
    match item {
        Selected::Node(id) => node_to_xml(doc, *id),
        Selected::Attribute(value) => {
            let mut out = String::with_capacity(value.len());
            encode_text(value, &mut out);
            out
        }
    }
}

fn resolve_one<D: DocumentAccess>(doc: &D, text: &str) -> Result<Vec<Selected>, PointerError> {
    let pointer = Pointer::parse(text)?;
    Ok(pointer.evaluate(NodeCursor::document(doc))?.into_vec())
}
