//! ResourceArc Wrappers
//!
//! Persistent reader state handed to the BEAM as an opaque reference.

use crate::stream::XPointerReader;
use rustler::ResourceArc;
use std::sync::{Mutex, PoisonError};

/// Wrapper for XPointerReader that can be stored in a ResourceArc
pub struct XPointerReaderResource {
    inner: Mutex<XPointerReader>,
}

impl XPointerReaderResource {
    pub fn new(reader: XPointerReader) -> Self {
        XPointerReaderResource {
            inner: Mutex::new(reader),
        }
    }

    /// Run `f` with exclusive access to the reader. A reader left behind by
    /// a panicking call is still usable: every operation leaves it in a
    /// consistent phase.
    pub fn with_reader<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut XPointerReader) -> R,
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[rustler::resource_impl]
impl rustler::Resource for XPointerReaderResource {}

/// Type alias for the ResourceArc
pub type XPointerReaderRef = ResourceArc<XPointerReaderResource>;
