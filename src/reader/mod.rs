//! XML Reader Module
//!
//! - SliceReader: zero-copy pull parser over a byte slice
//! - Events: XML event types for pull parsing
//! - Buffered: draining forward-only sources

pub mod buffered;
pub mod events;
pub mod slice;
