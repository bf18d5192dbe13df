//! Resolution Strategies
//!
//! - Sequential: one pointer at a time, streamed through `XPointerReader`
//! - Parallel: many pointers against one document (Rayon)

pub mod parallel;

pub use parallel::{resolve_parallel, resolve_to_xml};
