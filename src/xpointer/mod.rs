//! XPointer Framework
//!
//! Shorthand pointers and the `element()`, `xmlns()`, `xpath1()` and
//! `xpointer()` schemes. Parsing produces an immutable [`Pointer`];
//! evaluation hands scheme expressions to the XPath engine and keeps the
//! first part that selects anything.

pub mod context;
pub mod lexer;
pub mod parser;
pub mod pointer;
pub mod schemes;

pub use context::NamespaceBindings;
pub use pointer::{NodeSequence, Pointer, Selected};
pub use schemes::{ElementScheme, PointerPart, XmlnsScheme};
