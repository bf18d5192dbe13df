//! XPath 1.0 Engine
//!
//! Evaluates the expressions carried by `xpath1()` and `xpointer()` pointer
//! parts:
//! - All node axes, abbreviated syntax, predicates and unions
//! - The core function library, `id()` included
//! - Qualified name tests resolved through a `NamespaceContext`
//! - Compiled expression caching

pub mod axes;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use compiler::COMPILED_EXPR_CACHE_SIZE;
pub use eval::{evaluate, evaluate_with, NamespaceContext, NoNamespaces};
pub use value::XPathValue;
