//! Core XML parsing primitives
//!
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: XML token extraction
//! - Entities: entity decoding with Cow (zero-copy when possible) and escaping
//! - Attributes: attribute parsing and normalization
//! - Unicode: XML name character classes
//! - DTD: ID-typed attribute declarations from the internal subset

pub mod attributes;
pub mod dtd;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
pub mod unicode;
