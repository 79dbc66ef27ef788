//! Lossless markup scanning.
//!
//! The tokenizer never drops or rewrites bytes: every token carries the span
//! it was scanned from, which is what lets the editor splice edited regions
//! back into the original document without touching anything else.

pub mod cursor;
pub mod span;
pub mod tags;
pub mod tokenizer;

pub use span::Span;
pub use tokenizer::{RawAttribute, StartTag, Token, Tokenizer};
