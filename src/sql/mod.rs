//! SQL text generation primitives.
//!
//! - [`token`] - Token types and the token stream every clause builder emits
//! - [`literal`] - String literal escaping

pub mod literal;
pub mod token;

pub use literal::{escape_literal, quote_literal};
pub use token::{Token, TokenStream};
