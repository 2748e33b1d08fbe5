//! # Selector Tokenization
//!
//! Lexical analysis for selector text. The tokenizer transforms a selector
//! string into a stream of [`TokenSpan`]s carrying position information;
//! the analyzer consumes the token stream and builds the expression tree.
//!
//! ## Submodules
//!
//! * [`token`] — token type, the tokenizer loop, word classification
//! * [`keyword`] — reserved words (`AND`, `OR`, `NOT`, `BETWEEN`, ...)
//! * [`literal`] — string and numeric literals
//! * [`symbol`] — operators and delimiters
//! * [`whitespace`] — layout tokens

pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;

pub use token::{Span, Token, TokenSpan, Tokenizer, TokenizerError, TokenizerResult};
