//! # FURUI: Message-Selector Routing Core
//!
//! FURUI is the selector evaluation and filtered-delivery core of a message
//! broker: given a consumer's declared selector — a SQL-92-subset boolean
//! expression over message headers and properties — and an inbound message,
//! it decides which consumers the message is routed to and delivers it to
//! them. Transport, sessions, acknowledgement and persistence belong to the
//! surrounding broker; this crate is the part that understands selectors.
//!
//! ## Selector Processing Pipeline
//!
//! ```text
//! Selector Text → Tokenizer → Analyzer → Expression Tree → Evaluator
//! ```
//!
//! ### Stage 1: Tokenization (Lexical Analysis)
//!
//! The [`tokenizer`] module transforms selector text into a stream of tokens
//! with position information: reserved words, identifiers, literals,
//! operators and delimiters.
//!
//! ### Stage 2: Parsing (Syntactic Analysis)
//!
//! The [`analyzer`] module transforms the token stream into the immutable
//! [`ast::Expression`] tree using a parser combinator system, enforcing the
//! selector grammar and operator precedence.
//!
//! ### Stage 3: Evaluation
//!
//! The [`eval`] module walks a compiled tree against one message's
//! properties and headers, producing a three-valued result
//! ([`eval::Truth`]): `True`, `False`, or `Unknown` for missing data, per
//! SQL null semantics. A message matches only on `True`.
//!
//! [`selector::Selector`] packages the pipeline behind a compile-once entry
//! point.
//!
//! ## Routing and Delivery
//!
//! The [`registry`] holds per-destination consumer bindings, each with its
//! compiled selector; the [`router`] computes the delivery set for a
//! message; the [`dispatcher`] invokes the matched consumers' callbacks.
//! [`system::System`] wires the three behind subscribe/unsubscribe/publish.
//!
//! Compiled selectors are immutable and evaluation is pure, so parsing and
//! evaluation are freely concurrent; the registry is the only mutable shared
//! structure and serves routing reads from copy-on-write snapshots.

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod eval;
pub mod message;
pub mod registry;
pub mod router;
pub mod selector;
pub mod system;
pub mod tokenizer;

// Re-exports
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use eval::{EvalError, EvalResult, EvaluationContext, SelectorEvaluator, Truth};
pub use message::*;
pub use registry::*;
pub use router::*;
pub use selector::*;
pub use system::*;
