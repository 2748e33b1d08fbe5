//! Evaluation context: the read-only view of one message's properties and
//! headers presented to the evaluator.
//!
//! The surrounding broker supplies the message abstraction, so the context
//! is a trait seam: anything that can answer `lookup(name)` can be selected
//! over. [`crate::message::Message`] implements it with header-first
//! precedence; a plain `HashMap` implementation is provided for tests and
//! for callers that evaluate selectors outside a full message.

use std::collections::HashMap;

use crate::message::Value;

/// Read-only property/header lookup for one evaluation.
///
/// `lookup` returns `None` for an absent property; the evaluator maps
/// absence to `Unknown` per SQL null semantics. Implementations must be
/// deterministic for the duration of an evaluation.
pub trait EvaluationContext {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl EvaluationContext for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}
