//! # Three-Valued Selector Evaluation
//!
//! Evaluates a compiled [`crate::ast::Expression`] against an
//! [`EvaluationContext`] under SQL null semantics: a missing property makes
//! every expression referencing it `Unknown`, and `Unknown` propagates
//! through the operators instead of failing. Only structural misuse of an
//! operator (`LIKE` over a non-string value, integer division by zero)
//! produces an [`EvalError`], and such an error is scoped to a single
//! (message, consumer) match decision.

use thiserror::Error;

pub mod context;
pub mod expression;

pub use context::EvaluationContext;
pub use expression::{SelectorEvaluator, Truth};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("type mismatch: {operator} cannot be applied to {found}")]
    TypeMismatch { operator: String, found: String },
    #[error("integer division by zero")]
    DivisionByZero,
}

pub type EvalResult<T> = Result<T, EvalError>;
