//! # Keyword Token Handling
//!
//! This module defines the reserved words of the selector language. Reserved
//! words are matched case-insensitively (`and`, `AND` and `And` are the same
//! keyword) while identifiers stay case-sensitive, so classification happens
//! on whole words in the tokenizer rather than by prefix matching.
//!
//! The [`Keyword`] enum uses `strum` derive macros to enable:
//!
//! * Case-insensitive string conversion via `EnumString`
//! * Display formatting via `Display`
//! * Iteration over all keywords via `EnumIter`
//! * String reference access via `AsRefStr`
//!
//! `TRUE` and `FALSE` are reserved words as well, but they never surface as
//! [`Keyword`] tokens: the word classifier in [`super::token`] turns them
//! into boolean literals directly.

/// Reserved words of the selector language.
///
/// None of these may be used as a bare identifier in a selector expression.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Keyword {
    /// Logical conjunction, also the range separator in `BETWEEN x AND y`.
    And,
    /// Logical disjunction.
    Or,
    /// Logical negation / predicate negation (`NOT LIKE`, `NOT IN`, ...).
    Not,
    /// Range predicate.
    Between,
    /// Wildcard pattern predicate.
    Like,
    /// Set membership predicate.
    In,
    /// Introduces the null test (`IS NULL` / `IS NOT NULL`).
    Is,
    /// Null marker in the null test.
    Null,
    /// Introduces the escape character of a `LIKE` pattern.
    Escape,
}
