//! # Symbol Token Handling
//!
//! This module defines the symbols (operators and delimiters) of the selector
//! language and provides functionality for parsing symbol tokens.
//!
//! ## Parsing Strategy
//!
//! Symbols are parsed using a longest-match approach so that two-character
//! operators like `<=` are recognized instead of being split into `<` and `=`.
//! Operator precedence itself is handled by the analyzer, not here.

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Comparison and arithmetic operators of the selector language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Equality comparison (`=`)
    #[strum(serialize = "=")]
    Equal,
    /// Inequality comparison (`<>`)
    #[strum(serialize = "<>")]
    NotEqual,
    /// Greater than comparison (`>`)
    #[strum(serialize = ">")]
    Greater,
    /// Greater than or equal comparison (`>=`)
    #[strum(serialize = ">=")]
    GreaterEqual,
    /// Less than comparison (`<`)
    #[strum(serialize = "<")]
    Less,
    /// Less than or equal comparison (`<=`)
    #[strum(serialize = "<=")]
    LessEqual,

    /// Addition / unary plus (`+`)
    #[strum(serialize = "+")]
    Plus,
    /// Subtraction / unary minus (`-`)
    #[strum(serialize = "-")]
    Minus,
    /// Multiplication (`*`)
    #[strum(serialize = "*")]
    Multiply,
    /// Division (`/`)
    #[strum(serialize = "/")]
    Divide,
}

/// Structural delimiters of the selector language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Delimiter {
    /// Opening parenthesis (`(`) for grouping and `IN` lists
    #[strum(serialize = "(")]
    OpenParen,
    /// Closing parenthesis (`)`)
    #[strum(serialize = ")")]
    CloseParen,
    /// Comma (`,`) separating `IN` list entries
    #[strum(serialize = ",")]
    Comma,
}

/// Parses an operator token from the input string.
///
/// Two-character operators are matched before their one-character prefixes.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                // Two-character operators (matched first for longest-match)
                value(Operator::NotEqual, tag("<>")),
                value(Operator::GreaterEqual, tag(">=")),
                value(Operator::LessEqual, tag("<=")),
                // One-character operators
                value(Operator::Equal, tag("=")),
                value(Operator::Greater, tag(">")),
                value(Operator::Less, tag("<")),
                value(Operator::Plus, tag("+")),
                value(Operator::Minus, tag("-")),
                value(Operator::Multiply, tag("*")),
                value(Operator::Divide, tag("/")),
            )),
            Token::Operator,
        ),
    )(input)
}

/// Parses a delimiter token from the input string.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::Comma, tag(",")),
            )),
            Token::Delimiter,
        ),
    )(input)
}
