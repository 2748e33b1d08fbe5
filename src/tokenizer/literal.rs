//! # Literal Token Handling
//!
//! String and numeric literals of the selector language.
//!
//! * String literals are single-quoted; a doubled quote (`''`) inside the
//!   literal stands for one quote character.
//! * Exact numerics are decimal (`57`) or hexadecimal (`0x1F`) integers.
//! * Approximate numerics carry a decimal point, an exponent, or both
//!   (`7.`, `.5`, `12.5`, `5E3`, `1.2e-4`).
//!
//! Signs are not part of a literal; unary `+`/`-` is a grammar production in
//! the analyzer, so `Cost -1` tokenizes as identifier, minus, integer.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, digit1, hex_digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    error::context,
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};

use super::token::{ParserResult, Token};

/// A literal value recognized by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_quote_escape(input: &str) -> ParserResult<String> {
    context("quote escape", map(tag("''"), |_| "'".to_string()))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_part(input: &str) -> ParserResult<String> {
    context(
        "string part",
        map(take_while1(|c| c != '\''), |content: &str| {
            content.to_string()
        }),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            delimited(
                char('\''),
                many0(alt((parse_quote_escape, parse_string_part))),
                char('\''),
            ),
            |parts| Literal::String(parts.concat()),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_hex_literal(input: &str) -> ParserResult<Literal> {
    context(
        "hex literal",
        map_res(preceded(tag_no_case("0x"), hex_digit1), |digits: &str| {
            i64::from_str_radix(digits, 16).map(Literal::Integer)
        }),
    )(input)
}

fn parse_exponent(input: &str) -> ParserResult<&str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_float_literal(input: &str) -> ParserResult<Literal> {
    context(
        "float literal",
        map_res(
            alt((
                // 12.5  7.  1.2e-4
                recognize(tuple((
                    digit1,
                    char('.'),
                    opt(digit1),
                    opt(parse_exponent),
                ))),
                // .5  .5e3
                recognize(tuple((char('.'), digit1, opt(parse_exponent)))),
                // 5E3
                recognize(pair(digit1, parse_exponent)),
            )),
            |s: &str| s.parse::<f64>().map(Literal::Float),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer_literal(input: &str) -> ParserResult<Literal> {
    context(
        "integer literal",
        map_res(digit1, |s: &str| s.parse::<i64>().map(Literal::Integer)),
    )(input)
}

/// Parses one literal token.
///
/// Hex must be tried before the decimal forms so `0x2A` is not read as `0`
/// followed by the identifier `x2A`; floats before integers so `12.5` is not
/// read as `12` followed by `.5`.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((
                parse_string_literal,
                parse_hex_literal,
                parse_float_literal,
                parse_integer_literal,
            )),
            Token::Literal,
        ),
    )(input)
}
