//! # Selector Grammar
//!
//! The selector expression grammar over the token stream, lowest to highest
//! precedence:
//!
//! ```text
//! or        := and (OR and)*
//! and       := not (AND not)*
//! not       := NOT not | predicate
//! predicate := identifier IS [NOT] NULL
//!            | identifier [NOT] LIKE string [ESCAPE string]
//!            | identifier [NOT] IN '(' string (',' string)* ')'
//!            | additive [NOT] BETWEEN additive AND additive
//!            | additive (cmp-op additive)*
//! additive  := multiplicative (('+'|'-') multiplicative)*
//! mult      := unary (('*'|'/') unary)*
//! unary     := '-' unary | '+' unary | primary
//! primary   := literal | identifier | '(' or ')'
//! ```
//!
//! `LIKE` patterns are translated and compiled while parsing, so an invalid
//! `ESCAPE` clause fails the parse instead of surfacing at evaluation time.

use super::{core::Parser, prelude::*};
use crate::ast::{BinaryOperator, Expression, LikePattern, UnaryOperator};
use crate::tokenizer::{
    keyword::Keyword,
    symbol::{Delimiter, Operator},
    token::Token,
};

/// Entry point: one complete selector expression.
pub fn parse_selector() -> impl Parser<Token, Expression> {
    with_context(lazy(parse_or), "selector")
}

fn parse_or() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_and(),
                many(tuple2(parse_operator_or(), parse_and())),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "logical or",
    )
}

fn parse_and() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_not(),
                many(tuple2(parse_operator_and(), parse_not())),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "logical and",
    )
}

fn parse_not() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(keyword(Keyword::Not), lazy(parse_not)),
                |expr| Expression::UnaryOp {
                    op: UnaryOperator::Not,
                    expr: Box::new(expr),
                },
            )),
            Box::new(parse_predicate()),
        ]),
        "logical not",
    )
}

fn parse_predicate() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(parse_null_predicate()),
            Box::new(parse_like_predicate()),
            Box::new(parse_in_predicate()),
            Box::new(parse_between_predicate()),
            Box::new(parse_comparison()),
        ]),
        "predicate",
    )
}

fn parse_null_predicate() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple3(
                parse_identifier_name(),
                preceded(keyword(Keyword::Is), optional(keyword(Keyword::Not))),
                keyword(Keyword::Null),
            ),
            |(identifier, negated, _)| Expression::IsNull {
                identifier,
                negated: negated.is_some(),
            },
        ),
        "null test",
    )
}

fn parse_like_predicate() -> impl Parser<Token, Expression> {
    with_context(
        try_map(
            tuple4(
                parse_identifier_name(),
                optional(keyword(Keyword::Not)),
                preceded(keyword(Keyword::Like), parse_string_value()),
                optional(preceded(keyword(Keyword::Escape), parse_string_value())),
            ),
            |(identifier, negated, pattern, escape)| {
                let pattern = LikePattern::new(&pattern, escape.as_deref())?;
                Ok(Expression::Like {
                    identifier,
                    pattern,
                    negated: negated.is_some(),
                })
            },
        ),
        "like predicate",
    )
}

fn parse_in_predicate() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple3(
                parse_identifier_name(),
                optional(keyword(Keyword::Not)),
                preceded(
                    keyword(Keyword::In),
                    delimited(
                        delimiter(Delimiter::OpenParen),
                        parse_string_list(),
                        delimiter(Delimiter::CloseParen),
                    ),
                ),
            ),
            |(identifier, negated, list)| Expression::In {
                identifier,
                list,
                negated: negated.is_some(),
            },
        ),
        "in predicate",
    )
}

fn parse_string_list() -> impl Parser<Token, Vec<String>> {
    map(
        tuple2(
            parse_string_value(),
            many(preceded(delimiter(Delimiter::Comma), parse_string_value())),
        ),
        |(first, rest)| {
            let mut list = Vec::with_capacity(rest.len() + 1);
            list.push(first);
            list.extend(rest);
            list
        },
    )
}

fn parse_between_predicate() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple4(
                parse_additive(),
                optional(keyword(Keyword::Not)),
                preceded(keyword(Keyword::Between), parse_additive()),
                preceded(keyword(Keyword::And), parse_additive()),
            ),
            |(expr, negated, low, high)| Expression::Between {
                expr: Box::new(expr),
                low: Box::new(low),
                high: Box::new(high),
                negated: negated.is_some(),
            },
        ),
        "between predicate",
    )
}

fn parse_comparison() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_additive(),
                many(tuple2(parse_operator_comparison(), parse_additive())),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "comparison",
    )
}

fn parse_operator_comparison() -> impl Parser<Token, BinaryOperator> {
    with_context(
        choice(vec![
            Box::new(parse_comparison_equal()),
            Box::new(parse_comparison_not_equal()),
            Box::new(parse_comparison_greater_equal()),
            Box::new(parse_comparison_greater()),
            Box::new(parse_comparison_less_equal()),
            Box::new(parse_comparison_less()),
        ]),
        "comparison operator",
    )
}

fn parse_operator_or() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Keyword(Keyword::Or)), |_| BinaryOperator::Or)
}

fn parse_operator_and() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Keyword(Keyword::And)), |_| BinaryOperator::And)
}

fn parse_comparison_equal() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Equal)), |_| {
        BinaryOperator::Equal
    })
}

fn parse_comparison_not_equal() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::NotEqual)), |_| {
        BinaryOperator::NotEqual
    })
}

fn parse_comparison_greater() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Greater)), |_| {
        BinaryOperator::GreaterThan
    })
}

fn parse_comparison_greater_equal() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::GreaterEqual)), |_| {
        BinaryOperator::GreaterThanEqual
    })
}

fn parse_comparison_less() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Less)), |_| {
        BinaryOperator::LessThan
    })
}

fn parse_comparison_less_equal() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::LessEqual)), |_| {
        BinaryOperator::LessThanEqual
    })
}

fn parse_additive() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_multiplicative(),
                many(tuple2(
                    choice(vec![
                        Box::new(parse_operator_add()),
                        Box::new(parse_operator_subtract()),
                    ]),
                    parse_multiplicative(),
                )),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "additive",
    )
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_unary(),
                many(tuple2(
                    choice(vec![
                        Box::new(parse_operator_multiply()),
                        Box::new(parse_operator_divide()),
                    ]),
                    parse_unary(),
                )),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "multiplicative",
    )
}

fn parse_operator_add() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Plus)), |_| {
        BinaryOperator::Add
    })
}

fn parse_operator_subtract() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Minus)), |_| {
        BinaryOperator::Subtract
    })
}

fn parse_operator_multiply() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Multiply)), |_| {
        BinaryOperator::Multiply
    })
}

fn parse_operator_divide() -> impl Parser<Token, BinaryOperator> {
    map(equal(Token::Operator(Operator::Divide)), |_| {
        BinaryOperator::Divide
    })
}

fn parse_unary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(operator(Operator::Minus), lazy(parse_unary)),
                |expr| Expression::UnaryOp {
                    op: UnaryOperator::Negate,
                    expr: Box::new(expr),
                },
            )),
            // unary plus is a no-op and is absorbed here
            Box::new(preceded(operator(Operator::Plus), lazy(parse_unary))),
            Box::new(parse_primary()),
        ]),
        "unary",
    )
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(parse_literal_expression()),
            Box::new(map(parse_identifier_name(), Expression::Identifier)),
            Box::new(delimited(
                delimiter(Delimiter::OpenParen),
                lazy(parse_or),
                delimiter(Delimiter::CloseParen),
            )),
        ]),
        "primary",
    )
}

fn parse_literal_expression() -> impl Parser<Token, Expression> {
    satisfy(|token: &Token| match token {
        Token::Literal(literal) => Some(Expression::Literal(literal.clone().into())),
        _ => None,
    })
}

fn parse_identifier_name() -> impl Parser<Token, String> {
    satisfy(|token: &Token| match token {
        Token::Identifier(name) => Some(name.clone()),
        _ => None,
    })
}

fn parse_string_value() -> impl Parser<Token, String> {
    use crate::tokenizer::literal::Literal;
    satisfy(|token: &Token| match token {
        Token::Literal(Literal::String(s)) => Some(s.clone()),
        _ => None,
    })
}

fn keyword(value: Keyword) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Keyword(value)))
}

fn operator(value: Operator) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Operator(value)))
}

fn delimiter(value: Delimiter) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Delimiter(value)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Literal;
    use crate::tokenizer::Tokenizer;

    fn parse(input: &str) -> Expression {
        let (pos, expr) = try_parse(input).unwrap();
        let count = tokens(input).len();
        assert_eq!(pos, count, "parser left trailing tokens for {:?}", input);
        expr
    }

    fn try_parse(input: &str) -> super::super::core::ParseResult<Expression> {
        let tokens = tokens(input);
        parse_selector().parse(&tokens, 0)
    }

    fn tokens(input: &str) -> Vec<Token> {
        Tokenizer::new()
            .tokenize(input)
            .unwrap()
            .into_iter()
            .filter(|t| !matches!(t.token, Token::Whitespace(_) | Token::Newline))
            .map(|t| t.token)
            .collect()
    }

    fn ident(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    fn int(value: i64) -> Expression {
        Expression::Literal(Literal::Integer(value))
    }

    fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            parse("Cost = 2"),
            binary(BinaryOperator::Equal, ident("Cost"), int(2))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            parse("a = 1 OR b = 2 AND c = 3"),
            binary(
                BinaryOperator::Or,
                binary(BinaryOperator::Equal, ident("a"), int(1)),
                binary(
                    BinaryOperator::And,
                    binary(BinaryOperator::Equal, ident("b"), int(2)),
                    binary(BinaryOperator::Equal, ident("c"), int(3)),
                ),
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(
            parse("(a = 1 OR b = 2) AND c = 3"),
            binary(
                BinaryOperator::And,
                binary(
                    BinaryOperator::Or,
                    binary(BinaryOperator::Equal, ident("a"), int(1)),
                    binary(BinaryOperator::Equal, ident("b"), int(2)),
                ),
                binary(BinaryOperator::Equal, ident("c"), int(3)),
            )
        );
    }

    #[test]
    fn test_multiplicative_binds_tighter_than_additive() {
        assert_eq!(
            parse("a + b * 2 = 10"),
            binary(
                BinaryOperator::Equal,
                binary(
                    BinaryOperator::Add,
                    ident("a"),
                    binary(BinaryOperator::Multiply, ident("b"), int(2)),
                ),
                int(10),
            )
        );
    }

    #[test]
    fn test_not_chains() {
        assert_eq!(
            parse("NOT NOT a = 1"),
            Expression::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(Expression::UnaryOp {
                    op: UnaryOperator::Not,
                    expr: Box::new(binary(BinaryOperator::Equal, ident("a"), int(1))),
                }),
            }
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(
            parse("Cost > -1"),
            binary(
                BinaryOperator::GreaterThan,
                ident("Cost"),
                Expression::UnaryOp {
                    op: UnaryOperator::Negate,
                    expr: Box::new(int(1)),
                },
            )
        );
    }

    #[test]
    fn test_unary_plus_is_absorbed() {
        assert_eq!(
            parse("Cost = +2"),
            binary(BinaryOperator::Equal, ident("Cost"), int(2))
        );
    }

    #[test]
    fn test_between() {
        assert_eq!(
            parse("Cost BETWEEN 1 AND 3"),
            Expression::Between {
                expr: Box::new(ident("Cost")),
                low: Box::new(int(1)),
                high: Box::new(int(3)),
                negated: false,
            }
        );
    }

    #[test]
    fn test_not_between_followed_by_and() {
        assert_eq!(
            parse("Cost NOT BETWEEN 1 AND 3 AND a = 1"),
            binary(
                BinaryOperator::And,
                Expression::Between {
                    expr: Box::new(ident("Cost")),
                    low: Box::new(int(1)),
                    high: Box::new(int(3)),
                    negated: true,
                },
                binary(BinaryOperator::Equal, ident("a"), int(1)),
            )
        );
    }

    #[test]
    fn test_like_with_escape() {
        let expr = parse("JMSType LIKE 'Spec_al%' ESCAPE '!'");
        match expr {
            Expression::Like {
                identifier,
                pattern,
                negated,
            } => {
                assert_eq!(identifier, "JMSType");
                assert_eq!(pattern.pattern(), "Spec_al%");
                assert_eq!(pattern.escape(), Some('!'));
                assert!(!negated);
            }
            other => panic!("unexpected expression: {:?}", other),
        }
    }

    #[test]
    fn test_not_like() {
        let expr = parse("JMSType NOT LIKE 'x%'");
        assert!(matches!(expr, Expression::Like { negated: true, .. }));
    }

    #[test]
    fn test_in_list() {
        assert_eq!(
            parse("Country IN ('UK', 'US', 'FR')"),
            Expression::In {
                identifier: "Country".to_string(),
                list: vec!["UK".to_string(), "US".to_string(), "FR".to_string()],
                negated: false,
            }
        );
    }

    #[test]
    fn test_is_null_and_is_not_null() {
        assert_eq!(
            parse("Cost IS NULL"),
            Expression::IsNull {
                identifier: "Cost".to_string(),
                negated: false,
            }
        );
        assert_eq!(
            parse("Cost IS NOT NULL"),
            Expression::IsNull {
                identifier: "Cost".to_string(),
                negated: true,
            }
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(parse("a = 1 and b = 2"), parse("a = 1 AND b = 2"));
        assert_eq!(parse("x is null"), parse("x IS NULL"));
    }

    #[test]
    fn test_like_requires_identifier_operand() {
        // "5 LIKE 'x'" parses the 5 and leaves LIKE behind; the compiler
        // turns leftovers into a syntax error.
        let tokens = tokens("5 LIKE 'x'");
        let (pos, _) = parse_selector().parse(&tokens, 0).unwrap();
        assert!(pos < tokens.len());
    }

    #[test]
    fn test_invalid_escape_does_not_parse_as_like() {
        // The LIKE alternative fails on the bad ESCAPE clause; the bare
        // identifier still parses, and the compiler rejects the leftovers.
        let tokens = tokens("JMSType LIKE 'a%' ESCAPE 'toolong'");
        let (pos, expr) = parse_selector().parse(&tokens, 0).unwrap();
        assert_eq!(expr, ident("JMSType"));
        assert!(pos < tokens.len());
    }

    #[test]
    fn test_dangling_operator_stops_early() {
        let tokens = tokens("Cost =");
        let (pos, _) = parse_selector().parse(&tokens, 0).unwrap();
        assert_eq!(pos, 1);
    }

    #[test]
    fn test_unbalanced_parenthesis_fails() {
        assert!(try_parse("(Cost = 2").is_err());
    }
}
