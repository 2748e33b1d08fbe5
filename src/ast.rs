//! # Selector Expression Tree
//!
//! The immutable AST produced by the analyzer. A compiled tree is acyclic,
//! finite, and read-only, so a single tree can be evaluated concurrently
//! from any number of delivery threads.
//!
//! Each node variant carries exactly the operands its operator needs. The
//! predicates that the selector language restricts to property references
//! (`LIKE`, `IN`, `IS NULL`) store the identifier name directly; misuse such
//! as `5 LIKE 'x'` is therefore unrepresentable and rejected while parsing.

use serde::{Deserialize, Serialize};

use crate::tokenizer::literal as token_literal;

/// A literal constant in a selector expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl From<token_literal::Literal> for Literal {
    fn from(literal: token_literal::Literal) -> Self {
        match literal {
            token_literal::Literal::String(s) => Literal::String(s),
            token_literal::Literal::Integer(i) => Literal::Integer(i),
            token_literal::Literal::Float(x) => Literal::Float(x),
            token_literal::Literal::Boolean(b) => Literal::Boolean(b),
        }
    }
}

/// Binary operators, from arithmetic up to logical conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "<>")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    #[strum(serialize = "AND")]
    And,
    #[strum(serialize = "OR")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum UnaryOperator {
    #[strum(serialize = "NOT")]
    Not,
    #[strum(serialize = "-")]
    Negate,
}

/// One node of a compiled selector expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    Like {
        identifier: String,
        pattern: LikePattern,
        negated: bool,
    },
    In {
        identifier: String,
        list: Vec<String>,
        negated: bool,
    },
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    },
    IsNull {
        identifier: String,
        negated: bool,
    },
}

impl Expression {
    /// Collects every property/header name the expression references.
    pub fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Identifier(name) => out.push(name),
            Expression::BinaryOp { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
            Expression::UnaryOp { expr, .. } => expr.collect_identifiers(out),
            Expression::Like { identifier, .. }
            | Expression::In { identifier, .. }
            | Expression::IsNull { identifier, .. } => out.push(identifier),
            Expression::Between {
                expr, low, high, ..
            } => {
                expr.collect_identifiers(out);
                low.collect_identifiers(out);
                high.collect_identifiers(out);
            }
        }
    }
}

/// A `LIKE` pattern, translated to an anchored regular expression once at
/// compile time. `%` matches any character sequence, `_` exactly one
/// character; the optional escape character makes the following wildcard
/// literal.
#[derive(Debug, Clone)]
pub struct LikePattern {
    pattern: String,
    escape: Option<char>,
    matcher: regex::Regex,
}

impl LikePattern {
    pub fn new(pattern: &str, escape: Option<&str>) -> Result<Self, String> {
        let escape = match escape {
            None => None,
            Some(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(format!(
                            "ESCAPE must be a single character, got {:?}",
                            text
                        ))
                    }
                }
            }
        };

        let mut translated = String::with_capacity(pattern.len() + 8);
        let mut escaped = false;
        for c in pattern.chars() {
            if escaped {
                translated.push_str(&regex::escape(&c.to_string()));
                escaped = false;
            } else if Some(c) == escape {
                escaped = true;
            } else if c == '%' {
                translated.push_str(".*");
            } else if c == '_' {
                translated.push('.');
            } else {
                translated.push_str(&regex::escape(&c.to_string()));
            }
        }
        if escaped {
            return Err(format!("dangling escape character in pattern {:?}", pattern));
        }

        let matcher = regex::Regex::new(&format!("(?s)^{}$", translated))
            .map_err(|e| format!("invalid LIKE pattern {:?}: {}", pattern, e))?;

        Ok(Self {
            pattern: pattern.to_string(),
            escape,
            matcher,
        })
    }

    pub fn matches(&self, input: &str) -> bool {
        self.matcher.is_match(input)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn escape(&self) -> Option<char> {
        self.escape
    }
}

// Two patterns are the same pattern when source and escape agree; the
// compiled matcher is derived from exactly those two.
impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.escape == other.escape
    }
}
