//! # Compiled Selectors
//!
//! [`Selector`] ties the pipeline together: tokenize, drop layout tokens,
//! parse, reject trailing input, validate identifiers. Compilation happens
//! once — at subscribe time — and the resulting tree is reused for every
//! message evaluated against the binding, so a broken selector is rejected
//! when the consumer subscribes rather than discovered per message.

use thiserror::Error;

use crate::analyzer::{parse_selector, ParseError, Parser};
use crate::ast::{Expression, Literal};
use crate::eval::{EvalResult, EvaluationContext, SelectorEvaluator, Truth};
use crate::message::UNSELECTABLE_HEADERS;
use crate::tokenizer::{Token, Tokenizer, TokenizerError};

/// A compiled, immutable selector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    text: Option<String>,
    expression: Expression,
}

impl Selector {
    /// Compiles selector text. Empty or blank text compiles to the constant
    /// always-match selector, mirroring a consumer that subscribes without a
    /// selector.
    #[tracing::instrument(level = "debug", skip(text))]
    pub fn compile(text: &str) -> Result<Selector, SelectorError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::match_all());
        }

        let spans = Tokenizer::new().tokenize(trimmed)?;
        let tokens: Vec<Token> = spans
            .into_iter()
            .filter(|t| !matches!(t.token, Token::Whitespace(_) | Token::Newline))
            .map(|t| t.token)
            .collect();

        let (pos, expression) = parse_selector().parse(&tokens, 0)?;
        if pos < tokens.len() {
            return Err(SelectorError::TrailingInput {
                found: tokens[pos].to_string(),
                position: pos,
            });
        }

        Self::validate_identifiers(&expression)?;

        tracing::debug!(selector = trimmed, "selector compiled");
        Ok(Selector {
            text: Some(trimmed.to_string()),
            expression,
        })
    }

    /// The selector of a consumer that declared none: matches every message.
    pub fn match_all() -> Selector {
        Selector {
            text: None,
            expression: Expression::Literal(Literal::Boolean(true)),
        }
    }

    /// The source text, or `None` for the always-match selector.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Three-valued evaluation against one message context.
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvalResult<Truth> {
        SelectorEvaluator::new().eval_selector(&self.expression, ctx)
    }

    /// The match decision: `False` and `Unknown` both mean "does not match".
    pub fn matches(&self, ctx: &dyn EvaluationContext) -> EvalResult<bool> {
        Ok(self.evaluate(ctx)?.is_true())
    }

    fn validate_identifiers(expression: &Expression) -> Result<(), SelectorError> {
        let mut names = Vec::new();
        expression.collect_identifiers(&mut names);
        for name in names {
            if UNSELECTABLE_HEADERS.contains(&name) {
                return Err(SelectorError::UnsupportedIdentifier {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("selector syntax error: {0}")]
    Tokenize(#[from] TokenizerError),
    #[error("selector syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("selector syntax error: trailing input {found} at token {position}")]
    TrailingInput { found: String, position: usize },
    #[error("unsupported identifier in selector: {name}")]
    UnsupportedIdentifier { name: String },
}

impl SelectorError {
    /// True for the malformed-text family of errors, as opposed to a
    /// well-formed selector referencing an unsupported identifier.
    pub fn is_syntax(&self) -> bool {
        !matches!(self, SelectorError::UnsupportedIdentifier { .. })
    }
}
