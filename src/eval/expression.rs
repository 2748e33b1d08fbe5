//! Expression evaluation over the three-valued result domain.
//!
//! Internally the evaluator works with `Option<Value>`: `None` is the SQL
//! null/unknown marker, produced by absent properties and by operations over
//! incompatible types. [`Truth`] is the boolean projection of that domain —
//! the top-level result of a selector — where a message matches only when
//! the result is `True`.

use crate::ast::{BinaryOperator, Expression, LikePattern, Literal, UnaryOperator};
use crate::message::Value;

use super::context::EvaluationContext;
use super::{EvalError, EvalResult};

/// Three-valued logic result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }

    pub fn negate(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }

    /// The match decision: only `True` matches.
    pub fn is_true(self) -> bool {
        self == Truth::True
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

/// Stateless expression walker. Safe to share across delivery threads; every
/// evaluation is free of side effects and deterministic for a given context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorEvaluator;

impl SelectorEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates an expression to its top-level three-valued result.
    #[tracing::instrument(level = "trace", skip(self, expr, ctx))]
    pub fn eval_selector(
        &self,
        expr: &Expression,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Truth> {
        Ok(Self::truth_of(self.eval_expression(expr, ctx)?))
    }

    fn eval_expression(
        &self,
        expr: &Expression,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        match expr {
            Expression::Literal(lit) => Ok(Some(Self::eval_literal(lit))),
            Expression::Identifier(name) => Ok(ctx.lookup(name)),
            Expression::BinaryOp { op, left, right } => self.eval_binary_op(op, left, right, ctx),
            Expression::UnaryOp { op, expr } => self.eval_unary_op(op, expr, ctx),
            Expression::Like {
                identifier,
                pattern,
                negated,
            } => self.eval_like(identifier, pattern, *negated, ctx),
            Expression::In {
                identifier,
                list,
                negated,
            } => Ok(self.eval_in(identifier, list, *negated, ctx)),
            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => self.eval_between(expr, low, high, *negated, ctx),
            Expression::IsNull {
                identifier,
                negated,
            } => Ok(Some(Value::Boolean(
                (ctx.lookup(identifier).is_none()) != *negated,
            ))),
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(x) => Value::Float(*x),
            Literal::Boolean(b) => Value::Boolean(*b),
        }
    }

    fn eval_binary_op(
        &self,
        op: &BinaryOperator,
        left: &Expression,
        right: &Expression,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        match op {
            BinaryOperator::And => self.eval_and(left, right, ctx),
            BinaryOperator::Or => self.eval_or(left, right, ctx),
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::GreaterThan
            | BinaryOperator::LessThanEqual
            | BinaryOperator::GreaterThanEqual => {
                let left = self.eval_expression(left, ctx)?;
                let right = self.eval_expression(right, ctx)?;
                Ok(match (left, right) {
                    (Some(l), Some(r)) => {
                        Self::eval_comparison(op, &l, &r).map(Value::Boolean)
                    }
                    _ => None,
                })
            }
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide => {
                let left = self.eval_expression(left, ctx)?;
                let right = self.eval_expression(right, ctx)?;
                match (left, right) {
                    (Some(l), Some(r)) => Self::eval_arithmetic(op, &l, &r),
                    _ => Ok(None),
                }
            }
        }
    }

    /// AND with short-circuit on a `False` left side: the right side is not
    /// evaluated at all, so neither its unknowns nor its errors surface.
    fn eval_and(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        let left = Self::truth_of(self.eval_expression(left, ctx)?);
        if left == Truth::False {
            return Ok(Self::truth_value(Truth::False));
        }
        let right = Self::truth_of(self.eval_expression(right, ctx)?);
        Ok(Self::truth_value(left.and(right)))
    }

    /// OR with short-circuit on a `True` left side, symmetric to [`Self::eval_and`].
    fn eval_or(
        &self,
        left: &Expression,
        right: &Expression,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        let left = Self::truth_of(self.eval_expression(left, ctx)?);
        if left == Truth::True {
            return Ok(Self::truth_value(Truth::True));
        }
        let right = Self::truth_of(self.eval_expression(right, ctx)?);
        Ok(Self::truth_value(left.or(right)))
    }

    /// Comparison over two present values. `None` means the comparison is
    /// undefined for the operand types (string ordering, mixed kinds).
    fn eval_comparison(op: &BinaryOperator, left: &Value, right: &Value) -> Option<bool> {
        match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => Some(Self::compare_ordered(op, l, r)),
            (Value::Integer(_), Value::Float(_))
            | (Value::Float(_), Value::Integer(_))
            | (Value::Float(_), Value::Float(_)) => {
                let l = Self::as_f64(left)?;
                let r = Self::as_f64(right)?;
                Some(Self::compare_ordered(op, &l, &r))
            }
            (Value::String(l), Value::String(r)) => match op {
                BinaryOperator::Equal => Some(l == r),
                BinaryOperator::NotEqual => Some(l != r),
                _ => None,
            },
            (Value::Boolean(l), Value::Boolean(r)) => match op {
                BinaryOperator::Equal => Some(l == r),
                BinaryOperator::NotEqual => Some(l != r),
                _ => None,
            },
            _ => None,
        }
    }

    fn compare_ordered<T: PartialOrd>(op: &BinaryOperator, left: &T, right: &T) -> bool {
        match op {
            BinaryOperator::Equal => left == right,
            BinaryOperator::NotEqual => left != right,
            BinaryOperator::LessThan => left < right,
            BinaryOperator::GreaterThan => left > right,
            BinaryOperator::LessThanEqual => left <= right,
            BinaryOperator::GreaterThanEqual => left >= right,
            // eval_binary_op only routes comparison operators here
            _ => false,
        }
    }

    fn eval_arithmetic(
        op: &BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> EvalResult<Option<Value>> {
        match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => match op {
                BinaryOperator::Add => Ok(l.checked_add(*r).map(Value::Integer)),
                BinaryOperator::Subtract => Ok(l.checked_sub(*r).map(Value::Integer)),
                BinaryOperator::Multiply => Ok(l.checked_mul(*r).map(Value::Integer)),
                BinaryOperator::Divide => {
                    if *r == 0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(l.checked_div(*r).map(Value::Integer))
                    }
                }
                _ => Ok(None),
            },
            (Value::Integer(_), Value::Float(_))
            | (Value::Float(_), Value::Integer(_))
            | (Value::Float(_), Value::Float(_)) => {
                let l = Self::as_f64(left).unwrap_or_default();
                let r = Self::as_f64(right).unwrap_or_default();
                let result = match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Subtract => l - r,
                    BinaryOperator::Multiply => l * r,
                    BinaryOperator::Divide => l / r,
                    _ => return Ok(None),
                };
                Ok(Some(Value::Float(result)))
            }
            _ => Ok(None),
        }
    }

    fn eval_unary_op(
        &self,
        op: &UnaryOperator,
        expr: &Expression,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        match op {
            UnaryOperator::Not => {
                let truth = Self::truth_of(self.eval_expression(expr, ctx)?);
                Ok(Self::truth_value(truth.negate()))
            }
            UnaryOperator::Negate => Ok(match self.eval_expression(expr, ctx)? {
                Some(Value::Integer(i)) => i.checked_neg().map(Value::Integer),
                Some(Value::Float(x)) => Some(Value::Float(-x)),
                _ => None,
            }),
        }
    }

    fn eval_like(
        &self,
        identifier: &str,
        pattern: &LikePattern,
        negated: bool,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        match ctx.lookup(identifier) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(Value::Boolean(pattern.matches(&s) != negated))),
            Some(other) => Err(EvalError::TypeMismatch {
                operator: if negated { "NOT LIKE" } else { "LIKE" }.to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// IN is an equality disjunction: a non-string value makes each equality
    /// unknown, so the whole membership test is unknown rather than an error.
    fn eval_in(
        &self,
        identifier: &str,
        list: &[String],
        negated: bool,
        ctx: &dyn EvaluationContext,
    ) -> Option<Value> {
        match ctx.lookup(identifier) {
            Some(Value::String(s)) => {
                Some(Value::Boolean(list.iter().any(|item| *item == s) != negated))
            }
            _ => None,
        }
    }

    /// BETWEEN is `expr >= low AND expr <= high` under three-valued rules.
    fn eval_between(
        &self,
        expr: &Expression,
        low: &Expression,
        high: &Expression,
        negated: bool,
        ctx: &dyn EvaluationContext,
    ) -> EvalResult<Option<Value>> {
        let value = self.eval_expression(expr, ctx)?;
        let low = self.eval_expression(low, ctx)?;
        let high = self.eval_expression(high, ctx)?;

        let lower = match (&value, &low) {
            (Some(v), Some(l)) => {
                Self::eval_comparison(&BinaryOperator::GreaterThanEqual, v, l)
            }
            _ => None,
        };
        let upper = match (&value, &high) {
            (Some(v), Some(h)) => Self::eval_comparison(&BinaryOperator::LessThanEqual, v, h),
            _ => None,
        };

        let result = match (lower, upper) {
            (Some(false), _) | (_, Some(false)) => Truth::False,
            (Some(true), Some(true)) => Truth::True,
            _ => Truth::Unknown,
        };
        let result = if negated { result.negate() } else { result };
        Ok(Self::truth_value(result))
    }

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    fn truth_of(value: Option<Value>) -> Truth {
        match value {
            Some(Value::Boolean(true)) => Truth::True,
            Some(Value::Boolean(false)) => Truth::False,
            // absent value, or a non-boolean in a boolean position
            _ => Truth::Unknown,
        }
    }

    fn truth_value(truth: Truth) -> Option<Value> {
        match truth {
            Truth::True => Some(Value::Boolean(true)),
            Truth::False => Some(Value::Boolean(false)),
            Truth::Unknown => None,
        }
    }
}
