//! Deterministic evaluation of constant expressions and criteria against an empty row.
//! The rewriter only calls this for subtrees it has classified as fully evaluable.
use std::cmp::Ordering;
use thiserror::Error;

use super::objects::types::{ConversionError, Value};
use super::objects::{
    CaseExpression, CompareOperator, CompoundOperator, Criteria, Expression,
    SearchedCaseExpression,
};
use crate::constants::{builtin_function, function_alias, FunctionFlags};

mod formats;
pub use formats::format_date;
pub use formats::format_number;
pub use formats::format_time;
pub use formats::format_timestamp;
pub use formats::parse_number;
pub use formats::parse_timestamp;

mod functions;
pub use functions::invoke;

pub trait Evaluator {
    fn evaluate(&self, expression: &Expression) -> Result<Value, EvaluationError>;

    /// Three valued, None is UNKNOWN.
    fn evaluate_criteria(&self, criteria: &Criteria) -> Result<Option<bool>, EvaluationError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantEvaluator {}

impl ConstantEvaluator {
    pub fn new() -> ConstantEvaluator {
        ConstantEvaluator {}
    }

    fn evaluate_case(&self, case: &CaseExpression) -> Result<Value, EvaluationError> {
        let value = self.evaluate(&case.expression)?;
        for (when, then) in case.whens.iter().zip(case.thens.iter()) {
            let candidate = self.evaluate(when)?;
            if value.compare(&candidate) == Some(Ordering::Equal) {
                return self.evaluate(then);
            }
        }
        match &case.else_expression {
            Some(e) => self.evaluate(e),
            None => Ok(Value::Null),
        }
    }

    fn evaluate_searched_case(&self, case: &SearchedCaseExpression) -> Result<Value, EvaluationError> {
        for (when, then) in case.whens.iter().zip(case.thens.iter()) {
            if self.evaluate_criteria(when)? == Some(true) {
                return self.evaluate(then);
            }
        }
        match &case.else_expression {
            Some(e) => self.evaluate(e),
            None => Ok(Value::Null),
        }
    }

    fn compare(&self, left: &Value, operator: CompareOperator, right: &Value) -> Result<Option<bool>, EvaluationError> {
        if left.is_null() || right.is_null() {
            return Ok(None);
        }
        let ordering = match left.compare(right) {
            Some(o) => o,
            None => {
                // the resolver guarantees comparable types, strings compared to typed values get converted
                let converted = right.convert(left.data_type())?;
                left.compare(&converted).ok_or_else(|| {
                    EvaluationError::InvalidArgument(
                        operator.symbol().to_string(),
                        format!("can't compare {} and {}", left.data_type(), right.data_type()),
                    )
                })?
            }
        };
        Ok(Some(match operator {
            CompareOperator::Eq => ordering == Ordering::Equal,
            CompareOperator::Ne => ordering != Ordering::Equal,
            CompareOperator::Lt => ordering == Ordering::Less,
            CompareOperator::Gt => ordering == Ordering::Greater,
            CompareOperator::Le => ordering != Ordering::Greater,
            CompareOperator::Ge => ordering != Ordering::Less,
        }))
    }
}

fn not3(value: Option<bool>) -> Option<bool> {
    value.map(|b| !b)
}

fn negate_if(negated: bool, value: Option<bool>) -> Option<bool> {
    if negated {
        not3(value)
    } else {
        value
    }
}

impl Evaluator for ConstantEvaluator {
    fn evaluate(&self, expression: &Expression) -> Result<Value, EvaluationError> {
        match expression {
            Expression::Constant(c) => Ok(c.value.clone()),
            Expression::Alias(a) => self.evaluate(&a.expression),
            Expression::Function(f) => {
                let name = function_alias(&f.name).unwrap_or(f.name.as_str());
                if let Some(flags) = builtin_function(name) {
                    if flags.contains(FunctionFlags::NONDETERMINISTIC) {
                        return Err(EvaluationError::NotEvaluable(expression.to_string()));
                    }
                }
                let args = f
                    .args
                    .iter()
                    .map(|a| self.evaluate(a))
                    .collect::<Result<Vec<Value>, EvaluationError>>()?;
                let result = invoke(name, &args, f.data_type)?;
                // keep the declared type
                if result.is_null() || result.data_type() == f.data_type {
                    Ok(result)
                } else {
                    Ok(result.convert(f.data_type)?)
                }
            }
            Expression::Case(c) => self.evaluate_case(c),
            Expression::SearchedCase(c) => self.evaluate_searched_case(c),
            Expression::Element(_)
            | Expression::Variable(_)
            | Expression::Reference(_)
            | Expression::Aggregate(_)
            | Expression::ScalarSubquery(_) => {
                Err(EvaluationError::NotEvaluable(expression.to_string()))
            }
        }
    }

    fn evaluate_criteria(&self, criteria: &Criteria) -> Result<Option<bool>, EvaluationError> {
        match criteria {
            Criteria::True => Ok(Some(true)),
            Criteria::False => Ok(Some(false)),
            Criteria::Unknown => Ok(None),
            Criteria::Compare(c) => {
                let left = self.evaluate(&c.left)?;
                let right = self.evaluate(&c.right)?;
                self.compare(&left, c.operator, &right)
            }
            Criteria::Like(m) => {
                let left = self.evaluate(&m.left)?;
                let right = self.evaluate(&m.right)?;
                if left.is_null() || right.is_null() {
                    return Ok(None);
                }
                let matched = like(&left.to_string(), &right.to_string(), m.escape)?;
                Ok(negate_if(m.negated, Some(matched)))
            }
            Criteria::Between(b) => {
                let value = self.evaluate(&b.expression)?;
                let lower = self.evaluate(&b.lower)?;
                let upper = self.evaluate(&b.upper)?;
                let ge = self.compare(&value, CompareOperator::Ge, &lower)?;
                let le = self.compare(&value, CompareOperator::Le, &upper)?;
                Ok(negate_if(b.negated, and3(ge, le)))
            }
            Criteria::In(s) => {
                let value = self.evaluate(&s.expression)?;
                if value.is_null() {
                    return Ok(None);
                }
                let mut result = Some(false);
                for candidate in &s.values {
                    let candidate = self.evaluate(candidate)?;
                    match self.compare(&value, CompareOperator::Eq, &candidate)? {
                        Some(true) => {
                            result = Some(true);
                            break;
                        }
                        Some(false) => {}
                        None => result = None,
                    }
                }
                Ok(negate_if(s.negated, result))
            }
            Criteria::IsNull(i) => {
                let value = self.evaluate(&i.expression)?;
                Ok(Some(value.is_null() != i.negated))
            }
            Criteria::Compound(c) => {
                let mut result = match c.operator {
                    CompoundOperator::And => Some(true),
                    CompoundOperator::Or => Some(false),
                };
                for child in &c.criteria {
                    let value = self.evaluate_criteria(child)?;
                    result = match c.operator {
                        CompoundOperator::And => and3(result, value),
                        CompoundOperator::Or => or3(result, value),
                    };
                }
                Ok(result)
            }
            Criteria::Not(c) => Ok(not3(self.evaluate_criteria(c)?)),
            Criteria::Expression(e) => match self.evaluate(e)? {
                Value::Null => Ok(None),
                Value::Boolean(b) => Ok(Some(b)),
                v => Err(EvaluationError::InvalidArgument(
                    e.to_string(),
                    format!("{} is not a boolean", v),
                )),
            },
            Criteria::Exists(_)
            | Criteria::SubqueryCompare(_)
            | Criteria::SubqueryIn(_)
            | Criteria::Has(_)
            | Criteria::Translate(_) => Err(EvaluationError::NotEvaluable(criteria.to_string())),
        }
    }
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum LikeToken {
    Char(char),
    One,
    Any,
}

fn like_tokens(pattern: &str, escape: Option<char>) -> Result<Vec<LikeToken>, EvaluationError> {
    let mut tokens = vec![];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if Some(c) == escape {
            match chars.next() {
                Some(n) => tokens.push(LikeToken::Char(n)),
                None => {
                    return Err(EvaluationError::InvalidArgument(
                        "LIKE".to_string(),
                        format!("pattern {} ends with its escape character", pattern),
                    ))
                }
            }
        } else if c == '%' {
            if tokens.last() != Some(&LikeToken::Any) {
                tokens.push(LikeToken::Any);
            }
        } else if c == '_' {
            tokens.push(LikeToken::One);
        } else {
            tokens.push(LikeToken::Char(c));
        }
    }
    Ok(tokens)
}

/// SQL LIKE matching with `%`, `_` and an optional escape character.
pub fn like(value: &str, pattern: &str, escape: Option<char>) -> Result<bool, EvaluationError> {
    let tokens = like_tokens(pattern, escape)?;
    let chars: Vec<char> = value.chars().collect();
    // matches[j] is whether tokens[..i] match chars[..j]
    let mut matches = vec![false; chars.len() + 1];
    matches[0] = true;
    for token in &tokens {
        let mut next = vec![false; chars.len() + 1];
        match token {
            LikeToken::Any => {
                let mut seen = false;
                for j in 0..=chars.len() {
                    seen |= matches[j];
                    next[j] = seen;
                }
            }
            LikeToken::One => {
                for j in 1..=chars.len() {
                    next[j] = matches[j - 1];
                }
            }
            LikeToken::Char(c) => {
                for j in 1..=chars.len() {
                    next[j] = matches[j - 1] && chars[j - 1] == *c;
                }
            }
        }
        matches = next;
    }
    Ok(matches[chars.len()])
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("{0} can't be evaluated without a row")]
    NotEvaluable(String),
    #[error("Unknown function {0}")]
    UnknownFunction(String),
    #[error("Divide by zero")]
    DivideByZero,
    #[error("Overflow in {0}")]
    Overflow(String),
    #[error("Invalid argument to {0}: {1}")]
    InvalidArgument(String, String),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("Bad format pattern {0}")]
    BadFormat(String),
    #[error("{0} doesn't match the pattern {1}")]
    ParseFailure(String, String),
}

#[cfg(test)]
mod tests {
    use super::super::objects::types::DataType;
    use super::super::objects::SetCriteria;
    use super::*;

    fn int(i: i32) -> Expression {
        Expression::constant(Value::Integer(i))
    }

    #[test]
    fn test_like() -> Result<(), Box<dyn std::error::Error>> {
        assert!(like("abc", "a%", None)?);
        assert!(like("abc", "_b_", None)?);
        assert!(!like("abc", "a_", None)?);
        assert!(like("a%c", "a\\%c", Some('\\'))?);
        assert!(!like("abc", "a\\%c", Some('\\'))?);
        assert!(like("", "%", None)?);
        assert!(like("a", "a", None)?);
        assert!(like("aXbYc", "a%b%c", None)?);
        assert!(like("x", "x\\", Some('\\')).is_err());
        Ok(())
    }

    #[test]
    fn test_expression() -> Result<(), Box<dyn std::error::Error>> {
        let evaluator = ConstantEvaluator::new();
        let sum = Expression::function("+", vec![int(2), int(3)], DataType::Integer);
        assert_eq!(evaluator.evaluate(&sum)?, Value::Integer(5));

        let lower = Expression::function(
            "lower",
            vec![Expression::constant(Value::String("AB".to_string()))],
            DataType::String,
        );
        assert_eq!(evaluator.evaluate(&lower)?, Value::String("ab".to_string()));

        let now = Expression::function("NOW", vec![], DataType::Timestamp);
        assert!(matches!(
            evaluator.evaluate(&now),
            Err(EvaluationError::NotEvaluable(_))
        ));

        let column = Expression::element(None, "a", DataType::Integer);
        assert!(evaluator.evaluate(&column).is_err());
        Ok(())
    }

    #[test]
    fn test_three_valued_criteria() -> Result<(), Box<dyn std::error::Error>> {
        let evaluator = ConstantEvaluator::new();
        let null = Expression::null(DataType::Integer);
        let unknown = Criteria::compare(null.clone(), CompareOperator::Eq, int(1));
        assert_eq!(evaluator.evaluate_criteria(&unknown)?, None);
        assert_eq!(
            evaluator.evaluate_criteria(&Criteria::and(vec![unknown.clone(), Criteria::False]))?,
            Some(false)
        );
        assert_eq!(
            evaluator.evaluate_criteria(&Criteria::or(vec![unknown.clone(), Criteria::True]))?,
            Some(true)
        );
        assert_eq!(evaluator.evaluate_criteria(&Criteria::not(unknown))?, None);

        let in_with_null = Criteria::In(SetCriteria {
            expression: int(1),
            values: vec![int(2), null],
            negated: false,
        });
        assert_eq!(evaluator.evaluate_criteria(&in_with_null)?, None);
        assert_eq!(
            evaluator.evaluate_criteria(&Criteria::is_null(Expression::null(DataType::String), false))?,
            Some(true)
        );
        Ok(())
    }

    #[test]
    fn test_case() -> Result<(), Box<dyn std::error::Error>> {
        let evaluator = ConstantEvaluator::new();
        let case = Expression::Case(CaseExpression {
            expression: Box::new(int(2)),
            whens: vec![int(1), int(2)],
            thens: vec![
                Expression::constant(Value::String("one".to_string())),
                Expression::constant(Value::String("two".to_string())),
            ],
            else_expression: None,
            data_type: DataType::String,
        });
        assert_eq!(evaluator.evaluate(&case)?, Value::String("two".to_string()));
        Ok(())
    }
}
