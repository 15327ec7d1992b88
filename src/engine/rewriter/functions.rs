//! Desugars macro functions into plain functions and CASE expressions.
use chrono::NaiveDate;

use super::expression::{empty_string, is_null_token, string_constant};
use super::{Rewriter, RewriterError};
use crate::engine::objects::types::{DataType, Value};
use crate::engine::objects::{CompareOperator, Criteria, Expression, Function, SearchedCaseExpression};

const DEFAULT_DECODE_DELIMITER: &str = ",";

impl<'a> Rewriter<'a> {
    /// The expansion of a macro function, None if `function` isn't one or can't be expanded yet.
    pub(super) fn expand_macro(
        &self,
        function: &Function,
    ) -> Result<Option<Expression>, RewriterError> {
        let args = &function.args;
        let data_type = function.data_type;
        let expanded = match (function.name.to_ascii_uppercase().as_str(), args.len()) {
            ("SPACE", 1) => Expression::function(
                "REPEAT",
                vec![
                    Expression::constant(Value::String(" ".to_string())),
                    args[0].clone(),
                ],
                data_type,
            ),
            ("FROM_UNIXTIME", 1) => {
                let epoch = match NaiveDate::from_ymd_opt(1970, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)) {
                    Some(e) => e,
                    None => return Ok(None),
                };
                let add = Expression::function(
                    "TIMESTAMPADD",
                    vec![
                        Expression::constant(Value::String("SQL_TSI_SECOND".to_string())),
                        args[0].clone(),
                        Expression::constant(Value::Timestamp(epoch)),
                    ],
                    DataType::Timestamp,
                );
                self.retype(add, data_type)
            }
            ("NULLIF", 2) => Expression::SearchedCase(SearchedCaseExpression {
                whens: vec![Criteria::compare(
                    args[0].clone(),
                    CompareOperator::Eq,
                    args[1].clone(),
                )],
                thens: vec![Expression::null(data_type)],
                else_expression: Some(Box::new(self.retype(args[0].clone(), data_type))),
                data_type,
            }),
            ("COALESCE", 2) => Expression::function("IFNULL", args.clone(), data_type),
            ("CONCAT2", n) if n > 0 => self.expand_concat2(args, data_type),
            ("DECODESTRING", 2) | ("DECODESTRING", 3) | ("DECODEINTEGER", 2)
            | ("DECODEINTEGER", 3) => match self.expand_decode(function)? {
                Some(e) => e,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(expanded))
    }

    /// Null only when every argument is null, otherwise nulls concatenate as empty strings.
    fn expand_concat2(&self, args: &[Expression], data_type: DataType) -> Expression {
        let all_null = Criteria::and(
            args.iter()
                .map(|a| Criteria::is_null(a.clone(), false))
                .collect(),
        );
        let parts = args
            .iter()
            .map(|a| {
                Expression::function(
                    "IFNULL",
                    vec![self.retype(a.clone(), DataType::String), empty_string()],
                    DataType::String,
                )
            })
            .collect();
        Expression::SearchedCase(SearchedCaseExpression {
            whens: vec![all_null],
            thens: vec![Expression::null(data_type)],
            else_expression: Some(Box::new(Expression::function("CONCAT", parts, data_type))),
            data_type,
        })
    }

    /// DECODESTRING(x, 'c1,r1,c2,r2,else' [, delimiter]) as a searched CASE. The decode
    /// string must be a constant, anything else waits for a later pass.
    fn expand_decode(&self, function: &Function) -> Result<Option<Expression>, RewriterError> {
        let decode = match function.args.get(1).and_then(string_constant) {
            Some(d) => d,
            None => return Ok(None),
        };
        let delimiter = match function.args.get(2) {
            Some(d) => match string_constant(d) {
                Some(d) => d,
                None => return Ok(None),
            },
            None => DEFAULT_DECODE_DELIMITER,
        };
        if delimiter.is_empty() {
            return Err(RewriterError::InvalidDecode(format!(
                "empty delimiter in {}",
                function
            )));
        }

        let operand = &function.args[0];
        let operand_type = match operand.data_type() {
            DataType::Null => DataType::String,
            t => t,
        };
        let data_type = function.data_type;
        let tokens: Vec<&str> = decode.split(delimiter).collect();

        let mut whens = vec![];
        let mut thens = vec![];
        let mut pairs = tokens.chunks_exact(2);
        for pair in &mut pairs {
            let when = if is_null_token(pair[0]) {
                Criteria::is_null(operand.clone(), false)
            } else {
                let value = Value::String(pair[0].to_string())
                    .convert(operand_type)
                    .map_err(|e| {
                        RewriterError::InvalidDecode(format!("{} in {}: {}", pair[0], function, e))
                    })?;
                Criteria::compare(
                    operand.clone(),
                    CompareOperator::Eq,
                    Expression::typed_constant(value, operand_type),
                )
            };
            whens.push(when);
            thens.push(decode_result(pair[1], data_type, function)?);
        }
        let else_expression = match pairs.remainder() {
            [last] => decode_result(last, data_type, function)?,
            _ => self.retype(operand.clone(), data_type),
        };

        debug!("Decoded {} into {} branches", function, whens.len());
        Ok(Some(Expression::SearchedCase(SearchedCaseExpression {
            whens,
            thens,
            else_expression: Some(Box::new(else_expression)),
            data_type,
        })))
    }
}

fn decode_result(
    token: &str,
    data_type: DataType,
    function: &Function,
) -> Result<Expression, RewriterError> {
    if token.eq_ignore_ascii_case("null") {
        return Ok(Expression::null(data_type));
    }
    let value = Value::String(token.to_string())
        .convert(data_type)
        .map_err(|e| RewriterError::InvalidDecode(format!("{} in {}: {}", token, function, e)))?;
    Ok(Expression::typed_constant(value, data_type))
}
