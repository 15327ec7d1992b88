//! Moves functions off the column side of `f(x) op constant` so the comparison is on `x`.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::{ProcedureContext, Rewriter, RewriterError};
use crate::engine::objects::types::{ConversionError, DataType, Value};
use crate::engine::objects::{CompareCriteria, CompareOperator, Criteria, Expression, Function};

impl<'a> Rewriter<'a> {
    /// Called with a constant on the right. Gives back the comparison, rewritten again if it moved.
    pub(super) fn invert_compare(
        &self,
        compare: CompareCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let inverted = match (&compare.left, &compare.right) {
            (Expression::Function(function), Expression::Constant(constant)) => {
                let name = function.name.to_ascii_uppercase();
                let operator = compare.operator;
                let value = &constant.value;
                match name.as_str() {
                    "+" | "-" | "*" | "/" => self.invert_arithmetic(function, operator, value),
                    "CONVERT" => self.invert_convert(function, operator, value, preserve_unknown)?,
                    "TIMESTAMPCREATE" if operator == CompareOperator::Eq => {
                        invert_timestamp_create(function, value)
                    }
                    "CONCAT" if operator == CompareOperator::Eq => {
                        self.split_concat(function, value, preserve_unknown)
                    }
                    n if inverse_name(n).is_some() => {
                        self.invert_format(function, operator, value, preserve_unknown)
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        match inverted {
            Some(criteria) => {
                trace!("Inverted {} to {}", Criteria::Compare(compare), criteria);
                self.rewrite_criteria(criteria, ctx, preserve_unknown)
            }
            None => Ok(Criteria::Compare(compare)),
        }
    }

    fn evaluate_quietly(&self, expression: &Expression) -> Option<Value> {
        match self.evaluator.evaluate(expression) {
            Ok(Value::Null) => None,
            Ok(v) => Some(v),
            Err(e) => {
                trace!("Unable to evaluate {}: {}", expression, e);
                None
            }
        }
    }

    /// `x + c op k` to `x op k - c` and friends. Overflow or inexact division leaves it alone.
    fn invert_arithmetic(
        &self,
        function: &Function,
        operator: CompareOperator,
        k: &Value,
    ) -> Option<Criteria> {
        let data_type = function.data_type;
        if !data_type.supports_arithmetic_inversion() || function.args.len() != 2 {
            return None;
        }
        let (column, c, constant_first) = match (&function.args[0], &function.args[1]) {
            (x, Expression::Constant(c)) if !x.is_constant() => (x, &c.value, false),
            (Expression::Constant(c), x) if !x.is_constant() => (x, &c.value, true),
            _ => return None,
        };
        if column.data_type() != data_type || c.is_null() {
            return None;
        }
        let k = k.convert(data_type).ok()?;
        let c = c.convert(data_type).ok()?;
        let op = |name: &str, a: &Value, b: &Value| {
            self.evaluate_quietly(&Expression::function(
                name,
                vec![
                    Expression::typed_constant(a.clone(), data_type),
                    Expression::typed_constant(b.clone(), data_type),
                ],
                data_type,
            ))
        };

        let (operator, value) = match (function.name.as_str(), constant_first) {
            ("+", _) => (operator, op("-", &k, &c)?),
            ("-", false) => (operator, op("+", &k, &c)?),
            // c - x op k is x op' c - k
            ("-", true) => (operator.flip(), op("-", &c, &k)?),
            ("*", _) => {
                let sign = c.signum()?;
                if sign == 0 {
                    return None;
                }
                let value = if data_type.is_integral() {
                    let (k, c) = (k.as_i64()?, c.as_i64()?);
                    if k.checked_rem(c)? != 0 {
                        return None;
                    }
                    Value::Long(k.checked_div(c)?).convert(data_type).ok()?
                } else {
                    op("/", &k, &c)?
                };
                (flip_if_negative(operator, sign), value)
            }
            ("/", false) if !data_type.is_integral() => {
                let sign = c.signum()?;
                if sign == 0 {
                    return None;
                }
                (flip_if_negative(operator, sign), op("*", &k, &c)?)
            }
            _ => return None,
        };
        Some(Criteria::compare(
            column.clone(),
            operator,
            Expression::typed_constant(value, data_type),
        ))
    }

    /// `CONVERT(x, T) op c` to `x op c'` when the conversion from x's type loses nothing.
    fn invert_convert(
        &self,
        function: &Function,
        operator: CompareOperator,
        constant: &Value,
        preserve_unknown: bool,
    ) -> Result<Option<Criteria>, RewriterError> {
        let inner = match function.args.first() {
            Some(inner) if function.args.len() == 2 => inner,
            _ => return Ok(None),
        };
        let source = inner.data_type();
        let target = function.data_type;
        let ordered = !matches!(operator, CompareOperator::Eq | CompareOperator::Ne);
        if !is_lossless(source, target) || (ordered && !(source.is_numeric() && target.is_numeric())) {
            return Ok(None);
        }
        let constant = match constant.convert(target) {
            Ok(c) => c,
            Err(_) => return Ok(None),
        };
        match invert_value(&constant, source, target) {
            Ok(Some(value)) => Ok(Some(Criteria::compare(
                inner.clone(),
                operator,
                Expression::typed_constant(value, source),
            ))),
            Ok(None) if !ordered => Ok(self.impossible(inner, operator, preserve_unknown)),
            Ok(None) => Ok(None),
            Err(ConversionError::Unsupported(from, to)) => Err(RewriterError::UnsupportedConversion(
                from,
                to,
                function.to_string(),
            )),
            Err(_) => Ok(None),
        }
    }

    /// `CONVERT(x, T) IN (...)` as `x IN (...)`, candidates that can't match are dropped.
    pub(super) fn invert_set_conversion(
        &self,
        probe: &Expression,
        values: &[Expression],
    ) -> Result<Option<(Expression, Vec<Expression>)>, RewriterError> {
        let function = match probe {
            Expression::Function(f) if f.is_named("CONVERT") && f.args.len() == 2 => f,
            _ => return Ok(None),
        };
        let inner = &function.args[0];
        let source = inner.data_type();
        let target = function.data_type;
        if !is_lossless(source, target) {
            return Ok(None);
        }
        let mut inverted = vec![];
        for value in values {
            let constant = match value.as_constant() {
                Some(c) => c,
                None => return Ok(None),
            };
            if constant.is_null() {
                inverted.push(Expression::null(source));
                continue;
            }
            let converted = match constant.value.convert(target) {
                Ok(v) => v,
                Err(_) => return Ok(None),
            };
            match invert_value(&converted, source, target) {
                Ok(Some(v)) => inverted.push(Expression::typed_constant(v, source)),
                Ok(None) => {}
                Err(_) => return Ok(None),
            }
        }
        Ok(Some((inner.clone(), inverted)))
    }

    /// What a comparison that can never hold for a non null `x` becomes.
    fn impossible(
        &self,
        x: &Expression,
        operator: CompareOperator,
        preserve_unknown: bool,
    ) -> Option<Criteria> {
        let nullable = self.may_be_null(x);
        match operator {
            CompareOperator::Eq if preserve_unknown && nullable => None,
            CompareOperator::Eq => Some(Criteria::False),
            CompareOperator::Ne if !nullable => Some(Criteria::True),
            CompareOperator::Ne if !preserve_unknown => Some(Criteria::is_null(x.clone(), true)),
            _ => None,
        }
    }

    /// `FORMATDATE(x, f) = 'c'` to `x = PARSEDATE('c', f)` and the reverse, as long as the
    /// pattern survives a round trip of a representative value.
    fn invert_format(
        &self,
        function: &Function,
        operator: CompareOperator,
        constant: &Value,
        preserve_unknown: bool,
    ) -> Option<Criteria> {
        if !matches!(operator, CompareOperator::Eq | CompareOperator::Ne) || function.args.len() != 2 {
            return None;
        }
        let name = function.name.to_ascii_uppercase();
        let inverse = inverse_name(&name)?;
        let inner = &function.args[0];
        let pattern = function.args[1].as_constant()?.value.clone();
        if !matches!(pattern, Value::String(_)) {
            return None;
        }
        let formatting = name.starts_with("FORMAT");
        let value_type = if formatting {
            inner.data_type()
        } else {
            function.data_type
        };
        let string_type = if formatting {
            function.data_type
        } else {
            inner.data_type()
        };

        let call = |name: &str, value: Value, data_type: DataType| -> Option<Value> {
            self.evaluate_quietly(&Expression::function(
                name,
                vec![
                    Expression::constant(value),
                    Expression::constant(pattern.clone()),
                ],
                data_type,
            ))
        };
        let (format, parse) = if formatting {
            (name.as_str(), inverse.as_str())
        } else {
            (inverse.as_str(), name.as_str())
        };

        let example = match example_value(value_type) {
            Some(e) => e,
            None => return None,
        };
        let lossless = call(format, example.clone(), string_type)
            .and_then(|text| call(parse, text, value_type))
            .map(|back| back == example)
            .unwrap_or(false);
        if !lossless {
            warn!("Pattern {} of {} doesn't round trip, leaving it in place", pattern, name);
            return None;
        }

        let inverted = if formatting {
            call(parse, constant.clone(), value_type)
                .filter(|v| call(format, v.clone(), string_type).as_ref() == Some(constant))
        } else {
            call(format, constant.clone(), string_type)
                .filter(|s| call(parse, s.clone(), value_type).as_ref() == Some(constant))
        };
        let inner_type = inner.data_type();
        match inverted {
            Some(v) => Some(Criteria::compare(
                inner.clone(),
                operator,
                Expression::typed_constant(v, inner_type),
            )),
            None => self.impossible(inner, operator, preserve_unknown),
        }
    }

    /// `CONCAT(FORMATDATE(d, f1), FORMATTIME(t, f2)) = 'c'` as two equalities when both
    /// patterns always produce the same width.
    fn split_concat(
        &self,
        function: &Function,
        constant: &Value,
        preserve_unknown: bool,
    ) -> Option<Criteria> {
        let (first, second) = match function.args.as_slice() {
            [Expression::Function(a), Expression::Function(b)] => (a, b),
            _ => return None,
        };
        let text = match constant {
            Value::String(s) => s,
            _ => return None,
        };
        let first_width = self.fixed_width(first)?;
        let second_width = self.fixed_width(second)?;
        if text.chars().count() != first_width + second_width {
            let nullable = self.may_be_null(&first.args[0]) || self.may_be_null(&second.args[0]);
            return match (preserve_unknown, nullable) {
                (true, true) => None,
                _ => Some(Criteria::False),
            };
        }
        let head: String = text.chars().take(first_width).collect();
        let tail: String = text.chars().skip(first_width).collect();
        debug!("Split {} = {} at {}", function, constant, first_width);
        Some(Criteria::and(vec![
            Criteria::compare(
                Expression::Function(first.clone()),
                CompareOperator::Eq,
                Expression::constant(Value::String(head)),
            ),
            Criteria::compare(
                Expression::Function(second.clone()),
                CompareOperator::Eq,
                Expression::constant(Value::String(tail)),
            ),
        ]))
    }

    /// Width of a FORMATDATE or FORMATTIME result when it doesn't vary.
    fn fixed_width(&self, function: &Function) -> Option<usize> {
        let name = function.name.to_ascii_uppercase();
        let examples = match name.as_str() {
            "FORMATDATE" => [
                Value::Date(NaiveDate::from_ymd_opt(1973, 1, 2)?),
                Value::Date(NaiveDate::from_ymd_opt(2001, 11, 27)?),
            ],
            "FORMATTIME" => [
                Value::Time(NaiveTime::from_hms_opt(1, 2, 3)?),
                Value::Time(NaiveTime::from_hms_opt(13, 14, 15)?),
            ],
            _ => return None,
        };
        let pattern = match function.args.get(1)?.as_constant()?.value {
            Value::String(ref p) => p.clone(),
            _ => return None,
        };
        let mut widths = examples.iter().map(|example| {
            self.evaluate_quietly(&Expression::function(
                &name,
                vec![
                    Expression::constant(example.clone()),
                    Expression::constant(Value::String(pattern.clone())),
                ],
                DataType::String,
            ))
            .map(|v| v.to_string().chars().count())
        });
        let first = widths.next()??;
        let second = widths.next()??;
        if first == second {
            Some(first)
        } else {
            None
        }
    }
}

/// `TIMESTAMPCREATE(d, t) = ts` as `d = date(ts) AND t = time(ts)`.
fn invert_timestamp_create(function: &Function, constant: &Value) -> Option<Criteria> {
    let ts = match constant {
        Value::Timestamp(ts) => ts,
        _ => return None,
    };
    match function.args.as_slice() {
        [date, time] => Some(Criteria::and(vec![
            Criteria::compare(
                date.clone(),
                CompareOperator::Eq,
                Expression::typed_constant(Value::Date(ts.date()), DataType::Date),
            ),
            Criteria::compare(
                time.clone(),
                CompareOperator::Eq,
                Expression::typed_constant(Value::Time(ts.time()), DataType::Time),
            ),
        ])),
        _ => None,
    }
}

fn flip_if_negative(operator: CompareOperator, sign: i8) -> CompareOperator {
    if sign < 0 {
        operator.flip()
    } else {
        operator
    }
}

/// FORMATX and PARSEX undo each other.
fn inverse_name(name: &str) -> Option<String> {
    let suffix = name
        .strip_prefix("FORMAT")
        .map(|s| ("PARSE", s))
        .or_else(|| name.strip_prefix("PARSE").map(|s| ("FORMAT", s)));
    match suffix {
        Some((prefix, rest))
            if matches!(
                rest,
                "DATE" | "TIME" | "TIMESTAMP" | "INTEGER" | "LONG" | "FLOAT" | "DOUBLE" | "BIGDECIMAL"
            ) =>
        {
            Some(format!("{}{}", prefix, rest))
        }
        _ => None,
    }
}

/// Conversions where going back to the source type gives the original value, for every value.
fn is_lossless(source: DataType, target: DataType) -> bool {
    use DataType::*;
    match (source, target) {
        (s, t) if s == t => false,
        (Short, Integer | Long | Float | Double | BigDecimal) => true,
        (Integer, Long | Double | BigDecimal) => true,
        (Long, BigDecimal) => true,
        (Float, Double) => true,
        (Date, Timestamp) => true,
        (Char, String) => true,
        (Boolean | Short | Integer | Long | BigDecimal | Date | Time | Timestamp, String) => true,
        _ => false,
    }
}

/// The source typed value that converts to `value`, None when there isn't one.
fn invert_value(
    value: &Value,
    source: DataType,
    target: DataType,
) -> Result<Option<Value>, ConversionError> {
    let candidate = match value.convert(source) {
        Ok(v) => v,
        Err(ConversionError::Unsupported(from, to)) => {
            return Err(ConversionError::Unsupported(from, to))
        }
        Err(_) => return Ok(None),
    };
    match candidate.convert(target) {
        Ok(back) if back == *value => Ok(Some(candidate)),
        _ => Ok(None),
    }
}

/// A value exercising every field a pattern for this type could print.
fn example_value(data_type: DataType) -> Option<Value> {
    let date = NaiveDate::from_ymd_opt(1973, 11, 27)?;
    let time = NaiveTime::from_hms_milli_opt(13, 4, 5, 678)?;
    match data_type {
        DataType::Timestamp => Some(Value::Timestamp(NaiveDateTime::new(date, time))),
        DataType::Date => Some(Value::Date(date)),
        DataType::Time => Some(Value::Time(NaiveTime::from_hms_opt(13, 4, 5)?)),
        DataType::Short => Some(Value::Short(1234)),
        DataType::Integer => Some(Value::Integer(1234)),
        DataType::Long => Some(Value::Long(1234)),
        DataType::Float => Some(Value::Float(1234.5)),
        DataType::Double => Some(Value::Double(1234.5)),
        DataType::BigDecimal => Some(Value::BigDecimal(Decimal::new(12345, 1))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::evaluator::ConstantEvaluator;
    use super::super::super::metadata::BasicMetadata;
    use super::*;
    use crate::config::RewriterConfig;
    use crate::constants::Nullable;
    use crate::engine::objects::{Attribute, Table};

    fn metadata() -> BasicMetadata {
        BasicMetadata::new().with_group(Table::new(
            "t",
            vec![
                Attribute::new("a", DataType::Integer, Nullable::Null),
                Attribute::new("b", DataType::Integer, Nullable::NotNull),
                Attribute::new("d", DataType::Double, Nullable::Null),
                Attribute::new("dt", DataType::Date, Nullable::NotNull),
                Attribute::new("tm", DataType::Time, Nullable::NotNull),
            ],
        ))
    }

    fn col(name: &str, data_type: DataType) -> Expression {
        Expression::element(Some("t"), name, data_type)
    }

    fn int(i: i32) -> Expression {
        Expression::constant(Value::Integer(i))
    }

    fn string(s: &str) -> Expression {
        Expression::constant(Value::String(s.to_string()))
    }

    fn rewrite(criteria: Criteria, preserve: bool) -> Result<Criteria, RewriterError> {
        let metadata = metadata();
        let evaluator = ConstantEvaluator::new();
        let config = RewriterConfig::default();
        let rewriter = Rewriter::new(&metadata, &evaluator, &config);
        rewriter.rewrite_criteria(criteria, &ProcedureContext::new(), preserve)
    }

    fn arith(name: &str, left: Expression, right: Expression) -> Expression {
        Expression::function(name, vec![left, right], DataType::Integer)
    }

    #[test]
    fn test_arithmetic() -> Result<(), Box<dyn std::error::Error>> {
        let a = || col("a", DataType::Integer);
        let plus = Criteria::compare(arith("+", a(), int(1)), CompareOperator::Eq, int(5));
        assert_eq!(rewrite(plus, false)?.to_string(), "t.a = 4");

        let minus = Criteria::compare(arith("-", int(10), a()), CompareOperator::Lt, int(4));
        assert_eq!(rewrite(minus, false)?.to_string(), "t.a > 6");

        let times = Criteria::compare(arith("*", a(), int(-2)), CompareOperator::Le, int(8));
        assert_eq!(rewrite(times, false)?.to_string(), "t.a >= -4");

        let inexact = Criteria::compare(arith("*", a(), int(3)), CompareOperator::Eq, int(8));
        assert_eq!(rewrite(inexact, false)?.to_string(), "(t.a * 3) = 8");

        let integer_division = Criteria::compare(arith("/", a(), int(2)), CompareOperator::Eq, int(3));
        assert_eq!(rewrite(integer_division, false)?.to_string(), "(t.a / 2) = 3");

        let d = col("d", DataType::Double);
        let division = Criteria::compare(
            Expression::function(
                "/",
                vec![d, Expression::constant(Value::Double(2.0))],
                DataType::Double,
            ),
            CompareOperator::Gt,
            Expression::constant(Value::Double(3.0)),
        );
        assert_eq!(rewrite(division, false)?.to_string(), "t.d > 6.0");
        Ok(())
    }

    #[test]
    fn test_convert() -> Result<(), Box<dyn std::error::Error>> {
        let a = Expression::convert(col("a", DataType::Integer), DataType::String);
        let eq = Criteria::compare(a.clone(), CompareOperator::Eq, string("12"));
        assert_eq!(rewrite(eq, false)?.to_string(), "t.a = 12");

        let impossible = Criteria::compare(a.clone(), CompareOperator::Eq, string("012"));
        assert_eq!(rewrite(impossible.clone(), false)?, Criteria::False);
        assert_eq!(
            rewrite(impossible, true)?.to_string(),
            "CONVERT(t.a, string) = '012'"
        );

        let ne = Criteria::compare(a, CompareOperator::Ne, string("x"));
        assert_eq!(rewrite(ne, false)?.to_string(), "t.a IS NOT NULL");

        let b = Expression::convert(col("b", DataType::Integer), DataType::String);
        let ne = Criteria::compare(b, CompareOperator::Ne, string("x"));
        assert_eq!(rewrite(ne, true)?, Criteria::True);

        let widened = Expression::convert(col("a", DataType::Integer), DataType::Long);
        let lt = Criteria::compare(
            widened,
            CompareOperator::Lt,
            Expression::constant(Value::Long(7)),
        );
        assert_eq!(rewrite(lt, false)?.to_string(), "t.a < 7");
        Ok(())
    }

    #[test]
    fn test_format() -> Result<(), Box<dyn std::error::Error>> {
        let format = Expression::function(
            "FORMATDATE",
            vec![col("dt", DataType::Date), string("yyyy-MM-dd")],
            DataType::String,
        );
        let eq = Criteria::compare(format.clone(), CompareOperator::Eq, string("2001-02-03"));
        assert_eq!(rewrite(eq, false)?.to_string(), "t.dt = {d'2001-02-03'}");

        let bad = Criteria::compare(format, CompareOperator::Eq, string("2001-2-3"));
        assert_eq!(rewrite(bad, false)?, Criteria::False);

        let lossy = Expression::function(
            "FORMATDATE",
            vec![col("dt", DataType::Date), string("yyyy")],
            DataType::String,
        );
        let eq = Criteria::compare(lossy, CompareOperator::Eq, string("2001"));
        assert_eq!(rewrite(eq, false)?.to_string(), "FORMATDATE(t.dt, 'yyyy') = '2001'");
        Ok(())
    }

    #[test]
    fn test_timestamp_merges() -> Result<(), Box<dyn std::error::Error>> {
        let ts = NaiveDate::from_ymd_opt(2001, 2, 3)
            .and_then(|d| d.and_hms_opt(4, 5, 6))
            .unwrap();
        let create = Expression::function(
            "TIMESTAMPCREATE",
            vec![col("dt", DataType::Date), col("tm", DataType::Time)],
            DataType::Timestamp,
        );
        let eq = Criteria::compare(create, CompareOperator::Eq, Expression::constant(Value::Timestamp(ts)));
        assert_eq!(
            rewrite(eq, false)?.to_string(),
            "t.dt = {d'2001-02-03'} AND t.tm = {t'04:05:06'}"
        );

        let concat = Expression::function(
            "CONCAT",
            vec![
                Expression::function(
                    "FORMATDATE",
                    vec![col("dt", DataType::Date), string("yyyy-MM-dd")],
                    DataType::String,
                ),
                Expression::function(
                    "FORMATTIME",
                    vec![col("tm", DataType::Time), string("HH:mm")],
                    DataType::String,
                ),
            ],
            DataType::String,
        );
        let eq = Criteria::compare(concat.clone(), CompareOperator::Eq, string("2001-02-0304:05"));
        assert_eq!(
            rewrite(eq, false)?.to_string(),
            "t.dt = {d'2001-02-03'} AND FORMATTIME(t.tm, 'HH:mm') = '04:05'"
        );

        let short = Criteria::compare(concat, CompareOperator::Eq, string("2001"));
        assert_eq!(rewrite(short, false)?, Criteria::False);
        Ok(())
    }

    #[test]
    fn test_inverse_name() {
        assert_eq!(inverse_name("FORMATDATE").as_deref(), Some("PARSEDATE"));
        assert_eq!(inverse_name("PARSEBIGDECIMAL").as_deref(), Some("FORMATBIGDECIMAL"));
        assert_eq!(inverse_name("FORMAT"), None);
        assert!(is_lossless(DataType::Integer, DataType::String));
        assert!(!is_lossless(DataType::Double, DataType::String));
        assert!(!is_lossless(DataType::Long, DataType::Double));
    }
}
