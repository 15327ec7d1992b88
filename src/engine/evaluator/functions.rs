//! Deterministic implementations of the system functions, invoked on constant arguments.
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::convert::TryFrom;

use super::formats;
use super::EvaluationError;
use crate::engine::objects::types::{DataType, Value};

/// Calls `name`, which must already be canonical, with evaluated arguments.
pub fn invoke(name: &str, args: &[Value], return_type: DataType) -> Result<Value, EvaluationError> {
    let name = name.to_ascii_uppercase();

    // these decide for themselves what a null argument means
    match name.as_str() {
        "IFNULL" | "NVL" | "COALESCE" => {
            return Ok(args
                .iter()
                .find(|a| !a.is_null())
                .cloned()
                .unwrap_or(Value::Null));
        }
        "NULLIF" => {
            let (a, b) = two(&name, args)?;
            return match a.compare(b) {
                Some(std::cmp::Ordering::Equal) => Ok(Value::Null),
                _ => Ok(a.clone()),
            };
        }
        "CONCAT2" => {
            if args.iter().all(|a| a.is_null()) {
                return Ok(Value::Null);
            }
            return Ok(Value::String(
                args.iter()
                    .filter(|a| !a.is_null())
                    .map(|a| a.to_string())
                    .collect(),
            ));
        }
        _ => {}
    }

    if args.iter().any(|a| a.is_null()) {
        return Ok(Value::Null);
    }

    match name.as_str() {
        "+" | "-" | "*" | "/" => {
            let (a, b) = two(&name, args)?;
            arithmetic(&name, a, b, return_type)
        }
        "ABS" => {
            let a = one(&name, args)?;
            match a {
                Value::Short(v) => v.checked_abs().map(Value::Short).ok_or(EvaluationError::Overflow(name)),
                Value::Integer(v) => v.checked_abs().map(Value::Integer).ok_or(EvaluationError::Overflow(name)),
                Value::Long(v) => v.checked_abs().map(Value::Long).ok_or(EvaluationError::Overflow(name)),
                Value::Float(v) => Ok(Value::Float(v.abs())),
                Value::Double(v) => Ok(Value::Double(v.abs())),
                Value::BigDecimal(v) => Ok(Value::BigDecimal(v.abs())),
                v => Err(invalid(&name, &format!("{} is not numeric", v))),
            }
        }
        "CONCAT" => Ok(Value::String(args.iter().map(|a| a.to_string()).collect())),
        "LCASE" => Ok(Value::String(string_arg(&name, args, 0)?.to_lowercase())),
        "UCASE" => Ok(Value::String(string_arg(&name, args, 0)?.to_uppercase())),
        "LENGTH" => {
            let len = string_arg(&name, args, 0)?.chars().count();
            i32::try_from(len)
                .map(Value::Integer)
                .map_err(|_| EvaluationError::Overflow(name))
        }
        "LTRIM" => Ok(Value::String(string_arg(&name, args, 0)?.trim_start_matches(' ').to_string())),
        "RTRIM" => Ok(Value::String(string_arg(&name, args, 0)?.trim_end_matches(' ').to_string())),
        "TRIM" => Ok(Value::String(string_arg(&name, args, 0)?.trim_matches(' ').to_string())),
        "REPEAT" => {
            let s = string_arg(&name, args, 0)?;
            let count = int_arg(&name, args, 1)?;
            repeat(&name, &s, count)
        }
        "SPACE" => {
            let count = int_arg(&name, args, 0)?;
            repeat(&name, " ", count)
        }
        "SUBSTRING" => substring(&name, args),
        "CHAR" => {
            let code = int_arg(&name, args, 0)?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(|| invalid(&name, &format!("{} is not a character code", code)))
        }
        "CONVERT" | "CAST" => {
            let target: DataType = string_arg(&name, args, 1)?.parse()?;
            Ok(args[0].convert(target)?)
        }
        "PARSEDATE" | "PARSETIME" | "PARSETIMESTAMP" => {
            let ts = formats::parse_timestamp(&string_arg(&name, args, 0)?, &string_arg(&name, args, 1)?)?;
            Ok(Value::Timestamp(ts).convert(return_type)?)
        }
        "FORMATDATE" | "FORMATTIME" | "FORMATTIMESTAMP" => {
            let pattern = string_arg(&name, args, 1)?;
            let text = match &args[0] {
                Value::Date(d) => formats::format_date(d, &pattern)?,
                Value::Time(t) => formats::format_time(t, &pattern)?,
                Value::Timestamp(ts) => formats::format_timestamp(ts, &pattern)?,
                v => return Err(invalid(&name, &format!("{} is not temporal", v))),
            };
            Ok(Value::String(text))
        }
        "PARSEINTEGER" | "PARSELONG" | "PARSEFLOAT" | "PARSEDOUBLE" | "PARSEBIGDECIMAL" => {
            let number = formats::parse_number(&string_arg(&name, args, 0)?, &string_arg(&name, args, 1)?)?;
            Ok(Value::BigDecimal(number).convert(return_type)?)
        }
        "FORMATINTEGER" | "FORMATLONG" | "FORMATFLOAT" | "FORMATDOUBLE" | "FORMATBIGDECIMAL" => {
            let pattern = string_arg(&name, args, 1)?;
            let number = args[0]
                .as_decimal()
                .ok_or_else(|| invalid(&name, &format!("{} is not numeric", args[0])))?;
            Ok(Value::String(formats::format_number(number, &pattern)?))
        }
        "TIMESTAMPADD" => timestamp_add(&name, args),
        "TIMESTAMPCREATE" => match two(&name, args)? {
            (Value::Date(d), Value::Time(t)) => Ok(Value::Timestamp(NaiveDateTime::new(*d, *t))),
            (a, b) => Err(invalid(&name, &format!("expected a date and a time, got {} and {}", a, b))),
        },
        "FROM_UNIXTIME" => {
            let seconds = int_arg(&name, args, 0)?;
            let ts = Duration::try_seconds(seconds)
                .and_then(|d| epoch().ok()?.checked_add_signed(d))
                .ok_or(EvaluationError::Overflow(name))?;
            Ok(Value::Timestamp(ts))
        }
        _ => Err(EvaluationError::UnknownFunction(name)),
    }
}

fn invalid(name: &str, message: &str) -> EvaluationError {
    EvaluationError::InvalidArgument(name.to_string(), message.to_string())
}

fn one<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, EvaluationError> {
    match args {
        [a] => Ok(a),
        _ => Err(invalid(name, "expected one argument")),
    }
}

fn two<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), EvaluationError> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(invalid(name, "expected two arguments")),
    }
}

fn string_arg(name: &str, args: &[Value], index: usize) -> Result<String, EvaluationError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Char(c)) => Ok(c.to_string()),
        Some(v) => Err(invalid(name, &format!("{} is not a string", v))),
        None => Err(invalid(name, "missing argument")),
    }
}

fn int_arg(name: &str, args: &[Value], index: usize) -> Result<i64, EvaluationError> {
    args.get(index)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| invalid(name, "expected an integer argument"))
}

pub(crate) fn epoch() -> Result<NaiveDateTime, EvaluationError> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| invalid("FROM_UNIXTIME", "no epoch"))
}

fn arithmetic(name: &str, a: &Value, b: &Value, return_type: DataType) -> Result<Value, EvaluationError> {
    let overflow = || EvaluationError::Overflow(name.to_string());
    let a = a.convert(return_type)?;
    let b = b.convert(return_type)?;
    match (a, b) {
        (Value::Short(x), Value::Short(y)) => {
            let r = match name {
                "+" => x.checked_add(y),
                "-" => x.checked_sub(y),
                "*" => x.checked_mul(y),
                _ if y == 0 => return Err(EvaluationError::DivideByZero),
                _ => x.checked_div(y),
            };
            r.map(Value::Short).ok_or_else(overflow)
        }
        (Value::Integer(x), Value::Integer(y)) => {
            let r = match name {
                "+" => x.checked_add(y),
                "-" => x.checked_sub(y),
                "*" => x.checked_mul(y),
                _ if y == 0 => return Err(EvaluationError::DivideByZero),
                _ => x.checked_div(y),
            };
            r.map(Value::Integer).ok_or_else(overflow)
        }
        (Value::Long(x), Value::Long(y)) => {
            let r = match name {
                "+" => x.checked_add(y),
                "-" => x.checked_sub(y),
                "*" => x.checked_mul(y),
                _ if y == 0 => return Err(EvaluationError::DivideByZero),
                _ => x.checked_div(y),
            };
            r.map(Value::Long).ok_or_else(overflow)
        }
        (Value::Float(x), Value::Float(y)) => {
            let r = floating(name, f64::from(x), f64::from(y))?;
            Ok(Value::Float(r as f32))
        }
        (Value::Double(x), Value::Double(y)) => Ok(Value::Double(floating(name, x, y)?)),
        (Value::BigDecimal(x), Value::BigDecimal(y)) => {
            let r = match name {
                "+" => x.checked_add(y),
                "-" => x.checked_sub(y),
                "*" => x.checked_mul(y),
                _ if y.is_zero() => return Err(EvaluationError::DivideByZero),
                _ => x.checked_div(y),
            };
            r.map(Value::BigDecimal).ok_or_else(overflow)
        }
        (a, b) => Err(invalid(
            name,
            &format!("can't apply {} to {} and {}", name, a.data_type(), b.data_type()),
        )),
    }
}

fn floating(name: &str, x: f64, y: f64) -> Result<f64, EvaluationError> {
    match name {
        "+" => Ok(x + y),
        "-" => Ok(x - y),
        "*" => Ok(x * y),
        _ if y == 0.0 => Err(EvaluationError::DivideByZero),
        _ => Ok(x / y),
    }
}

/// Longest string a fold may build.
const MAX_STRING_LENGTH: usize = 1 << 24;

/// A non positive count gives the empty string.
fn repeat(name: &str, s: &str, count: i64) -> Result<Value, EvaluationError> {
    let count = usize::try_from(count).unwrap_or(0);
    match s.len().checked_mul(count) {
        Some(total) if total <= MAX_STRING_LENGTH => Ok(Value::String(s.repeat(count))),
        _ => Err(EvaluationError::Overflow(name.to_string())),
    }
}

/// SUBSTRING(string, start [, length]), 1 based. A negative start counts from the end.
fn substring(name: &str, args: &[Value]) -> Result<Value, EvaluationError> {
    let chars: Vec<char> = string_arg(name, args, 0)?.chars().collect();
    let len = chars.len() as i64;
    let start = int_arg(name, args, 1)?;
    let begin = match start {
        s if s < 0 => len + s,
        0 => 0,
        s => s - 1,
    };
    if begin < 0 || begin >= len {
        return Ok(Value::String(String::new()));
    }
    let count = match args.get(2) {
        Some(_) => int_arg(name, args, 2)?,
        None => len - begin,
    };
    if count < 0 {
        return Ok(Value::Null);
    }
    let end = begin.saturating_add(count).min(len);
    Ok(Value::String(chars[begin as usize..end as usize].iter().collect()))
}

fn timestamp_add(name: &str, args: &[Value]) -> Result<Value, EvaluationError> {
    let interval = string_arg(name, args, 0)?.to_ascii_uppercase();
    let interval = interval.trim_start_matches("SQL_TSI_");
    let count = int_arg(name, args, 1)?;
    let overflow = || EvaluationError::Overflow(name.to_string());

    let (base, result_type) = match args.get(2) {
        Some(Value::Timestamp(ts)) => (*ts, DataType::Timestamp),
        Some(Value::Date(d)) => (d.and_hms_opt(0, 0, 0).ok_or_else(overflow)?, DataType::Date),
        Some(Value::Time(t)) => (NaiveDateTime::new(epoch()?.date(), *t), DataType::Time),
        _ => return Err(invalid(name, "expected a temporal argument")),
    };

    let add_months = |months: i64| -> Result<NaiveDateTime, EvaluationError> {
        let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| overflow())?;
        let shifted = if months < 0 {
            base.checked_sub_months(Months::new(magnitude))
        } else {
            base.checked_add_months(Months::new(magnitude))
        };
        shifted.ok_or_else(overflow)
    };
    let add = |d: Option<Duration>| d.and_then(|d| base.checked_add_signed(d)).ok_or_else(overflow);

    let shifted = match interval {
        "FRAC_SECOND" => add(Some(Duration::nanoseconds(count)))?,
        "SECOND" => add(Duration::try_seconds(count))?,
        "MINUTE" => add(Duration::try_minutes(count))?,
        "HOUR" => add(Duration::try_hours(count))?,
        "DAY" => add(Duration::try_days(count))?,
        "WEEK" => add(Duration::try_weeks(count))?,
        "MONTH" => add_months(count)?,
        "QUARTER" => add_months(count.checked_mul(3).ok_or_else(overflow)?)?,
        "YEAR" => add_months(count.checked_mul(12).ok_or_else(overflow)?)?,
        other => return Err(invalid(name, &format!("unknown interval {}", other))),
    };
    Ok(Value::Timestamp(shifted).convert(result_type)?)
}
