use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

use super::DataType;

/// A runtime value carried by a constant. Values compare by value, never by identity.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigDecimal(Decimal),
    String(String),
    Char(char),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Object(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::Short(_) => DataType::Short,
            Value::Integer(_) => DataType::Integer,
            Value::Long(_) => DataType::Long,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::BigDecimal(_) => DataType::BigDecimal,
            Value::String(_) => DataType::String,
            Value::Char(_) => DataType::Char,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Object(_) => DataType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Short(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::BigDecimal(d) if d.fract().is_zero() => d.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Short(v) => Some(f64::from(*v)),
            Value::Integer(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::BigDecimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Short(v) => Some(Decimal::from(*v)),
            Value::Integer(v) => Some(Decimal::from(*v)),
            Value::Long(v) => Some(Decimal::from(*v)),
            Value::Float(v) => Decimal::from_f32(*v),
            Value::Double(v) => Decimal::from_f64(*v),
            Value::BigDecimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Sign of a numeric value, None for anything that is not a number
    pub fn signum(&self) -> Option<i8> {
        let sign = |o: Option<Ordering>| match o {
            Some(Ordering::Less) => Some(-1),
            Some(Ordering::Equal) => Some(0),
            Some(Ordering::Greater) => Some(1),
            None => None,
        };
        match self {
            Value::Short(v) => sign(v.partial_cmp(&0)),
            Value::Integer(v) => sign(v.partial_cmp(&0)),
            Value::Long(v) => sign(v.partial_cmp(&0)),
            Value::Float(v) => sign(v.partial_cmp(&0.0)),
            Value::Double(v) => sign(v.partial_cmp(&0.0)),
            Value::BigDecimal(d) => sign(d.partial_cmp(&Decimal::ZERO)),
            _ => None,
        }
    }

    /// SQL ordering between two non-null values. Numbers of different types compare
    /// by magnitude, everything else must share a type.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
            (Value::String(a), Value::Char(b)) => a.as_str().partial_cmp(b.to_string().as_str()),
            (Value::Char(a), Value::String(b)) => a.to_string().as_str().partial_cmp(b.as_str()),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::Object(a), Value::Object(b)) => a.partial_cmp(b),
            (a, b) if a.data_type().is_numeric() && b.data_type().is_numeric() => {
                match (a.as_i64(), b.as_i64()) {
                    (Some(x), Some(y)) if a.data_type().is_integral() && b.data_type().is_integral() => {
                        x.partial_cmp(&y)
                    }
                    _ => match (a.as_decimal(), b.as_decimal()) {
                        (Some(x), Some(y)) => x.partial_cmp(&y),
                        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
                    },
                }
            }
            (_, _) => None,
        }
    }
}

fn format_floating(f: &mut Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    let nanos = ts.nanosecond() % 1_000_000_000;
    let base = ts.format("%Y-%m-%d %H:%M:%S").to_string();
    if nanos == 0 {
        return format!("{}.0", base);
    }
    let fraction = format!("{:09}", nanos);
    format!("{}.{}", base, fraction.trim_end_matches('0'))
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(ref value) => write!(f, "{}", value),
            Value::Short(ref value) => write!(f, "{}", value),
            Value::Integer(ref value) => write!(f, "{}", value),
            Value::Long(ref value) => write!(f, "{}", value),
            Value::Float(ref value) => format_floating(f, f64::from(*value)),
            Value::Double(ref value) => format_floating(f, *value),
            Value::BigDecimal(ref value) => write!(f, "{}", value),
            Value::String(ref value) => write!(f, "{}", value),
            Value::Char(ref value) => write!(f, "{}", value),
            Value::Date(ref value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::Time(ref value) => write!(f, "{}", value.format("%H:%M:%S")),
            Value::Timestamp(ref value) => write!(f, "{}", format_timestamp(value)),
            Value::Object(ref value) => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_type_numeric_compare() {
        assert_eq!(
            Value::Integer(5).compare(&Value::Long(5)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Integer(5).compare(&Value::Double(5.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Integer(5).compare(&Value::Null), None);
        assert_eq!(
            Value::String("5".to_string()).compare(&Value::Integer(5)),
            None
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Double(1.0).to_string(), "1.0");
        assert_eq!(Value::Double(1.25).to_string(), "1.25");
        let ts = NaiveDate::from_ymd_opt(2001, 2, 3)
            .and_then(|d| d.and_hms_milli_opt(4, 5, 6, 789))
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2001-02-03 04:05:06.789");
        let ts = NaiveDate::from_ymd_opt(2001, 2, 3)
            .and_then(|d| d.and_hms_opt(4, 5, 6))
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2001-02-03 04:05:06.0");
    }

    #[test]
    fn test_signum() {
        assert_eq!(Value::Integer(-3).signum(), Some(-1));
        assert_eq!(Value::Double(0.0).signum(), Some(0));
        assert_eq!(Value::BigDecimal(Decimal::new(15, 1)).signum(), Some(1));
        assert_eq!(Value::String("1".to_string()).signum(), None);
    }
}
