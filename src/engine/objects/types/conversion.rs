//! The runtime conversion matrix between value types.
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::convert::TryFrom;
use std::str::FromStr;
use thiserror::Error;

use super::parse_type::{parse_date_literal, parse_time_literal, parse_timestamp_literal};
use super::{DataType, Value};

impl Value {
    /// Converts this value to the target type, failing if the value has no representation there.
    pub fn convert(&self, target: DataType) -> Result<Value, ConversionError> {
        let source = self.data_type();
        if source == target || self.is_null() {
            return Ok(self.clone());
        }

        match target {
            DataType::Null => Err(ConversionError::Unsupported(source, target)),
            DataType::Object => Ok(Value::Object(self.to_string())),
            DataType::String => match self {
                Value::Object(_) => Err(ConversionError::Unsupported(source, target)),
                v => Ok(Value::String(v.to_string())),
            },
            DataType::Char => match self {
                Value::String(s) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(Value::Char(c)),
                        _ => Err(ConversionError::InvalidValue(s.clone(), target)),
                    }
                }
                _ => Err(ConversionError::Unsupported(source, target)),
            },
            DataType::Boolean => self.to_boolean(),
            DataType::Short
            | DataType::Integer
            | DataType::Long
            | DataType::Float
            | DataType::Double
            | DataType::BigDecimal => self.to_numeric(target),
            DataType::Date => match self {
                Value::String(s) => Ok(Value::Date(parse_date_literal(s)?)),
                Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
                _ => Err(ConversionError::Unsupported(source, target)),
            },
            DataType::Time => match self {
                Value::String(s) => Ok(Value::Time(parse_time_literal(s)?)),
                Value::Timestamp(ts) => Ok(Value::Time(ts.time())),
                _ => Err(ConversionError::Unsupported(source, target)),
            },
            DataType::Timestamp => match self {
                Value::String(s) => Ok(Value::Timestamp(parse_timestamp_literal(s)?)),
                Value::Date(d) => d
                    .and_hms_opt(0, 0, 0)
                    .map(Value::Timestamp)
                    .ok_or(ConversionError::Unsupported(source, target)),
                Value::Time(t) => match NaiveDate::from_ymd_opt(1970, 1, 1) {
                    Some(epoch) => Ok(Value::Timestamp(NaiveDateTime::new(epoch, *t))),
                    None => Err(ConversionError::Unsupported(source, target)),
                },
                _ => Err(ConversionError::Unsupported(source, target)),
            },
        }
    }

    fn to_boolean(&self) -> Result<Value, ConversionError> {
        match self {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(ConversionError::InvalidValue(s.clone(), DataType::Boolean)),
            },
            Value::Char(c) => match c {
                '1' | 't' | 'T' => Ok(Value::Boolean(true)),
                '0' | 'f' | 'F' => Ok(Value::Boolean(false)),
                _ => Err(ConversionError::InvalidValue(c.to_string(), DataType::Boolean)),
            },
            v if v.data_type().is_numeric() => match v.signum() {
                Some(0) => Ok(Value::Boolean(false)),
                Some(_) => Ok(Value::Boolean(true)),
                None => Err(ConversionError::InvalidValue(v.to_string(), DataType::Boolean)),
            },
            v => Err(ConversionError::Unsupported(v.data_type(), DataType::Boolean)),
        }
    }

    fn to_numeric(&self, target: DataType) -> Result<Value, ConversionError> {
        let source = self.data_type();
        let decimal = match self {
            Value::String(s) => parse_decimal(s, target)?,
            Value::Char(c) => parse_decimal(&c.to_string(), target)?,
            Value::Boolean(b) => Decimal::from(u8::from(*b)),
            Value::Float(f) => return from_floating(f64::from(*f), target),
            Value::Double(d) => return from_floating(*d, target),
            v if source.is_numeric() => v
                .as_decimal()
                .ok_or_else(|| ConversionError::InvalidValue(v.to_string(), target))?,
            _ => return Err(ConversionError::Unsupported(source, target)),
        };
        from_decimal(decimal, target)
    }
}

fn parse_decimal(s: &str, target: DataType) -> Result<Decimal, ConversionError> {
    let trimmed = s.trim();
    if let Ok(d) = Decimal::from_str(trimmed) {
        return Ok(d);
    }
    // scientific notation and the like only fit the floating types
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => {
            Decimal::from_f64(f).ok_or_else(|| ConversionError::InvalidValue(s.to_string(), target))
        }
        _ => Err(ConversionError::InvalidValue(s.to_string(), target)),
    }
}

fn from_floating(value: f64, target: DataType) -> Result<Value, ConversionError> {
    if !value.is_finite() {
        return match target {
            DataType::Double => Ok(Value::Double(value)),
            DataType::Float => Ok(Value::Float(value as f32)),
            _ => Err(ConversionError::OutOfRange(value.to_string(), target)),
        };
    }
    match target {
        DataType::Double => Ok(Value::Double(value)),
        DataType::Float => Ok(Value::Float(value as f32)),
        _ => {
            let decimal = Decimal::from_f64(value)
                .ok_or_else(|| ConversionError::OutOfRange(value.to_string(), target))?;
            from_decimal(decimal, target)
        }
    }
}

fn from_decimal(value: Decimal, target: DataType) -> Result<Value, ConversionError> {
    let out_of_range = || ConversionError::OutOfRange(value.to_string(), target);
    match target {
        DataType::BigDecimal => Ok(Value::BigDecimal(value)),
        DataType::Double => value.to_f64().map(Value::Double).ok_or_else(out_of_range),
        DataType::Float => value.to_f32().map(Value::Float).ok_or_else(out_of_range),
        DataType::Long => value.trunc().to_i64().map(Value::Long).ok_or_else(out_of_range),
        DataType::Integer => {
            let wide = value.trunc().to_i64().ok_or_else(out_of_range)?;
            i32::try_from(wide)
                .map(Value::Integer)
                .map_err(|_| out_of_range())
        }
        DataType::Short => {
            let wide = value.trunc().to_i64().ok_or_else(out_of_range)?;
            i16::try_from(wide).map(Value::Short).map_err(|_| out_of_range())
        }
        _ => Err(ConversionError::Unsupported(DataType::BigDecimal, target)),
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Invalid type {0}")]
    InvalidType(String),
    #[error("No conversion exists from {0} to {1}")]
    Unsupported(DataType, DataType),
    #[error("Value {0} can't be represented as {1}")]
    InvalidValue(String, DataType),
    #[error("Value {0} is out of range for {1}")]
    OutOfRange(String, DataType),
}
