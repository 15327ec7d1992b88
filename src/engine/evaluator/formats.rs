//! Java style format patterns used by the PARSE and FORMAT functions.
//! Temporal patterns (`yyyy-MM-dd HH:mm:ss.SSS`) are translated to chrono strftime
//! strings, numeric patterns (`#,##0.00`) are handled directly on decimals.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nom::{
    branch::alt,
    bytes::complete::{is_a, is_not, take_while},
    character::complete::{anychar, char, satisfy},
    combinator::{all_consuming, map, opt},
    error::VerboseError,
    multi::many0,
    sequence::delimited,
    Finish, IResult,
};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;
use std::str::FromStr;

use super::EvaluationError;

#[derive(Clone, Debug, PartialEq)]
enum PatternToken {
    /// A run of one pattern letter, e.g. `yyyy` is ('y', 4)
    Field(char, usize),
    Literal(String),
}

type PatternResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn field(input: &str) -> PatternResult<'_, PatternToken> {
    let (rest, first) = satisfy(|c: char| c.is_ascii_alphabetic())(input)?;
    let (rest, more) = take_while(|c: char| c == first)(rest)?;
    Ok((rest, PatternToken::Field(first, 1 + more.chars().count())))
}

fn quoted(input: &str) -> PatternResult<'_, PatternToken> {
    map(
        delimited(char('\''), opt(is_not("'")), char('\'')),
        |s: Option<&str>| match s {
            // '' is an escaped quote
            None => PatternToken::Literal("'".to_string()),
            Some(s) => PatternToken::Literal(s.to_string()),
        },
    )(input)
}

fn literal(input: &str) -> PatternResult<'_, PatternToken> {
    map(anychar, |c| PatternToken::Literal(c.to_string()))(input)
}

fn tokenize(pattern: &str) -> Result<Vec<PatternToken>, EvaluationError> {
    all_consuming(many0(alt((quoted, field, literal))))(pattern)
        .finish()
        .map(|(_, tokens)| tokens)
        .map_err(|_| EvaluationError::BadFormat(pattern.to_string()))
}

fn to_strftime(pattern: &str) -> Result<String, EvaluationError> {
    let mut out = String::new();
    for token in tokenize(pattern)? {
        match token {
            PatternToken::Literal(s) => out.push_str(&s.replace('%', "%%")),
            PatternToken::Field(c, n) => {
                let strftime = match (c, n) {
                    ('y', 2) => "%y",
                    ('y', _) => "%Y",
                    ('M', 1) => "%-m",
                    ('M', 2) => "%m",
                    ('M', 3) => "%b",
                    ('M', _) => "%B",
                    ('d', 1) => "%-d",
                    ('d', _) => "%d",
                    ('H', 1) => "%-H",
                    ('H', _) => "%H",
                    ('h', 1) => "%-I",
                    ('h', _) => "%I",
                    ('m', 1) => "%-M",
                    ('m', _) => "%M",
                    ('s', 1) => "%-S",
                    ('s', _) => "%S",
                    ('S', 3) => "%3f",
                    ('S', 6) => "%6f",
                    ('S', 9) => "%9f",
                    ('a', _) => "%p",
                    ('E', 1..=3) => "%a",
                    ('E', _) => "%A",
                    ('D', _) => "%j",
                    _ => return Err(EvaluationError::BadFormat(pattern.to_string())),
                };
                out.push_str(strftime);
            }
        }
    }
    Ok(out)
}

pub fn format_timestamp(value: &NaiveDateTime, pattern: &str) -> Result<String, EvaluationError> {
    let strftime = to_strftime(pattern)?;
    let mut out = String::new();
    write!(out, "{}", value.format(&strftime))
        .map_err(|_| EvaluationError::BadFormat(pattern.to_string()))?;
    Ok(out)
}

pub fn format_date(value: &NaiveDate, pattern: &str) -> Result<String, EvaluationError> {
    let strftime = to_strftime(pattern)?;
    let mut out = String::new();
    write!(out, "{}", value.format(&strftime))
        .map_err(|_| EvaluationError::BadFormat(pattern.to_string()))?;
    Ok(out)
}

pub fn format_time(value: &NaiveTime, pattern: &str) -> Result<String, EvaluationError> {
    let strftime = to_strftime(pattern)?;
    let mut out = String::new();
    write!(out, "{}", value.format(&strftime))
        .map_err(|_| EvaluationError::BadFormat(pattern.to_string()))?;
    Ok(out)
}

/// Parses with whatever fields the pattern has, missing date fields default to the epoch
/// and missing time fields to midnight.
pub fn parse_timestamp(value: &str, pattern: &str) -> Result<NaiveDateTime, EvaluationError> {
    let strftime = to_strftime(pattern)?;
    let failure = || EvaluationError::ParseFailure(value.to_string(), pattern.to_string());
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, &strftime) {
        return Ok(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, &strftime) {
        return date.and_hms_opt(0, 0, 0).ok_or_else(failure);
    }
    let time = NaiveTime::parse_from_str(value, &strftime).map_err(|_| failure())?;
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .map(|epoch| NaiveDateTime::new(epoch, time))
        .ok_or_else(failure)
}

#[derive(Clone, Debug, PartialEq)]
struct NumberPattern {
    prefix: String,
    suffix: String,
    min_integer: usize,
    grouping: Option<usize>,
    min_fraction: usize,
    max_fraction: usize,
}

fn split_number_pattern(input: &str) -> PatternResult<'_, (&str, &str, &str)> {
    let (input, prefix) = take_while(|c: char| !"#0,.".contains(c))(input)?;
    let (input, body) = is_a("#0,.")(input)?;
    let (input, suffix) = all_consuming(take_while(|c: char| !"#0,.".contains(c)))(input)?;
    Ok((input, (prefix, body, suffix)))
}

fn number_pattern(pattern: &str) -> Result<NumberPattern, EvaluationError> {
    let (_, (prefix, body, suffix)) = split_number_pattern(pattern)
        .finish()
        .map_err(|_| EvaluationError::BadFormat(pattern.to_string()))?;

    let (integer, fraction) = match body.find('.') {
        Some(i) => (&body[..i], &body[i + 1..]),
        None => (body, ""),
    };
    if fraction.contains('.') || fraction.contains(',') {
        return Err(EvaluationError::BadFormat(pattern.to_string()));
    }
    let grouping = integer
        .rfind(',')
        .map(|i| integer[i + 1..].len())
        .filter(|g| *g > 0);
    Ok(NumberPattern {
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
        min_integer: integer.chars().filter(|c| *c == '0').count(),
        grouping,
        min_fraction: fraction.chars().filter(|c| *c == '0').count(),
        max_fraction: fraction.len(),
    })
}

pub fn format_number(value: Decimal, pattern: &str) -> Result<String, EvaluationError> {
    let p = number_pattern(pattern)?;
    let rounded = value.round_dp_with_strategy(
        p.max_fraction as u32,
        RoundingStrategy::MidpointNearestEven,
    );
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int_digits, frac_digits) = match text.find('.') {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => (text.as_str(), ""),
    };

    let mut integer = int_digits.trim_start_matches('0').to_string();
    while integer.len() < p.min_integer {
        integer.insert(0, '0');
    }
    if let Some(size) = p.grouping {
        let digits: Vec<char> = integer.chars().collect();
        let mut grouped = String::new();
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % size == 0 {
                grouped.push(',');
            }
            grouped.push(*c);
        }
        integer = grouped;
    }

    let mut fraction = frac_digits.trim_end_matches('0').to_string();
    while fraction.len() < p.min_fraction {
        fraction.push('0');
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&p.prefix);
    out.push_str(&integer);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(&fraction);
    }
    if integer.is_empty() && fraction.is_empty() {
        out.push('0');
    }
    out.push_str(&p.suffix);
    Ok(out)
}

pub fn parse_number(value: &str, pattern: &str) -> Result<Decimal, EvaluationError> {
    let p = number_pattern(pattern)?;
    let failure = || EvaluationError::ParseFailure(value.to_string(), pattern.to_string());
    let trimmed = value.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let body = unsigned
        .strip_prefix(p.prefix.as_str())
        .and_then(|s| s.strip_suffix(p.suffix.as_str()))
        .ok_or_else(failure)?;
    let digits: String = body.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(failure());
    }
    let parsed = Decimal::from_str(&digits).map_err(|_| failure())?;
    Ok(if negative { -parsed } else { parsed })
}
