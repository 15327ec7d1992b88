//! Literal parsers for the string forms of temporal values, used when converting strings.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, space1},
    combinator::{all_consuming, map_res, opt},
    error::{make_error, ContextError, ErrorKind, FromExternalError, ParseError, VerboseError},
    sequence::{preceded, tuple},
    Finish, IResult,
};
use std::num::ParseIntError;

use super::{ConversionError, DataType};

fn number<'a, E>(min: usize, max: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32, E>
where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    map_res(
        take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u32>(),
    )
}

pub fn parse_date<'a, E>(input: &'a str) -> IResult<&'a str, NaiveDate, E>
where
    E: ParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    let (input, (year, _, month, _, day)) = tuple((
        number(4, 4),
        char('-'),
        number(1, 2),
        char('-'),
        number(1, 2),
    ))(input)?;

    match NaiveDate::from_ymd_opt(year as i32, month, day) {
        Some(date) => Ok((input, date)),
        None => Err(nom::Err::Failure(make_error(input, ErrorKind::Verify))),
    }
}

pub fn parse_time<'a, E>(input: &'a str) -> IResult<&'a str, NaiveTime, E>
where
    E: ParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    let (input, (hour, _, minute, _, second)) = tuple((
        number(1, 2),
        char(':'),
        number(2, 2),
        char(':'),
        number(2, 2),
    ))(input)?;

    match NaiveTime::from_hms_opt(hour, minute, second) {
        Some(time) => Ok((input, time)),
        None => Err(nom::Err::Failure(make_error(input, ErrorKind::Verify))),
    }
}

/// Fractional seconds, 1 to 9 digits, as nanoseconds
fn parse_nanos<'a, E>(input: &'a str) -> IResult<&'a str, u32, E>
where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    let (input, digits) = preceded(
        char('.'),
        take_while_m_n(1, 9, |c: char| c.is_ascii_digit()),
    )(input)?;
    let padded = format!("{:0<9}", digits);
    match padded.parse::<u32>() {
        Ok(n) => Ok((input, n)),
        Err(e) => Err(nom::Err::Failure(E::from_external_error(
            input,
            ErrorKind::Digit,
            e,
        ))),
    }
}

pub fn parse_timestamp<'a, E>(input: &'a str) -> IResult<&'a str, NaiveDateTime, E>
where
    E: ParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    let (input, (date, _, time, nanos)) =
        tuple((parse_date, space1, parse_time, opt(parse_nanos)))(input)?;

    let time = match nanos {
        Some(n) => time.with_nanosecond(n),
        None => Some(time),
    };
    match time {
        Some(t) => Ok((input, NaiveDateTime::new(date, t))),
        None => Err(nom::Err::Failure(make_error(input, ErrorKind::Verify))),
    }
}

pub fn parse_date_literal(input: &str) -> Result<NaiveDate, ConversionError> {
    all_consuming(parse_date::<VerboseError<&str>>)(input.trim())
        .finish()
        .map(|(_, d)| d)
        .map_err(|_| ConversionError::InvalidValue(input.to_string(), DataType::Date))
}

pub fn parse_time_literal(input: &str) -> Result<NaiveTime, ConversionError> {
    all_consuming(parse_time::<VerboseError<&str>>)(input.trim())
        .finish()
        .map(|(_, t)| t)
        .map_err(|_| ConversionError::InvalidValue(input.to_string(), DataType::Time))
}

pub fn parse_timestamp_literal(input: &str) -> Result<NaiveDateTime, ConversionError> {
    all_consuming(parse_timestamp::<VerboseError<&str>>)(input.trim())
        .finish()
        .map(|(_, ts)| ts)
        .map_err(|_| ConversionError::InvalidValue(input.to_string(), DataType::Timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() -> Result<(), Box<dyn std::error::Error>> {
        let date = parse_date_literal("2020-1-05")?;
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 5).unwrap());
        assert!(parse_date_literal("2020-13-05").is_err());
        assert!(parse_date_literal("2020-01-05x").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_timestamp() -> Result<(), Box<dyn std::error::Error>> {
        let ts = parse_timestamp_literal("2001-02-03 04:05:06.5")?;
        assert_eq!(ts.nanosecond(), 500_000_000);
        assert_eq!(ts.hour(), 4);

        let ts = parse_timestamp_literal(" 2001-02-03 04:05:06 ")?;
        assert_eq!(ts.nanosecond(), 0);
        Ok(())
    }

    #[test]
    fn test_parse_time() -> Result<(), Box<dyn std::error::Error>> {
        let t = parse_time_literal("13:14:15")?;
        assert_eq!(t, NaiveTime::from_hms_opt(13, 14, 15).unwrap());
        assert!(parse_time_literal("25:00:00").is_err());
        Ok(())
    }
}
