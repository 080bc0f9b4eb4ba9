//! Duration strings in the `1h2m3.5s` notation.
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix (`ns`, `us`, `µs`, `ms`, `s`, `m`,
//! `h`). A bare `0` is also accepted.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Fraction digits beyond this cannot change a nanosecond count.
const MAX_FRACTION_DIGITS: usize = 18;

const UNITS: [(&str, u128); 8] = [
    ("ns", 1),
    ("us", NANOS_PER_MICRO),
    ("µs", NANOS_PER_MICRO),
    ("μs", NANOS_PER_MICRO),
    ("ms", NANOS_PER_MILLI),
    ("s", NANOS_PER_SECOND),
    ("m", NANOS_PER_MINUTE),
    ("h", NANOS_PER_HOUR),
];

/// Failures parsing a duration string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DurationError {
    /// The text is not a duration.
    #[error("invalid duration {0:?}")]
    Invalid(String),
    /// A number had no unit.
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    /// A unit was not recognised.
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit {
        /// The unrecognised suffix.
        unit: String,
        /// The full input.
        input: String,
    },
    /// The duration was below zero.
    #[error("negative duration {0:?}")]
    Negative(String),
}

/// Parses a non-negative duration string.
///
/// # Errors
///
/// Returns [`DurationError`] when the text is malformed, uses an unknown
/// unit, overflows, or is negative.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if body.is_empty() {
        return Err(DurationError::Invalid(input.to_owned()));
    }

    let mut rest = body;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (component, remainder) = parse_component(rest, input)?;
        total = total
            .checked_add(component)
            .ok_or_else(|| DurationError::Invalid(input.to_owned()))?;
        rest = remainder;
    }

    if negative && total != 0 {
        return Err(DurationError::Negative(input.to_owned()));
    }
    let nanos = u64::try_from(total).map_err(|_| DurationError::Invalid(input.to_owned()))?;
    Ok(Duration::from_nanos(nanos))
}

/// Parses one `<number>[.<fraction>]<unit>` group, returning its length in
/// nanoseconds and the unparsed remainder.
fn parse_component<'a>(text: &'a str, input: &str) -> Result<(u128, &'a str), DurationError> {
    let invalid = || DurationError::Invalid(input.to_owned());

    let (whole, after_whole) = split_digits(text);
    let (fraction, after_fraction) = match after_whole.strip_prefix('.') {
        Some(tail) => split_digits(tail),
        None => ("", after_whole),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    let unit_end = after_fraction
        .find(|c: char| c == '.' || c.is_ascii_digit())
        .unwrap_or(after_fraction.len());
    let (unit, remainder) = after_fraction.split_at(unit_end);
    if unit.is_empty() {
        return Err(DurationError::MissingUnit(input.to_owned()));
    }
    let scale = UNITS
        .iter()
        .find_map(|(name, scale)| (*name == unit).then_some(*scale))
        .ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_owned(),
            input: input.to_owned(),
        })?;

    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut nanos = whole_value.checked_mul(scale).ok_or_else(invalid)?;

    let mut numerator: u128 = 0;
    let mut denominator: u128 = 1;
    for digit in fraction.bytes().take(MAX_FRACTION_DIGITS) {
        numerator = numerator * 10 + u128::from(digit - b'0');
        denominator *= 10;
    }
    nanos = nanos
        .checked_add(numerator * scale / denominator)
        .ok_or_else(invalid)?;

    Ok((nanos, remainder))
}

fn split_digits(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Formats a duration in the same notation, e.g. `25s`, `1m0s`, `1h30m0s`,
/// `1.5s` or `300ms`.
#[must_use]
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return String::from("0s");
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, 3));
    }
    if nanos < NANOS_PER_SECOND {
        return format!("{}ms", decimal(nanos, 6));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = decimal(nanos % NANOS_PER_MINUTE, 9);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Renders `value / 10^places` without trailing fractional zeros.
fn decimal(value: u128, places: u32) -> String {
    let divisor = 10_u128.pow(places);
    let whole = value / divisor;
    let fraction = value % divisor;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}", width = places as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", Duration::ZERO)]
    #[case("25s", Duration::from_secs(25))]
    #[case("1m30s", Duration::from_secs(90))]
    #[case("1.5h", Duration::from_secs(5400))]
    #[case("300ms", Duration::from_millis(300))]
    #[case("2µs", Duration::from_micros(2))]
    #[case("2us", Duration::from_micros(2))]
    #[case("10ns", Duration::from_nanos(10))]
    #[case(".5s", Duration::from_millis(500))]
    #[case("+3s", Duration::from_secs(3))]
    #[case("-0s", Duration::ZERO)]
    fn parses_valid_durations(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse(input), Ok(expected));
    }

    #[rstest]
    #[case("", DurationError::Invalid(String::new()))]
    #[case("abc", DurationError::Invalid(String::from("abc")))]
    #[case(".s", DurationError::Invalid(String::from(".s")))]
    #[case("10", DurationError::MissingUnit(String::from("10")))]
    #[case("5d", DurationError::UnknownUnit { unit: String::from("d"), input: String::from("5d") })]
    #[case("-5s", DurationError::Negative(String::from("-5s")))]
    fn rejects_invalid_durations(#[case] input: &str, #[case] expected: DurationError) {
        assert_eq!(parse(input), Err(expected));
    }

    #[test]
    fn rejects_overflowing_durations() {
        assert!(matches!(
            parse("99999999999999999999h"),
            Err(DurationError::Invalid(_))
        ));
    }

    #[rstest]
    #[case(Duration::ZERO, "0s")]
    #[case(Duration::from_secs(25), "25s")]
    #[case(Duration::from_secs(60), "1m0s")]
    #[case(Duration::from_secs(3661), "1h1m1s")]
    #[case(Duration::from_millis(1500), "1.5s")]
    #[case(Duration::from_millis(300), "300ms")]
    #[case(Duration::from_micros(1500), "1.5ms")]
    #[case(Duration::from_nanos(42), "42ns")]
    fn formats_durations(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format(duration), expected);
    }
}
