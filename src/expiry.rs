//! Parsing of certificate `notAfter` strings and the time-remaining arithmetic.
//!
//! OpenSSL renders ASN.1 times as `"Mon DD HH:MM:SS YYYY GMT"`, with the day
//! padded by a space (`"Jan  1 00:00:00 2030 GMT"`). Both space and zero
//! padding are accepted here; anything else is rejected instead of being
//! coerced into a wrong instant.

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};

use crate::error::ExpiryError;

const NOT_AFTER_FORMAT: &str = "%b %d %H:%M:%S %Y";
const EXPECTED_SHAPE: &str = "expected \"Mon DD HH:MM:SS YYYY TZ\"";

/// Parses a certificate `notAfter` string into a UTC instant.
///
/// # Errors
///
/// Returns [`ExpiryError::Parse`] when the input does not have exactly the
/// five fields month, day, time, year and timezone, when the timezone is
/// neither `GMT` nor `UTC`, or when the fields do not name a real date.
///
/// # Example
///
/// ```
/// use certexpiry::parse_not_after;
///
/// let at = parse_not_after("Dec 31 23:59:59 2024 GMT").unwrap();
/// assert_eq!(at.to_rfc3339(), "2024-12-31T23:59:59+00:00");
/// ```
pub fn parse_not_after(input: &str) -> Result<DateTime<Utc>, ExpiryError> {
    let fields: Vec<&str> = input.split_whitespace().collect();
    let (month, day, time, year, tz) = match fields.as_slice() {
        [month, day, time, year, tz] => (*month, *day, *time, *year, *tz),
        _ => return Err(parse_error(input, EXPECTED_SHAPE)),
    };

    if tz != "GMT" && tz != "UTC" {
        return Err(parse_error(
            input,
            &format!("unsupported timezone '{}', expected GMT or UTC", tz),
        ));
    }

    // chrono is lenient about widths (full month names, single-digit hours),
    // so pin every field to its fixed shape first.
    let shaped = month.len() == 3
        && month.chars().all(|c| c.is_ascii_alphabetic())
        && (1..=2).contains(&day.len())
        && day.chars().all(|c| c.is_ascii_digit())
        && is_clock(time)
        && year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit());
    if !shaped {
        return Err(parse_error(input, EXPECTED_SHAPE));
    }

    let stamp = format!("{} {} {} {}", month, day, time, year);
    let naive = NaiveDateTime::parse_from_str(&stamp, NOT_AFTER_FORMAT)
        .map_err(|e| parse_error(input, &e.to_string()))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Signed duration from `now` until `expiry`. Negative once expired.
pub fn time_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> TimeDelta {
    expiry.signed_duration_since(now)
}

/// Renders a remaining duration as `"N days, HH:MM:SS"`, or
/// `"expired N days, HH:MM:SS ago"` when negative.
pub fn format_remaining(delta: TimeDelta) -> String {
    let expired = delta < TimeDelta::zero();
    let total = if expired { -delta } else { delta }.num_seconds();

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    let unit = if days == 1 { "day" } else { "days" };

    let body = format!(
        "{} {}, {:02}:{:02}:{:02}",
        days, unit, hours, minutes, seconds
    );
    if expired {
        format!("expired {} ago", body)
    } else {
        body
    }
}

fn is_clock(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit())
}

fn parse_error(input: &str, reason: &str) -> ExpiryError {
    ExpiryError::Parse {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
