//! Timestamp normalization.
//!
//! Lines carry the timestamp they were received with, which may have any
//! UTC offset. The canonical form is the same instant in UTC with a `Z`
//! suffix; fractional seconds are carried over digit for digit.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};

use crate::errors::TimestampError;

/// Normalize a W3C/RFC 3339 timestamp to UTC.
///
/// Timestamps already in UTC are returned unchanged.
pub fn canonical_utc(timestamp: &str) -> Result<String, TimestampError> {
    let parsed = parse_w3c(timestamp)?;
    if timestamp.ends_with('Z') {
        return Ok(timestamp.to_string());
    }

    let utc = parsed.with_timezone(&Utc);

    Ok(format!(
        "{}{}Z",
        utc.format("%Y-%m-%dT%H:%M:%S"),
        fractional_seconds(timestamp)
    ))
}

/// Format `when` the way received lines are stamped: second precision, with
/// the numeric offset of its zone (or `Z` for UTC).
pub fn w3c_timestamp<Tz: TimeZone>(when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    when.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_w3c(timestamp: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    DateTime::parse_from_rfc3339(timestamp)
        .or_else(|_| DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M%:z"))
        .map_err(|source| TimestampError::Invalid {
            timestamp: timestamp.to_string(),
            source,
        })
}

/// The `.digits` part of the seconds field, if any
fn fractional_seconds(timestamp: &str) -> &str {
    let Some(time_start) = timestamp.find('T') else {
        return "";
    };
    let time = &timestamp[time_start..];

    match time.find('.') {
        Some(dot) => {
            let digits = time[dot + 1..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(time.len() - dot - 1);
            &time[dot..dot + 1 + digits]
        }
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_is_unchanged() {
        assert_eq!(canonical_utc("2008-09-25T15:32:40Z").unwrap(), "2008-09-25T15:32:40Z");
        assert_eq!(
            canonical_utc("2008-09-25T15:32:40.25Z").unwrap(),
            "2008-09-25T15:32:40.25Z"
        );
    }

    #[test]
    fn offset_is_normalized() {
        assert_eq!(
            canonical_utc("2008-09-25T18:32:40+03:00").unwrap(),
            "2008-09-25T15:32:40Z"
        );
        assert_eq!(
            canonical_utc("2008-09-24T22:10:00-05:00").unwrap(),
            "2008-09-25T03:10:00Z"
        );
    }

    #[test]
    fn fraction_is_preserved() {
        assert_eq!(
            canonical_utc("2008-09-25T18:32:40.120+03:00").unwrap(),
            "2008-09-25T15:32:40.120Z"
        );
        assert_eq!(
            canonical_utc("2008-09-25T18:32:40.5+03:00").unwrap(),
            "2008-09-25T15:32:40.5Z"
        );
    }

    #[test]
    fn zero_offset_gets_z() {
        assert_eq!(
            canonical_utc("2008-09-25T15:32:40+00:00").unwrap(),
            "2008-09-25T15:32:40Z"
        );
    }

    #[test]
    fn minute_precision_is_accepted() {
        assert_eq!(canonical_utc("2008-09-25T18:32+03:00").unwrap(), "2008-09-25T15:32:00Z");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(canonical_utc("yesterday").is_err());
        assert!(canonical_utc("2008-13-45T99:00:00+03:00").is_err());
        assert!(canonical_utc("garbageZ").is_err());
        assert!(canonical_utc("2008-09-25T25:00:00Z").is_err());
    }

    #[test]
    fn w3c_format() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let when = offset.with_ymd_and_hms(2008, 9, 25, 18, 32, 40).unwrap();
        assert_eq!(w3c_timestamp(&when), "2008-09-25T18:32:40+03:00");
        assert_eq!(w3c_timestamp(&when.with_timezone(&Utc)), "2008-09-25T15:32:40Z");
    }
}
