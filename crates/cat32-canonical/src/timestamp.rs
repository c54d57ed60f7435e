//! Calendar instants that may be invalid.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Largest magnitude, in milliseconds, of a representable instant (±100M days).
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// A calendar instant, or the single invalid instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// A representable UTC instant.
    Valid(DateTime<Utc>),
    /// An unparseable or out-of-range instant.
    Invalid,
}

impl Timestamp {
    /// Wraps a UTC instant.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Timestamp::Valid(instant)
    }

    /// Instant at `millis` since the Unix epoch; NaN and out-of-range inputs
    /// yield [`Timestamp::Invalid`]. Fractional milliseconds are truncated.
    /// Instants beyond chrono's supported years are also invalid.
    pub fn from_millis(millis: f64) -> Self {
        if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
            return Timestamp::Invalid;
        }
        match Utc.timestamp_millis_opt(millis.trunc() as i64).single() {
            Some(instant) => Timestamp::Valid(instant),
            None => Timestamp::Invalid,
        }
    }

    /// Parses RFC 3339 text; anything unparseable yields [`Timestamp::Invalid`].
    pub fn parse(text: &str) -> Self {
        match DateTime::parse_from_rfc3339(text) {
            Ok(instant) => Timestamp::Valid(instant.with_timezone(&Utc)),
            Err(_) => Timestamp::Invalid,
        }
    }

    /// The invalid instant.
    pub fn invalid() -> Self {
        Timestamp::Invalid
    }

    /// True for [`Timestamp::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Timestamp::Valid(_))
    }

    /// ISO-8601 text with millisecond precision and a `Z` suffix.
    ///
    /// Years outside `0..=9999` use the signed six-digit extended form.
    pub fn to_iso_string(&self) -> Option<String> {
        let instant = match self {
            Timestamp::Valid(instant) => instant,
            Timestamp::Invalid => return None,
        };
        let rest = instant.format("%m-%dT%H:%M:%S%.3fZ");
        let year = instant.year();
        Some(if (0..=9999).contains(&year) {
            format!("{year:04}-{rest}")
        } else {
            let sign = if year < 0 { '-' } else { '+' };
            format!("{sign}{:06}-{rest}", year.unsigned_abs())
        })
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Timestamp::Valid(instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_text_has_millisecond_precision() {
        let ts = Timestamp::parse("2024-01-02T03:04:05Z");
        assert_eq!(ts.to_iso_string().as_deref(), Some("2024-01-02T03:04:05.000Z"));
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let ts = Timestamp::parse("2024-01-02T05:04:05.250+02:00");
        assert_eq!(ts.to_iso_string().as_deref(), Some("2024-01-02T03:04:05.250Z"));
    }

    #[test]
    fn out_of_range_inputs_are_invalid() {
        assert_eq!(Timestamp::from_millis(f64::NAN), Timestamp::Invalid);
        assert_eq!(Timestamp::from_millis(8.64e15 + 1.0), Timestamp::Invalid);
        assert_eq!(Timestamp::parse("not a date"), Timestamp::Invalid);
    }

    #[test]
    fn extended_years_use_six_digits() {
        let ts = Timestamp::from_millis(253_402_300_800_000.0);
        assert_eq!(ts.to_iso_string().as_deref(), Some("+010000-01-01T00:00:00.000Z"));
    }
}
