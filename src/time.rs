use hifitime::{Duration, Epoch};
use std::str::FromStr;

use crate::{constants::Seconds, mpcq_errors::ValidationError};

/// Parse an observation timestamp in the format YYYY-MM-ddTHH:mm:ss[.fff][Z] (UTC).
///
/// Argument
/// --------
/// * `raw`: the timestamp as delivered by the warehouse or a CSV cell
///
/// Return
/// ------
/// * the timestamp as a UTC [`Epoch`], with the fractional seconds preserved
/// * [`ValidationError::MissingTimestamp`] for an empty cell,
///   [`ValidationError::InvalidTimestamp`] when the string cannot be parsed
pub fn parse_timestamp(raw: &str) -> Result<Epoch, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingTimestamp);
    }

    // Warehouse exports use the 'Z' suffix for UTC, hifitime defaults to UTC without it
    let without_zone = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    Epoch::from_str(without_zone).map_err(|_| ValidationError::InvalidTimestamp(trimmed.to_string()))
}

/// Parse an optional timestamp cell; empty or absent cells give `Ok(None)`.
pub fn parse_optional_timestamp(raw: Option<&str>) -> Result<Option<Epoch>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s).map(Some),
    }
}

/// Convert a number of seconds to a [`Duration`], rounded to the nearest nanosecond.
///
/// Tolerances are compared as durations, never as `f64` seconds, so that a
/// timestamp exactly on the boundary of a tolerance is always inside it.
pub fn seconds_to_duration(seconds: Seconds) -> Duration {
    Duration::from_total_nanoseconds((seconds * 1e9).round() as i128)
}

/// Shift an epoch by a signed number of seconds.
pub fn shift_seconds(epoch: Epoch, seconds: Seconds) -> Epoch {
    epoch + seconds_to_duration(seconds)
}

/// Render an epoch as `YYYY-MM-DDTHH:MM:SS[.fffffffff]` (UTC), the inverse of [`parse_timestamp`].
pub fn format_timestamp(epoch: &Epoch) -> String {
    let (y, m, d, h, mi, s, ns) = epoch.to_gregorian_utc();
    if ns == 0 {
        format!("{y:04}-{m:02}-{d:02}T{h:02}:{mi:02}:{s:02}")
    } else {
        format!("{y:04}-{m:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ns:09}")
    }
}

/// Transformation from a timestamp to modified julian date (MJD, UTC)
pub fn to_mjd_utc(epoch: &Epoch) -> f64 {
    epoch.to_mjd_utc_days()
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("2021-01-01T00:00:00").unwrap();
        assert_eq!(to_mjd_utc(&t), 59215.0);

        let t_z = parse_timestamp("2021-01-01T00:00:00Z").unwrap();
        assert_eq!(t, t_z);

        let t2 = parse_timestamp(" 2021-01-02T00:00:00 ").unwrap();
        assert_eq!(to_mjd_utc(&t2), 59216.0);
    }

    #[test]
    fn test_parse_timestamp_keeps_sub_second() {
        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        let t1 = parse_timestamp("2023-01-01T00:00:00.250").unwrap();
        assert_relative_eq!((t1 - t0).to_seconds(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert_eq!(parse_timestamp("  "), Err(ValidationError::MissingTimestamp));
        assert!(matches!(
            parse_timestamp("20xx-01-01T00:00:00"),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_optional_timestamp() {
        assert_eq!(parse_optional_timestamp(None), Ok(None));
        assert_eq!(parse_optional_timestamp(Some("")), Ok(None));
        assert!(parse_optional_timestamp(Some("2023-01-01T00:00:00"))
            .unwrap()
            .is_some());
        assert!(parse_optional_timestamp(Some("garbage")).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        let t = parse_timestamp("2023-03-04T05:06:07").unwrap();
        assert_eq!(format_timestamp(&t), "2023-03-04T05:06:07");

        let frac = parse_timestamp("2023-03-04T05:06:07.500").unwrap();
        assert_eq!(format_timestamp(&frac), "2023-03-04T05:06:07.500000000");
        assert_eq!(parse_timestamp(&format_timestamp(&frac)).unwrap(), frac);
    }

    #[test]
    fn test_shift_seconds() {
        let t = parse_timestamp("2023-01-01T00:00:00").unwrap();
        let later = shift_seconds(t, 30.0);
        let earlier = shift_seconds(t, -30.0);
        assert_eq!((later - t).to_seconds(), 30.0);
        assert_eq!((t - earlier).to_seconds(), 30.0);
    }

    #[test]
    fn test_seconds_to_duration_rounds_to_nanosecond() {
        assert_eq!(
            seconds_to_duration(0.3),
            Duration::from_total_nanoseconds(300_000_000)
        );
        assert_eq!(
            seconds_to_duration(0.7),
            Duration::from_total_nanoseconds(700_000_000)
        );
        // 1.001 * 1e9 is 1000999999.9999999 in f64
        assert_eq!(
            seconds_to_duration(1.001),
            Duration::from_total_nanoseconds(1_001_000_000)
        );
        assert_eq!(seconds_to_duration(-2.5), -seconds_to_duration(2.5));
    }
}
