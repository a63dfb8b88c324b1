/// Text-grammar helpers used by all resource collectors.
///
/// This module contains:
/// - RouterOS duration parsing ("3d3h42m53s")
/// - RouterOS datetime parsing ("sep/08/2019 18:09:55")
/// - Wireless / ethernet rate parsing ("433.3Mbps-80MHz/1S/SGI", "1Gbps")
/// - Comma-packed float pairs ("1.2,2.1")
/// - Metric name cleanup
///
/// IMPORTANT:
/// - Every function here is pure: no I/O, no logging.
/// - Parsers fail closed. Anything outside the grammar is an error,
///   the caller decides whether to skip or abort.
///
use std::num::ParseFloatError;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Seconds per duration unit, in grammar order (w, d, h, m, s).
const DURATION_UNITS: [u64; 5] = [604_800, 86_400, 3_600, 60, 1];

/// RouterOS clock / timestamp format, month abbreviation in any case.
const DATETIME_FORMAT: &str = "%b/%d/%Y %H:%M:%S";

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([0-9]*)w)?(?:([0-9]*)d)?(?:([0-9]*)h)?(?:([0-9]*)m)?(?:([0-9]*)s)?$")
        .expect("duration grammar is valid")
});

static WIRELESS_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9.]+)Mbps").expect("wireless rate grammar is valid"));

static LINK_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9.]+)([MG])bps$").expect("link rate grammar is valid"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid duration value {0:?}")]
    InvalidDuration(String),

    #[error("invalid datetime value {value:?}: {source}")]
    InvalidDatetime {
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid wireless rate value {0:?}")]
    InvalidWirelessRate(String),

    #[error("invalid link rate value {0:?}")]
    InvalidLinkRate(String),

    #[error("invalid numeric value {value:?}: {source}")]
    InvalidFloat {
        value: String,
        source: ParseFloatError,
    },

    #[error("expected two comma separated values, got {0:?}")]
    MissingSegment(String),
}

/// Normalize a RouterOS property name into a metric leaf name.
///
/// Examples:
/// - "rx-byte"           -> "rx_byte"
/// - "last-link-up-time" -> "last_link_up_time"
pub fn metric_string_cleanup(raw: &str) -> String {
    raw.replace('-', "_")
}

/// Parse a plain numeric field.
pub fn parse_float(value: &str) -> Result<f64, ParseError> {
    value.parse::<f64>().map_err(|source| ParseError::InvalidFloat {
        value: value.to_string(),
        source,
    })
}

/// Map a RouterOS boolean ("true" / "false") to 1 / 0.
///
/// Anything other than "true" counts as false, the way RouterOS
/// reports `running`, `full-duplex` and friends.
pub fn parse_bool(value: &str) -> f64 {
    if value == "true" { 1.0 } else { 0.0 }
}

/// Parse a RouterOS duration into seconds.
///
/// Grammar:
///     (<n>w)?(<n>d)?(<n>h)?(<n>m)?(<n>s)?
///
/// The whole input must match in one pass, units in this order.
///
/// Examples:
/// - "3d3h42m53s"    -> 272573
/// - "15w3d3h42m53s" -> 9344573
/// - ""              -> 0
/// - "s"             -> 0   (unit without digits contributes nothing)
/// - "59"            -> error (no unit)
pub fn parse_duration(duration: &str) -> Result<f64, ParseError> {
    let caps = DURATION_RE
        .captures(duration)
        .ok_or_else(|| ParseError::InvalidDuration(duration.to_string()))?;

    let mut total: u64 = 0;
    for (i, unit) in DURATION_UNITS.iter().enumerate() {
        let Some(group) = caps.get(i + 1) else { continue };
        if group.as_str().is_empty() {
            continue;
        }

        let n: u64 = group
            .as_str()
            .parse()
            .map_err(|_| ParseError::InvalidDuration(duration.to_string()))?;

        total = n
            .checked_mul(*unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| ParseError::InvalidDuration(duration.to_string()))?;
    }

    Ok(total as f64)
}

/// Parse a RouterOS datetime ("Mon/DD/YYYY hh:mm:ss") as UTC.
///
/// RouterOS does not include a timezone; the device clock is taken
/// at face value. Month abbreviations are matched case-insensitively.
pub fn parse_datetime(datetime: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| ParseError::InvalidDatetime {
            value: datetime.to_string(),
            source,
        })
}

/// Parse a wireless rate string into Mbps.
///
/// Examples:
/// - "702Mbps-80MHz/2S"       -> 702
/// - "433.3Mbps-80MHz/1S/SGI" -> 433.3
/// - "Mbps", "433..3Mbps", "" -> error
pub fn parse_wireless_rate(rate: &str) -> Result<f64, ParseError> {
    let caps = WIRELESS_RATE_RE
        .captures(rate)
        .ok_or_else(|| ParseError::InvalidWirelessRate(rate.to_string()))?;

    caps[1]
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidWirelessRate(rate.to_string()))
}

/// Parse an ethernet link rate ("100Mbps", "1Gbps", "2.5Gbps") into Mbps.
pub fn parse_link_rate(rate: &str) -> Result<f64, ParseError> {
    let caps = LINK_RATE_RE
        .captures(rate)
        .ok_or_else(|| ParseError::InvalidLinkRate(rate.to_string()))?;

    let value = caps[1]
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidLinkRate(rate.to_string()))?;

    match &caps[2] {
        "G" => Ok(value * 1000.0),
        _ => Ok(value),
    }
}

/// Split a comma-packed pair ("tx,rx") into two floats.
///
/// Segments after the second one are ignored.
pub fn split_string_to_floats(metric: &str) -> Result<(f64, f64), ParseError> {
    let mut parts = metric.split(',');

    let first = parts.next().unwrap_or_default();
    let second = parts
        .next()
        .ok_or_else(|| ParseError::MissingSegment(metric.to_string()))?;

    Ok((parse_float(first)?, parse_float(second)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn duration_sums_units_in_order() {
        let cases = [
            ("3d3h42m53s", 272_573.0),
            ("15w3d3h42m53s", 9_344_573.0),
            ("42m53s", 2_573.0),
            ("7w6d9h34m", 4_786_440.0),
            ("1w", 604_800.0),
            ("10s", 10.0),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_duration(input).unwrap(), expected, "input {input:?}");
        }
    }

    #[test]
    fn duration_empty_and_bare_unit_are_zero() {
        assert_eq!(parse_duration("").unwrap(), 0.0);
        assert_eq!(parse_duration("s").unwrap(), 0.0);
    }

    #[test]
    fn duration_rejects_bare_number_and_out_of_order_units() {
        assert!(parse_duration("59").is_err());
        assert!(parse_duration("3h2d").is_err());
        assert!(parse_duration("3dxyz").is_err());
        assert!(parse_duration("00:01:02").is_err());
    }

    #[test]
    fn duration_overflow_is_an_error() {
        assert!(parse_duration("99999999999999999999w").is_err());
    }

    #[test]
    fn wireless_rate_extracts_leading_number() {
        assert_eq!(parse_wireless_rate("1Mbps").unwrap(), 1.0);
        assert_eq!(parse_wireless_rate("702Mbps-80MHz/2S").unwrap(), 702.0);
        assert_eq!(parse_wireless_rate("433.3Mbps-80MHz/1S/SGI").unwrap(), 433.3);
    }

    #[test]
    fn wireless_rate_rejects_malformed_input() {
        assert!(parse_wireless_rate("Mbps").is_err());
        assert!(parse_wireless_rate("433..3Mbps").is_err());
        assert!(parse_wireless_rate("").is_err());
        assert!(parse_wireless_rate("54").is_err());
    }

    #[test]
    fn datetime_parses_as_utc() {
        assert_eq!(
            parse_datetime("sep/08/2019 18:09:55").unwrap(),
            Utc.with_ymd_and_hms(2019, 9, 8, 18, 9, 55).unwrap()
        );
        assert_eq!(
            parse_datetime("Oct/05/2019 16:34:15").unwrap(),
            Utc.with_ymd_and_hms(2019, 10, 5, 16, 34, 15).unwrap()
        );
    }

    #[test]
    fn datetime_rejects_other_layouts() {
        for input in ["oct-05-2019 16:34:15", "16:34:15", "25", ""] {
            assert!(parse_datetime(input).is_err(), "input {input:?}");
        }
    }

    #[test]
    fn comma_pair_takes_first_two_segments() {
        assert_eq!(split_string_to_floats("1.2,2.1").unwrap(), (1.2, 2.1));
        assert_eq!(split_string_to_floats("1.2,2.1,3.2").unwrap(), (1.2, 2.1));
    }

    #[test]
    fn comma_pair_rejects_missing_values() {
        for input in ["1.2,", ",2.1", "", "1.2"] {
            assert!(split_string_to_floats(input).is_err(), "input {input:?}");
        }
    }

    #[test]
    fn link_rate_scales_gigabit() {
        assert_eq!(parse_link_rate("100Mbps").unwrap(), 100.0);
        assert_eq!(parse_link_rate("1Gbps").unwrap(), 1000.0);
        assert_eq!(parse_link_rate("2.5Gbps").unwrap(), 2500.0);
        assert!(parse_link_rate("auto").is_err());
    }

    #[test]
    fn cleanup_replaces_dashes() {
        assert_eq!(metric_string_cleanup("last-link-up-time"), "last_link_up_time");
    }
}
