//! GPS coordinate parsing
//!
//! Loggers write positions either as plain decimal degrees (`-3.5`) or as
//! degrees and decimal minutes with a hemisphere letter (`40°26.767 N`).
//! Anything that cannot be read is treated as 0 ("no fix").

use regex::Regex;
use std::sync::OnceLock;

fn degrees_minutes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Some exports double-encode the degree sign as "Â°"
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)\s*Â?°\s*(\d+(?:\.\d*)?)\s+([NSEW])")
            .expect("valid degrees/minutes pattern")
    })
}

/// Parse a coordinate cell into signed decimal degrees.
///
/// Returns 0.0 for empty, malformed or non-finite input.
pub fn parse_coordinate(raw: &str) -> f64 {
    let clean = raw.trim();
    if clean.is_empty() {
        return 0.0;
    }

    if !clean.contains('°') {
        return clean
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
    }

    let Some(caps) = degrees_minutes_pattern().captures(clean) else {
        return 0.0;
    };

    let degrees: f64 = caps[1].parse().unwrap_or(0.0);
    let minutes: f64 = caps[2].parse().unwrap_or(0.0);
    let decimal = degrees + minutes / 60.0;

    match &caps[3] {
        "S" | "W" => -decimal,
        _ => decimal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_minutes_north() {
        let v = parse_coordinate("40°26.767 N");
        assert!((v - (40.0 + 26.767 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn test_hemisphere_sign() {
        assert!(parse_coordinate("3°30.0 W") < 0.0);
        assert!(parse_coordinate("33°52.5 S") < 0.0);
        assert!(parse_coordinate("3°30.0 E") > 0.0);
        assert!((parse_coordinate("3°30.0 W") + 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_plain_decimal() {
        assert_eq!(parse_coordinate("-3.5"), -3.5);
        assert_eq!(parse_coordinate(" 51.2345 "), 51.2345);
    }

    #[test]
    fn test_empty_and_garbage_are_zero() {
        assert_eq!(parse_coordinate(""), 0.0);
        assert_eq!(parse_coordinate("   "), 0.0);
        assert_eq!(parse_coordinate("n/a"), 0.0);
        assert_eq!(parse_coordinate("NaN"), 0.0);
        assert_eq!(parse_coordinate("40° north"), 0.0);
    }

    #[test]
    fn test_double_encoded_degree_sign() {
        let v = parse_coordinate("40Â°26.767 N");
        assert!((v - (40.0 + 26.767 / 60.0)).abs() < 1e-12);
    }
}
