//! Display helpers for forecast values.

use chrono::NaiveDate;

/// Upper bounds (inclusive, km/h) for Beaufort forces 1 through 11.
const BEAUFORT_LIMITS: [f64; 11] = [
    5.0, 11.0, 19.0, 28.0, 38.0, 49.0, 61.0, 74.0, 88.0, 102.0, 117.0,
];

/// Render a number of seconds as whole hours and minutes, e.g. `"8h 22m"`.
///
/// Zero, negative and non-finite inputs render as `"0h 0m"`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0h 0m".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}h {}m", total / 3600, (total % 3600) / 60)
}

/// Convert a wind speed in km/h to the Beaufort scale (0-12).
pub fn kmh_to_beaufort(kmh: f64) -> u8 {
    if kmh.is_nan() || kmh < 1.0 {
        return 0;
    }

    BEAUFORT_LIMITS
        .iter()
        .position(|&limit| kmh <= limit)
        .map_or(12, |index| index as u8 + 1)
}

/// Short day label such as `"Thu 4 Nov"`; empty when the date is unknown.
pub fn format_day(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%a %-d %b").to_string())
        .unwrap_or_default()
}

/// Optional number with a unit, or a dash.
pub fn format_optional(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => "-".to_string(),
    }
}
