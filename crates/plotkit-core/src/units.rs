//! Numeric formatting for the motion program wire format
//!
//! Coordinates are written in millimeters with a fixed number of fractional
//! digits. Values are rounded, never truncated, and a negative zero never
//! reaches the wire.

/// Fractional digits used for coordinates on the wire.
pub const COORDINATE_PRECISION: usize = 3;

/// Format a coordinate value (mm) with [`COORDINATE_PRECISION`] digits.
pub fn format_coordinate(value_mm: f64) -> String {
    format_fixed(value_mm, COORDINATE_PRECISION)
}

/// Format a feed rate (mm/min) as a whole number.
pub fn format_feed_rate(value_mm_per_min: f64) -> String {
    format_fixed(value_mm_per_min, 0)
}

/// Format a duration in seconds for a dwell parameter.
pub fn format_seconds(seconds: f64) -> String {
    format_fixed(seconds, COORDINATE_PRECISION)
}

/// Format `value` with `precision` fractional digits.
///
/// Anything that rounds to zero is printed without a sign.
pub fn format_fixed(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned.bytes().all(|b| b == b'0' || b == b'.') => unsigned.to_string(),
        _ => text,
    }
}
