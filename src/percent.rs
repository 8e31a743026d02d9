//! Percentage token parsing and formatting shared by the parser, writer and diff.

/// Two percentages closer than this are considered equal.
pub const EPSILON: f64 = 1e-9;

/// Parse a numeric token such as `5`, `12.5` or `12.5%`.
pub fn parse_percent(token: &str) -> Option<f64> {
    let cleaned: String = token.chars().filter(|&c| c != '%').collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Format a percentage for files and change reports.
///
/// Rounds to six decimals and drops trailing zeros, so `5.0` prints as `5`
/// and `4.999999999999` (a tolerance round trip) prints as `5`.
pub fn format_percent(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

/// Equality within [`EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
