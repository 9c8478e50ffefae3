//! Cell Coercion Module
//!
//! Locale-aware conversion of raw cell strings into typed values. Monetary
//! cells in these reports are frequently blank placeholders, so the public
//! coercion functions default to `0.0` instead of failing; the `parse_*`
//! variants return `Option` so callers can distinguish "blank" from
//! "garbled" when logging in verbose mode.
//!
//! The decimal/thousands ambiguity (`1.234,56` vs `1,234.56`) is resolved
//! without a declared locale: with [`NumberFormat::Auto`], the separator
//! that appears last in the string is the decimal point.

use crate::api::NumberFormat;

/// Parse a numeric cell. `None` for blank, `"nan"`, or unparseable input.
pub(crate) fn parse_float(raw: &str, format: NumberFormat) -> Option<f64> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() || s == "nan" {
        return None;
    }

    let cleaned = match format {
        NumberFormat::CommaDecimal => s.replace('.', "").replace(',', "."),
        NumberFormat::Auto => {
            let last_comma = s.rfind(',');
            let last_point = s.rfind('.');
            match (last_comma, last_point) {
                (Some(comma), Some(point)) => {
                    if point > comma {
                        // 1,234.56: comma is thousands
                        s.replace(',', "")
                    } else {
                        // 1.234,56: point is thousands
                        s.replace('.', "").replace(',', ".")
                    }
                }
                (Some(_), None) => s.replace(',', "."),
                _ => s,
            }
        }
    };

    cleaned.parse::<f64>().ok()
}

/// Numeric coercion with default-on-failure semantics: blank or unparseable
/// input yields `0.0`, never an error.
pub(crate) fn to_float(raw: &str, format: NumberFormat) -> f64 {
    parse_float(raw, format).unwrap_or(0.0)
}

/// Parse a percentage cell (`"38,70%"` → `0.387`). `None` on blank/garbled.
pub(crate) fn parse_percent(raw: &str, format: NumberFormat) -> Option<f64> {
    let stripped = raw.trim().trim_end_matches('%');
    parse_float(stripped, format).map(|v| v / 100.0)
}

/// Percentage coercion with default-on-failure semantics.
pub(crate) fn to_percent(raw: &str, format: NumberFormat) -> f64 {
    parse_percent(raw, format).unwrap_or(0.0)
}
