//! Numeric cleanup for spreadsheet cells.
//!
//! Source exports mix real numbers with locale-formatted text (`"12,5"`,
//! `" 3.75 h"`). [`normalize_number`] is the only place that coerces such
//! text into a float. The coercion is a heuristic:
//!
//! * a decimal comma becomes a decimal point;
//! * every character that is not a digit, sign or point is dropped;
//! * whatever is left is parsed, and anything unparseable is absent.
//!
//! Thousand separators are therefore ambiguous: `"1.234,5"` becomes
//! `"1.234.5"` and is rejected, while `"1 234"` becomes `1234.0`. This is a
//! known limitation of the source data, kept visible here rather than
//! patched over elsewhere.

/// A raw cell value as read from a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Empty cell, error cell or anything with no usable content.
    Missing,
    /// A cell stored as a number.
    Number(f64),
    /// A cell stored as text.
    Text(String),
}

impl RawValue {
    /// Shorthand for building a text value.
    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Text(s.into())
    }

    /// Render the value as an identifier string (centers, items, work
    /// orders). Integral numbers drop their fractional part so `1234.0`
    /// renders as `"1234"`. Text is trimmed; empty text is `None`.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            RawValue::Missing => None,
            RawValue::Number(n) if n.is_nan() => None,
            RawValue::Number(n) => Some(format_identifier_number(*n)),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// Convert a raw value into a float, or `None` when it is absent or
/// unparseable. Never fails.
pub fn normalize_number(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Missing => None,
        RawValue::Number(n) if n.is_nan() => None,
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => normalize_text(s),
    }
}

fn normalize_text(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn format_identifier_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── normalize_number ──────────────────────────────────────────────────────

    #[test]
    fn test_missing_is_absent() {
        assert_eq!(normalize_number(&RawValue::Missing), None);
    }

    #[test]
    fn test_number_passes_through() {
        assert_eq!(normalize_number(&RawValue::Number(12.5)), Some(12.5));
        assert_eq!(normalize_number(&RawValue::Number(-3.0)), Some(-3.0));
    }

    #[test]
    fn test_nan_number_is_absent() {
        assert_eq!(normalize_number(&RawValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(normalize_number(&RawValue::text("12,5")), Some(12.5));
    }

    #[test]
    fn test_whitespace_and_units_stripped() {
        assert_eq!(normalize_number(&RawValue::text("  3.75 h ")), Some(3.75));
        assert_eq!(normalize_number(&RawValue::text("1 234")), Some(1234.0));
    }

    #[test]
    fn test_negative_value() {
        assert_eq!(normalize_number(&RawValue::text("-2,25")), Some(-2.25));
    }

    #[test]
    fn test_ambiguous_thousands_separator_is_absent() {
        // "1.234,5" -> "1.234.5": two points, not a float.
        assert_eq!(normalize_number(&RawValue::text("1.234,5")), None);
    }

    #[test]
    fn test_unparseable_text_is_absent() {
        assert_eq!(normalize_number(&RawValue::text("n/a")), None);
        assert_eq!(normalize_number(&RawValue::text("")), None);
        assert_eq!(normalize_number(&RawValue::text("-")), None);
        assert_eq!(normalize_number(&RawValue::text("--5")), None);
    }

    // ── as_identifier ─────────────────────────────────────────────────────────

    #[test]
    fn test_identifier_integral_number_has_no_fraction() {
        assert_eq!(
            RawValue::Number(1234.0).as_identifier(),
            Some("1234".to_string())
        );
    }

    #[test]
    fn test_identifier_fractional_number_kept() {
        assert_eq!(
            RawValue::Number(12.5).as_identifier(),
            Some("12.5".to_string())
        );
    }

    #[test]
    fn test_identifier_text_trimmed() {
        assert_eq!(
            RawValue::text("  A-100 ").as_identifier(),
            Some("A-100".to_string())
        );
    }

    #[test]
    fn test_identifier_empty_is_none() {
        assert_eq!(RawValue::text("   ").as_identifier(), None);
        assert_eq!(RawValue::Missing.as_identifier(), None);
    }
}
