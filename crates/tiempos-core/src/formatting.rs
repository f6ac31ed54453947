/// Round `value` to `decimals` decimal places (half away from zero).
///
/// # Examples
///
/// ```
/// use tiempos_core::formatting::round_to;
///
/// assert_eq!(round_to(10.456, 2), 10.46);
/// assert_eq!(round_to(-2.5, 0), -3.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round to the two decimals used by every aggregate in API responses.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is not positive.
///
/// # Examples
///
/// ```
/// use tiempos_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    round_to((part / whole) * 100.0, decimal_places)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
