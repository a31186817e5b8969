//! Numeric Sanitization
//!
//! Helpers that keep model inputs and outputs finite and inside their
//! documented ranges. The pure model functions never return NaN.

/// Replace NaN or infinite values with `fallback`
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp into `[min, max]`, mapping NaN to `min` and infinities to the nearest bound
pub fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// `min(1, value / cap)` for non-negative inputs, 0 otherwise
pub fn normalize(value: f64, cap: f64) -> f64 {
    if cap <= 0.0 || !value.is_finite() || value <= 0.0 {
        return if value == f64::INFINITY && cap > 0.0 { 1.0 } else { 0.0 };
    }
    (value / cap).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(2.5, 0.0), 2.5);
        assert_eq!(finite_or(f64::NAN, 1.0), 1.0);
        assert_eq!(finite_or(f64::NEG_INFINITY, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_finite() {
        assert_eq!(clamp_finite(f64::NAN, 0.1, 100.0), 0.1);
        assert_eq!(clamp_finite(f64::INFINITY, 0.1, 100.0), 100.0);
        assert_eq!(clamp_finite(f64::NEG_INFINITY, 1.0, 10.0), 1.0);
        assert_eq!(clamp_finite(3.0, 1.0, 10.0), 3.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, 10.0), 0.5);
        assert_eq!(normalize(25.0, 10.0), 1.0);
        assert_eq!(normalize(-3.0, 10.0), 0.0);
        assert_eq!(normalize(f64::NAN, 10.0), 0.0);
        assert_eq!(normalize(f64::INFINITY, 10.0), 1.0);
    }
}
