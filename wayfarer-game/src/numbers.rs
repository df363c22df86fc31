//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Truncate a f64 toward zero and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn trunc_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).trunc();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Floor a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn floor_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).floor();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Convert a collection length into f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_matches_integer_conversion() {
        assert_eq!(trunc_f64_to_i32(22.5), 22);
        assert_eq!(trunc_f64_to_i32(-7.9), -7);
        assert_eq!(trunc_f64_to_i32(f64::NAN), 0);
        assert_eq!(trunc_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
    }

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        assert_eq!(floor_f64_to_i32(2.9), 2);
        assert_eq!(floor_f64_to_i32(-0.5), -1);
        assert_eq!(floor_f64_to_i32(f64::NAN), 0);
    }

    #[test]
    fn lengths_convert_exactly_for_small_values() {
        assert!((usize_to_f64(12) - 12.0).abs() < f64::EPSILON);
        assert!(usize_to_f64(0).abs() < f64::EPSILON);
    }
}
