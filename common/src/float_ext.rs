pub trait FloatExt: Copy {
    /// Absolute comparison against [`crate::EPSILON`].
    fn approximately_eq(self, other: Self) -> bool;

    /// Comparison with a tolerance relative to the larger magnitude.
    fn relative_eq(self, other: Self, tolerance: f64) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        ((self - other).abs() as f64) < crate::EPSILON
    }

    fn relative_eq(self, other: Self, tolerance: f64) -> bool {
        (self as f64).relative_eq(other as f64, tolerance)
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn relative_eq(self, other: Self, tolerance: f64) -> bool {
        if self == other {
            return true;
        }
        let scale = self.abs().max(other.abs());
        (self - other).abs() <= scale * tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_approximately_eq() {
        assert!(1.0_f32.approximately_eq(1.0));
        assert!(0.0_f32.approximately_eq(0.0));
        assert!((0.1_f32 + 0.2_f32).approximately_eq(0.3));
        assert!(!1.0_f32.approximately_eq(1.001));
    }

    #[test]
    fn test_f64_approximately_eq() {
        assert!(1.0_f64.approximately_eq(1.0));
        assert!((0.1_f64 + 0.2_f64).approximately_eq(0.3));
        assert!(!1.0_f64.approximately_eq(1.0001));
    }

    #[test]
    fn test_nan_is_never_equal() {
        assert!(!f32::NAN.approximately_eq(f32::NAN));
        assert!(!f64::NAN.relative_eq(f64::NAN, 1.0));
        assert!(!0.0_f32.approximately_eq(f32::NAN));
    }

    #[test]
    fn test_relative_eq_scales_with_magnitude() {
        // 1e6 apart in absolute terms, 1e-6 apart relatively
        assert!(1e12_f64.relative_eq(1e12 + 1e6, 1e-5));
        assert!(!1e12_f64.relative_eq(1e12 + 1e8, 1e-5));
        assert!(1e-9_f64.relative_eq(1.0000001e-9, 1e-6));
        assert!(!1e-9_f64.relative_eq(2e-9, 1e-6));
    }

    #[test]
    fn test_relative_eq_handles_signs_and_zero() {
        assert!(0.0_f64.relative_eq(0.0, 0.0));
        assert!(!(-1.0_f64).relative_eq(1.0, 0.5));
        assert!((-0.5_f32).relative_eq(-0.5000001, 1e-6));
    }
}
