//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, Signed, Zero};

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: PartialOrd + Copy
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Clamp a value into `[-limit, limit]`, returning the clamped value and whether clamping
/// occured.
pub fn clamp_sym<T>(value: T, limit: T) -> (T, bool)
where
    T: Float
{
    let limit = limit.abs();
    let clamped = clamp(&value, &-limit, &limit);

    (clamped, clamped != value)
}

/// Snap values whose magnitude is strictly below `threshold` to zero.
pub fn dead_zone<T>(value: T, threshold: T) -> T
where
    T: Float
{
    if value.abs() < threshold {
        T::zero()
    }
    else {
        value
    }
}

/// Replace a value by `+step` or `-step` according to its sign, leaving zero unchanged.
pub fn sign_step<T>(value: T, step: T) -> T
where
    T: Signed + Zero + Copy + PartialOrd
{
    if value > T::zero() {
        step
    }
    else if value < T::zero() {
        -step
    }
    else {
        T::zero()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp_sym() {
        assert_eq!(clamp_sym(111.0, 110.0), (110.0, true));
        assert_eq!(clamp_sym(-111.0, 110.0), (-110.0, true));
        assert_eq!(clamp_sym(110.0, 110.0), (110.0, false));
        assert_eq!(clamp_sym(-3.0, 35.0), (-3.0, false));
    }

    #[test]
    fn test_dead_zone() {
        assert_eq!(dead_zone(7.99, 8.0), 0.0);
        assert_eq!(dead_zone(-7.99, 8.0), 0.0);
        assert_eq!(dead_zone(8.0, 8.0), 8.0);
        assert_eq!(dead_zone(-21.8, 8.0), -21.8);
    }

    #[test]
    fn test_sign_step() {
        assert_eq!(sign_step(21.8, 1.0), 1.0);
        assert_eq!(sign_step(-0.1, 2.0), -2.0);
        assert_eq!(sign_step(0.0, 2.0), 0.0);
        assert_eq!(sign_step(-400i32, 3), -3);
    }
}
