#![forbid(unsafe_code)]

//! Numeric model for window arithmetic.
//!
//! Window math runs in the domain's own numeric type. Integer domains use
//! floor division and never produce fractional window edges; float domains
//! are used as-is. Nothing here snaps values to a step grid: callers that
//! need snapping do it before handing values to the controller.

use core::fmt;
use core::ops::{Add, Div, Mul, Sub};

/// A numeric type a window domain can be expressed in.
///
/// Implemented for `f32`, `f64`, `i32`, `i64`, `u32` and `u64`.
pub trait Scalar:
    Copy
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;
    /// Smallest step the shift planner will use (one domain unit for integers).
    const MIN_STEP: Self;

    /// `false` for NaN and infinities; always `true` for integers.
    fn is_finite(self) -> bool;

    /// `floor(self / rhs)` as a whole count. `rhs` must be positive.
    fn floor_div(self, rhs: Self) -> Self;

    /// Half of the value, truncating for integers.
    fn half(self) -> Self;

    /// `self * fraction`, truncating toward zero for integers.
    fn scale(self, fraction: f64) -> Self;

    /// `self + rhs`, or `None` when the result is not representable.
    fn checked_add(self, rhs: Self) -> Option<Self>;

    /// `self - rhs`, or `None` when the result is not representable.
    fn checked_sub(self, rhs: Self) -> Option<Self>;

    /// Whole count as `u64`. Negative values map to `0`; values past
    /// `u64::MAX` saturate.
    fn to_u64_saturating(self) -> u64;

    /// Lossy conversion used for diagnostics and error messages.
    fn to_f64(self) -> f64;
}

macro_rules! impl_float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const MIN_STEP: Self = <$t>::MIN_POSITIVE;

            #[inline]
            fn is_finite(self) -> bool {
                <$t>::is_finite(self)
            }

            #[inline]
            fn floor_div(self, rhs: Self) -> Self {
                (self / rhs).floor()
            }

            #[inline]
            fn half(self) -> Self {
                self / 2.0
            }

            #[inline]
            fn scale(self, fraction: f64) -> Self {
                (f64::from(self) * fraction) as $t
            }

            #[inline]
            fn checked_add(self, rhs: Self) -> Option<Self> {
                let sum = self + rhs;
                sum.is_finite().then_some(sum)
            }

            #[inline]
            fn checked_sub(self, rhs: Self) -> Option<Self> {
                let diff = self - rhs;
                diff.is_finite().then_some(diff)
            }

            #[inline]
            fn to_u64_saturating(self) -> u64 {
                // Float-to-int `as` saturates and maps NaN to 0.
                self as u64
            }

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }
        }
    )*};
}

macro_rules! impl_int_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN_STEP: Self = 1;

            #[inline]
            fn is_finite(self) -> bool {
                true
            }

            #[inline]
            fn floor_div(self, rhs: Self) -> Self {
                self.div_euclid(rhs)
            }

            #[inline]
            fn half(self) -> Self {
                self / 2
            }

            #[inline]
            fn scale(self, fraction: f64) -> Self {
                (self as f64 * fraction) as $t
            }

            #[inline]
            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$t>::checked_add(self, rhs)
            }

            #[inline]
            fn checked_sub(self, rhs: Self) -> Option<Self> {
                <$t>::checked_sub(self, rhs)
            }

            #[inline]
            fn to_u64_saturating(self) -> u64 {
                u64::try_from(self).unwrap_or(0)
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

impl_float_scalar!(f32, f64);
impl_int_scalar!(i32, i64, u32, u64);

/// Clamp `value` into `[lo, hi]`. Requires `lo <= hi`.
#[inline]
pub fn clamp<T: Scalar>(value: T, lo: T, hi: T) -> T {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// `ceil(a / b)` for non-negative `a` and positive `b`.
#[inline]
pub(crate) fn ceil_div<T: Scalar>(a: T, b: T) -> T {
    let whole = a.floor_div(b);
    if whole * b < a { whole + T::ONE } else { whole }
}

#[inline]
pub(crate) fn min<T: Scalar>(a: T, b: T) -> T {
    if b < a { b } else { a }
}

#[inline]
pub(crate) fn max<T: Scalar>(a: T, b: T) -> T {
    if b > a { b } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_floor_div_rounds_toward_negative_infinity() {
        assert_eq!(7i64.floor_div(2), 3);
        assert_eq!((-7i64).floor_div(2), -4);
        assert_eq!(9u64.floor_div(10), 0);
    }

    #[test]
    fn float_floor_div_is_whole() {
        assert_eq!(7.5f64.floor_div(2.0), 3.0);
        assert_eq!((-0.5f64).floor_div(2.0), -1.0);
    }

    #[test]
    fn integer_half_truncates() {
        assert_eq!(1u32.half(), 0);
        assert_eq!(20_000i64.half(), 10_000);
    }

    #[test]
    fn scale_truncates_for_integers() {
        assert_eq!(20_000u64.scale(0.05), 1_000);
        assert_eq!(3i32.scale(0.5), 1);
        assert_eq!(3.0f64.scale(0.5), 1.5);
    }

    #[test]
    fn non_finite_floats_are_detected() {
        assert!(!f64::NAN.is_finite());
        assert!(!Scalar::is_finite(f32::INFINITY));
        assert!(Scalar::is_finite(u64::MAX));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(Scalar::checked_sub(2_000_000_000i32, -2_000_000_000), None);
        assert_eq!(Scalar::checked_sub(5u64, 7), None);
        assert_eq!(Scalar::checked_add(i64::MAX, 1), None);
        assert_eq!(Scalar::checked_add(3i64, 4), Some(7));
        assert_eq!(Scalar::checked_sub(f64::MAX, -f64::MAX), None);
        assert_eq!(Scalar::checked_sub(1.5f64, 0.5), Some(1.0));
    }

    #[test]
    fn u64_conversion_is_exact_for_integers() {
        assert_eq!((u64::MAX - 2).to_u64_saturating(), u64::MAX - 2);
        assert_eq!(i64::MAX.to_u64_saturating(), i64::MAX as u64);
        assert_eq!((-3i32).to_u64_saturating(), 0);
        assert_eq!(7.0f64.to_u64_saturating(), 7);
        assert_eq!(f64::NAN.to_u64_saturating(), 0);
    }

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(100u64, 10), 10);
        assert_eq!(ceil_div(101u64, 10), 11);
        assert_eq!(ceil_div(0i64, 10), 0);
        assert_eq!(ceil_div(2.5f64, 1.0), 3.0);
    }

    #[test]
    fn clamp_respects_bounds() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-1, 0, 10), 0);
        assert_eq!(clamp(11, 0, 10), 10);
        assert_eq!(clamp(0.5, 0.0, 0.25), 0.25);
    }
}
