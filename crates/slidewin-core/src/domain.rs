#![forbid(unsafe_code)]

//! Validated value domain and window placement primitives.
//!
//! A [`Domain`] is immutable for the lifetime of a controller. It owns the
//! bounds, the window width and the effective shift step, and answers the
//! pure placement questions (seed position, window end, bounds of `start`).
//!
//! # Invariants
//!
//! 1. `min < max`, and `max - min` is representable in `T`.
//! 2. `0 < size <= max - min`. A requested size at or above the span is
//!    stored as the span itself (the whole-domain window).
//! 3. `MIN_STEP <= step <= size`. A step wider than the window would skip
//!    values, so it is narrowed to the window width.

use crate::error::ConfigError;
use crate::scalar::{self, Scalar};

/// How the first window is placed around the initial value.
///
/// The two strategies change every later shift near the domain edges, so
/// there is deliberately no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SeedStrategy {
    /// The window is one cell of a fixed `size`-wide partition of the domain.
    Bucket,
    /// The window is centered on the value, clamped to the domain.
    Centered,
}

impl SeedStrategy {
    /// Parse a strategy name (`bucket` or `centered`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bucket" => Some(Self::Bucket),
            "centered" => Some(Self::Centered),
            _ => None,
        }
    }
}

/// Validated domain `[min, max]` with window width and shift step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain<T> {
    min: T,
    max: T,
    size: T,
    step: T,
    degenerate: bool,
}

impl<T: Scalar> Domain<T> {
    /// Validate bounds and derive the effective step.
    ///
    /// `step` defaults to `size / 2`.
    pub fn new(min: T, max: T, size: T, step: Option<T>) -> Result<Self, ConfigError> {
        for (field, value) in [("min", min), ("max", max), ("size", size)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }
        if let Some(step) = step
            && !step.is_finite()
        {
            return Err(ConfigError::NonFinite { field: "step" });
        }
        if !(min < max) {
            return Err(ConfigError::EmptyDomain {
                min: min.to_f64(),
                max: max.to_f64(),
            });
        }
        if !(size > T::ZERO) {
            return Err(ConfigError::NonPositiveSize {
                size: size.to_f64(),
            });
        }
        if let Some(step) = step
            && !(step > T::ZERO)
        {
            return Err(ConfigError::NonPositiveStep {
                step: step.to_f64(),
            });
        }

        let span = max.checked_sub(min).ok_or(ConfigError::SpanOverflow {
            min: min.to_f64(),
            max: max.to_f64(),
        })?;
        let degenerate = size >= span;
        let size = if degenerate { span } else { size };
        let requested = step.unwrap_or_else(|| size.half());
        let step = scalar::min(scalar::max(requested, T::MIN_STEP), size);

        Ok(Self {
            min,
            max,
            size,
            step,
            degenerate,
        })
    }

    #[inline]
    #[must_use]
    pub fn min(&self) -> T {
        self.min
    }

    #[inline]
    #[must_use]
    pub fn max(&self) -> T {
        self.max
    }

    /// Window width (equal to the span for a degenerate domain).
    #[inline]
    #[must_use]
    pub fn size(&self) -> T {
        self.size
    }

    /// Effective shift step.
    #[inline]
    #[must_use]
    pub fn step(&self) -> T {
        self.step
    }

    #[inline]
    #[must_use]
    pub fn span(&self) -> T {
        self.max - self.min
    }

    /// True when the window covers the whole domain and never shifts.
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Largest legal window start: `max - size`.
    #[inline]
    #[must_use]
    pub fn max_start(&self) -> T {
        self.max - self.size
    }

    /// Window end for a given start: `min(start + size, max)`.
    #[inline]
    #[must_use]
    pub fn end_of(&self, start: T) -> T {
        scalar::min(start + self.size, self.max)
    }

    /// Clamp an external value into `[min, max]`.
    #[inline]
    #[must_use]
    pub fn clamp_value(&self, value: T) -> T {
        scalar::clamp(value, self.min, self.max)
    }

    /// Clamp a candidate window start into `[min, max - size]`.
    #[inline]
    #[must_use]
    pub fn clamp_start(&self, start: T) -> T {
        scalar::clamp(start, self.min, self.max_start())
    }

    /// Upper bound on shift steps for any single update: `ceil(span / step)`.
    #[must_use]
    pub fn max_shift_steps(&self) -> T {
        scalar::ceil_div(self.span(), self.step)
    }

    /// Initial window start for `value` under the given strategy.
    #[must_use]
    pub fn seed_start(&self, value: T, strategy: SeedStrategy) -> T {
        if self.degenerate {
            return self.min;
        }
        let value = self.clamp_value(value);
        let offset = value - self.min;
        let start = match strategy {
            SeedStrategy::Bucket => self.min + offset.floor_div(self.size) * self.size,
            SeedStrategy::Centered => {
                let half = self.size.half();
                if offset <= half {
                    self.min
                } else {
                    value - half
                }
            }
        };
        self.clamp_start(start)
    }
}
