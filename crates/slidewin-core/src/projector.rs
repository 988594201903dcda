#![forbid(unsafe_code)]

//! Mapping between domain-global values and window-local values.
//!
//! Stateless. The projector never rounds; callers snap to a step grid
//! themselves when they need to.

use crate::config::Projection;
use crate::scalar::{self, Scalar};

/// Clamp a global value into the window `[start, end]`.
///
/// Total for `start <= end`: the result always lies inside the window.
#[inline]
#[must_use]
pub fn to_window_local<T: Scalar>(value: T, start: T, end: T) -> T {
    scalar::clamp(value, start, end)
}

/// Convert a window-relative position reported by a zero-based primitive
/// back into a domain-global value.
#[inline]
#[must_use]
pub fn to_global<T: Scalar>(local: T, start: T) -> T {
    start + local
}

/// Projection adapter for one wrapped primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClampProjector {
    projection: Projection,
}

impl ClampProjector {
    #[must_use]
    pub const fn new(projection: Projection) -> Self {
        Self { projection }
    }

    #[must_use]
    pub const fn projection(&self) -> Projection {
        self.projection
    }

    /// Value reported by the primitive, as a domain-global value.
    #[inline]
    #[must_use]
    pub fn from_primitive<T: Scalar>(&self, raw: T, start: T) -> T {
        match self.projection {
            Projection::Global => raw,
            Projection::WindowRelative => to_global(raw, start),
        }
    }

    /// Value to hand the primitive for a global value and window.
    #[inline]
    #[must_use]
    pub fn to_primitive<T: Scalar>(&self, value: T, start: T, end: T) -> T {
        let local = to_window_local(value, start, end);
        match self.projection {
            Projection::Global => local,
            Projection::WindowRelative => local - start,
        }
    }
}
