#![forbid(unsafe_code)]

//! Error types.
//!
//! Only construction can fail. Runtime input is never an error: out-of-range
//! values are clamped and non-finite values are ignored.

use core::fmt;

/// Fatal configuration error raised when building a domain or controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `min >= max`.
    EmptyDomain { min: f64, max: f64 },
    /// `max - min` does not fit the domain's numeric type.
    SpanOverflow { min: f64, max: f64 },
    /// `size <= 0`.
    NonPositiveSize { size: f64 },
    /// `step <= 0`.
    NonPositiveStep { step: f64 },
    /// A bound, size or step is NaN or infinite.
    NonFinite { field: &'static str },
    /// Hysteresis threshold outside `[0, 0.5)`.
    ThresholdOutOfRange { threshold: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomain { min, max } => {
                write!(f, "empty domain: min ({min}) must be below max ({max})")
            }
            Self::SpanOverflow { min, max } => {
                write!(f, "domain span from {min} to {max} overflows the value type")
            }
            Self::NonPositiveSize { size } => {
                write!(f, "window size must be positive, got {size}")
            }
            Self::NonPositiveStep { step } => {
                write!(f, "window step must be positive, got {step}")
            }
            Self::NonFinite { field } => write!(f, "{field} must be finite"),
            Self::ThresholdOutOfRange { threshold } => {
                write!(f, "threshold fraction must be in [0, 0.5), got {threshold}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Option parse error with field context (environment overrides).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl OptionsError {
    pub(crate) fn new(
        field: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for OptionsError {}
