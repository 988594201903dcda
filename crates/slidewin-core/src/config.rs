#![forbid(unsafe_code)]

//! Controller configuration.
//!
//! [`WindowConfig`] carries the domain (bounds, window width, step, seed
//! strategy) chosen in code, plus [`ControllerOptions`]: the behavioral knobs
//! that hosts commonly tune at deploy time and may override from the
//! environment.
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `SLIDEWIN_SETTLE_MS` | `settle_delay` | milliseconds |
//! | `SLIDEWIN_THRESHOLD` | `threshold_fraction` | float in `[0, 0.5)` |
//! | `SLIDEWIN_DEFER_IDLE` | `defer_idle_shifts` | `1/0/true/false` |
//! | `SLIDEWIN_STALE_DRAG_MS` | `stale_drag_timeout` | milliseconds, `0` = off |
//! | `SLIDEWIN_PROJECTION` | `projection` | `global` or `window_relative` |

use std::env;
use std::time::Duration;

use crate::domain::{Domain, SeedStrategy};
use crate::error::{ConfigError, OptionsError};
use crate::scalar::Scalar;

pub const ENV_SETTLE_MS: &str = "SLIDEWIN_SETTLE_MS";
pub const ENV_THRESHOLD: &str = "SLIDEWIN_THRESHOLD";
pub const ENV_DEFER_IDLE: &str = "SLIDEWIN_DEFER_IDLE";
pub const ENV_STALE_DRAG_MS: &str = "SLIDEWIN_STALE_DRAG_MS";
pub const ENV_PROJECTION: &str = "SLIDEWIN_PROJECTION";

/// Default delay between drag release and applying a deferred shift.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// How the wrapped range primitive reports its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Projection {
    /// The primitive is configured with `[start, end]` and reports global values.
    #[default]
    Global,
    /// The primitive is configured with `[0, size]` and reports offsets from `start`.
    WindowRelative,
}

impl Projection {
    /// Parse `global` or `window_relative`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Some(Self::Global),
            "window_relative" | "window-relative" | "relative" => Some(Self::WindowRelative),
            _ => None,
        }
    }
}

/// Behavioral options for a [`WindowController`](crate::controller::WindowController).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerOptions {
    /// Hysteresis margin as a fraction of the window. `0` shifts exactly at
    /// the edge; `0.05` shifts once the value enters the outer 5%.
    pub threshold_fraction: f64,
    /// Delay between drag release (or the last idle change, when deferring)
    /// and applying the pending shift.
    pub settle_delay: Duration,
    /// Debounce idle shifts through the settle slot instead of applying them
    /// synchronously.
    pub defer_idle_shifts: bool,
    /// Treat a drag with no activity for this long as released. Recovers
    /// from release events that never reach the host.
    pub stale_drag_timeout: Option<Duration>,
    /// How primitive reports are projected back into the domain.
    pub projection: Projection,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.0,
            settle_delay: DEFAULT_SETTLE_DELAY,
            defer_idle_shifts: false,
            stale_drag_timeout: None,
            projection: Projection::Global,
        }
    }
}

/// Options parsed from the environment, with every rejected variable.
#[derive(Debug, Clone)]
pub struct OptionsParse {
    pub options: ControllerOptions,
    pub errors: Vec<OptionsError>,
}

impl ControllerOptions {
    /// Parse options from environment variables, ignoring bad values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().options
    }

    /// Parse options from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> OptionsParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse options through an arbitrary lookup.
    ///
    /// Unparseable or invalid values keep the default and are reported in
    /// [`OptionsParse::errors`].
    pub fn from_env_with<F>(mut get: F) -> OptionsParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_SETTLE_MS) {
            match value.trim().parse::<u64>() {
                Ok(ms) => options.settle_delay = Duration::from_millis(ms),
                Err(_) => errors.push(OptionsError::new(
                    "settle_delay",
                    value,
                    "expected milliseconds",
                )),
            }
        }

        if let Some(value) = get(ENV_THRESHOLD) {
            match value.trim().parse::<f64>() {
                Ok(t) if threshold_in_range(t) => options.threshold_fraction = t,
                Ok(_) => errors.push(OptionsError::new(
                    "threshold_fraction",
                    value,
                    "expected fraction in [0, 0.5)",
                )),
                Err(_) => errors.push(OptionsError::new(
                    "threshold_fraction",
                    value,
                    "expected float",
                )),
            }
        }

        if let Some(value) = get(ENV_DEFER_IDLE) {
            match parse_bool(&value) {
                Some(parsed) => options.defer_idle_shifts = parsed,
                None => errors.push(OptionsError::new(
                    "defer_idle_shifts",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        if let Some(value) = get(ENV_STALE_DRAG_MS) {
            match value.trim().parse::<u64>() {
                Ok(0) => options.stale_drag_timeout = None,
                Ok(ms) => options.stale_drag_timeout = Some(Duration::from_millis(ms)),
                Err(_) => errors.push(OptionsError::new(
                    "stale_drag_timeout",
                    value,
                    "expected milliseconds (0 disables)",
                )),
            }
        }

        if let Some(value) = get(ENV_PROJECTION) {
            match Projection::parse(&value) {
                Some(parsed) => options.projection = parsed,
                None => errors.push(OptionsError::new(
                    "projection",
                    value,
                    "expected global|window_relative",
                )),
            }
        }

        OptionsParse { options, errors }
    }

    /// Validate option constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold_fraction.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "threshold_fraction",
            });
        }
        if !threshold_in_range(self.threshold_fraction) {
            return Err(ConfigError::ThresholdOutOfRange {
                threshold: self.threshold_fraction,
            });
        }
        Ok(())
    }

    /// True when shifts trigger before the literal window edge.
    #[inline]
    #[must_use]
    pub fn has_hysteresis(&self) -> bool {
        self.threshold_fraction > 0.0
    }
}

fn threshold_in_range(t: f64) -> bool {
    (0.0..0.5).contains(&t)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Full construction config for a windowed range controller.
///
/// ```
/// use slidewin_core::config::WindowConfig;
/// use slidewin_core::domain::SeedStrategy;
/// use std::time::Duration;
///
/// let config = WindowConfig::new(0u64, 10_000_000, 20_000, SeedStrategy::Bucket)
///     .step(10_000)
///     .settle_delay(Duration::from_millis(200));
/// let domain = config.domain().unwrap();
/// assert_eq!(domain.step(), 10_000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig<T> {
    pub min: T,
    pub max: T,
    pub size: T,
    pub step: Option<T>,
    pub seed: SeedStrategy,
    pub options: ControllerOptions,
}

impl<T: Scalar> WindowConfig<T> {
    /// Domain `[min, max]` viewed through a `size`-wide window.
    #[must_use]
    pub fn new(min: T, max: T, size: T, seed: SeedStrategy) -> Self {
        Self {
            min,
            max,
            size,
            step: None,
            seed,
            options: ControllerOptions::default(),
        }
    }

    /// Shift granularity (defaults to `size / 2`).
    #[must_use]
    pub fn step(mut self, step: T) -> Self {
        self.step = Some(step);
        self
    }

    /// Replace all behavioral options.
    #[must_use]
    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Hysteresis margin as a window fraction.
    #[must_use]
    pub fn threshold(mut self, fraction: f64) -> Self {
        self.options.threshold_fraction = fraction;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.options.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn defer_idle_shifts(mut self, defer: bool) -> Self {
        self.options.defer_idle_shifts = defer;
        self
    }

    #[must_use]
    pub fn stale_drag_timeout(mut self, timeout: Duration) -> Self {
        self.options.stale_drag_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn projection(mut self, projection: Projection) -> Self {
        self.options.projection = projection;
        self
    }

    /// Validate options and build the domain.
    pub fn domain(&self) -> Result<Domain<T>, ConfigError> {
        self.options.validate()?;
        Domain::new(self.min, self.max, self.size, self.step)
    }
}
