#![forbid(unsafe_code)]

//! Windowed range controller.
//!
//! [`WindowController`] keeps one `size`-wide window positioned inside the
//! domain so the tracked value is always representable, and reconciles
//! window movement with an active drag through a [`DragGate`].
//!
//! # Shift Rule
//!
//! Let `t` be the hysteresis fraction, `upper = end - size*t` and
//! `lower = start + size*t` (with `t = 0` these are the window edges).
//!
//! - **Forward**: the value moved up and reached `upper` (`value >= end` at
//!   `t = 0`), or lies strictly above `end`. `start` advances by `step` until
//!   `value < start + size - size*t`, clamped to `max - size`.
//! - **Backward**: the value moved down and reached `lower` (`value <= start`
//!   at `t = 0`), or lies strictly below `start`. `start` retreats by `step`
//!   until `value > start + size*t`, clamped to `min`.
//! - A repeated value never shifts.
//!
//! The number of steps is computed in closed form, so a jump across the
//! whole domain costs the same as a one-step shift. The reported step count
//! never exceeds `ceil((max - min) / step)`.
//!
//! With `t > 0` a shift leaves the value strictly between the new triggers.
//! When a whole number of steps would land it on or past the far trigger
//! (a step wider than `size - 2*size*t`), the window is centered on the
//! value instead.
//!
//! A value strictly outside the window can only be observed after a shift
//! was held back by a drag or a settle delay; the outside case realigns the
//! window toward the value whichever direction it arrived from.
//!
//! # Gating
//!
//! | Situation | Shift is |
//! |-----------|----------|
//! | drag active | held until release, then applied after `settle_delay` |
//! | idle, `defer_idle_shifts` | debounced to `now + settle_delay` |
//! | release settling | replaced, keeping the existing deadline |
//! | idle | applied synchronously |
//!
//! When the latest value needs no shift, any pending shift is dropped.
//!
//! # Invariants
//!
//! 1. `min <= start <= max - size` and `end = min(start + size, max)`.
//! 2. The snapshot value lies in `[start, end]`.
//! 3. Nothing mutates the window after [`dispose`](WindowController::dispose).

use web_time::Instant;

use crate::config::{ControllerOptions, WindowConfig};
use crate::domain::{Domain, SeedStrategy};
use crate::drag_gate::DragGate;
use crate::error::ConfigError;
use crate::projector::{self, ClampProjector};
use crate::scalar::{self, Scalar};

/// Read-only view of the window handed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSnapshot<T> {
    pub start: T,
    pub end: T,
    /// External value clamped into `[start, end]`.
    pub value: T,
}

/// Direction of a planned shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShiftDirection {
    Forward,
    Backward,
}

/// A computed window move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftPlan<T> {
    pub direction: ShiftDirection,
    /// Window start the plan was computed against.
    pub from: T,
    pub target_start: T,
    /// Single-step moves the shift is equivalent to.
    pub steps: u64,
}

/// When a pending shift is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftRelease {
    /// Waiting for the current drag to end.
    OnDragEnd,
    /// Applies at the next `tick` at or after this instant.
    At(Instant),
}

/// A deferred window move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingShift<T> {
    pub target_start: T,
    pub release: ShiftRelease,
}

/// Controller state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState<T> {
    Idle,
    ShiftPending(PendingShift<T>),
}

/// Stateful window placement for one wrapped range primitive.
#[derive(Debug, Clone)]
pub struct WindowController<T> {
    domain: Domain<T>,
    options: ControllerOptions,
    seed: SeedStrategy,
    projector: ClampProjector,
    start: T,
    value: T,
    gate: DragGate<ShiftPlan<T>>,
    last_plan: Option<ShiftPlan<T>>,
    shifts: u64,
    disposed: bool,
}

impl<T: Scalar> WindowController<T> {
    /// Validate `config` and seed the window around `initial`.
    pub fn new(config: WindowConfig<T>, initial: T) -> Result<Self, ConfigError> {
        let domain = config.domain()?;
        if !initial.is_finite() {
            return Err(ConfigError::NonFinite { field: "initial" });
        }
        let value = domain.clamp_value(initial);
        let start = domain.seed_start(value, config.seed);
        crate::debug!(
            min = %domain.min(),
            max = %domain.max(),
            size = %domain.size(),
            step = %domain.step(),
            start = %start,
            seed = ?config.seed,
            "window controller created"
        );
        Ok(Self {
            projector: ClampProjector::new(config.options.projection),
            gate: DragGate::new(config.options.settle_delay),
            options: config.options,
            seed: config.seed,
            domain,
            start,
            value,
            last_plan: None,
            shifts: 0,
            disposed: false,
        })
    }

    #[inline]
    #[must_use]
    pub fn domain(&self) -> &Domain<T> {
        &self.domain
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    #[inline]
    #[must_use]
    pub fn seed_strategy(&self) -> SeedStrategy {
        self.seed
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> T {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> T {
        self.domain.end_of(self.start)
    }

    /// Last accepted external value (clamped to the domain, not the window).
    #[inline]
    #[must_use]
    pub fn external_value(&self) -> T {
        self.value
    }

    /// Current window and clamped value.
    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot<T> {
        let end = self.end();
        WindowSnapshot {
            start: self.start,
            end,
            value: projector::to_window_local(self.value, self.start, end),
        }
    }

    /// Value to hand the wrapped primitive, in its own coordinates.
    #[must_use]
    pub fn primitive_value(&self) -> T {
        self.projector
            .to_primitive(self.value, self.start, self.end())
    }

    #[must_use]
    pub fn state(&self) -> ControllerState<T> {
        match self.pending_shift() {
            Some(pending) => ControllerState::ShiftPending(pending),
            None => ControllerState::Idle,
        }
    }

    /// The deferred shift, if any.
    #[must_use]
    pub fn pending_shift(&self) -> Option<PendingShift<T>> {
        let plan = self.gate.pending()?;
        let release = match self.gate.deadline() {
            Some(at) => ShiftRelease::At(at),
            None => ShiftRelease::OnDragEnd,
        };
        Some(PendingShift {
            target_start: plan.target_start,
            release,
        })
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.gate.is_active()
    }

    #[inline]
    #[must_use]
    pub fn drag_gate(&self) -> &DragGate<ShiftPlan<T>> {
        &self.gate
    }

    /// Number of applied shifts. Renderers can use it as a remount key for
    /// the wrapped primitive.
    #[inline]
    #[must_use]
    pub fn shift_count(&self) -> u64 {
        self.shifts
    }

    /// The most recently applied plan.
    #[inline]
    #[must_use]
    pub fn last_plan(&self) -> Option<ShiftPlan<T>> {
        self.last_plan
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Track a new external value.
    pub fn on_value_change(&mut self, value: T, now: Instant) -> WindowSnapshot<T> {
        if self.disposed {
            return self.snapshot();
        }
        if !value.is_finite() {
            crate::debug!(value = %value, "ignoring non-finite value");
            return self.snapshot();
        }
        let clamped = self.domain.clamp_value(value);
        if clamped != value {
            crate::trace!(value = %value, clamped = %clamped, "value clamped into domain");
        }
        self.gate.touch(now);

        let previous = self.value;
        if clamped == previous {
            return self.snapshot();
        }
        self.value = clamped;

        let plan = self.plan_from(previous, clamped);
        if self.gate.is_active() {
            match plan {
                Some(plan) => {
                    crate::debug!(target_start = %plan.target_start, "shift held during drag");
                    self.gate.defer(plan);
                }
                None => {
                    self.gate.clear();
                }
            }
        } else if self.options.defer_idle_shifts {
            match plan {
                Some(plan) => {
                    self.gate
                        .schedule(plan, now + self.options.settle_delay);
                }
                None => {
                    self.gate.clear();
                }
            }
        } else if let Some(deadline) = self.gate.deadline() {
            // Release is still settling; the newer plan keeps its deadline.
            match plan {
                Some(plan) => {
                    self.gate.schedule(plan, deadline);
                }
                None => {
                    self.gate.clear();
                }
            }
        } else {
            self.gate.clear();
            if let Some(plan) = plan {
                self.apply(plan);
            }
        }
        self.snapshot()
    }

    /// Track a value reported by the wrapped primitive.
    pub fn on_primitive_change(&mut self, raw: T, now: Instant) -> WindowSnapshot<T> {
        let global = self.projector.from_primitive(raw, self.start);
        self.on_value_change(global, now)
    }

    /// The user pressed the control.
    pub fn on_drag_begin(&mut self, now: Instant) -> WindowSnapshot<T> {
        if !self.disposed && self.gate.begin(now) {
            crate::debug!(pending = self.gate.pending().is_some(), "drag began");
        }
        self.snapshot()
    }

    /// The user released the control.
    pub fn on_drag_end(&mut self, now: Instant) -> WindowSnapshot<T> {
        if !self.disposed && self.gate.end(now) {
            crate::debug!(pending = self.gate.pending().is_some(), "drag ended");
            self.flush(now);
        }
        self.snapshot()
    }

    /// Advance deferred work to `now`. Returns the plan applied, if any.
    pub fn tick(&mut self, now: Instant) -> Option<ShiftPlan<T>> {
        if self.disposed {
            return None;
        }
        if let Some(timeout) = self.options.stale_drag_timeout
            && self.gate.is_stale(now, timeout)
        {
            crate::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "drag release never arrived; ending drag"
            );
            self.gate.end(now);
        }
        self.flush(now)
    }

    /// Cancel pending work and detach from all inputs. Idempotent; returns
    /// `true` on the first call.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.gate.reset();
        self.disposed = true;
        crate::debug!(shifts = self.shifts, "window controller disposed");
        true
    }

    /// Plan the shift a move to `value` would cause from the current window.
    #[must_use]
    pub fn plan(&self, value: T) -> Option<ShiftPlan<T>> {
        if !value.is_finite() {
            return None;
        }
        self.plan_from(self.value, self.domain.clamp_value(value))
    }

    fn flush(&mut self, now: Instant) -> Option<ShiftPlan<T>> {
        let plan = self.gate.poll(now)?;
        self.apply(plan);
        Some(plan)
    }

    fn apply(&mut self, plan: ShiftPlan<T>) {
        let span = crate::debug_span!("window_shift", shift = self.shifts + 1);
        let _guard = span.enter();
        let target = self.domain.clamp_start(plan.target_start);
        crate::debug!(
            from = %self.start,
            to = %target,
            steps = plan.steps,
            direction = ?plan.direction,
            "window shifted"
        );
        self.start = target;
        self.shifts += 1;
        self.last_plan = Some(plan);
    }

    fn plan_from(&self, previous: T, value: T) -> Option<ShiftPlan<T>> {
        let domain = &self.domain;
        if domain.is_degenerate() || value == previous {
            return None;
        }
        let start = self.start;
        let size = domain.size();
        let end = start + size;
        let margin = size.scale(self.options.threshold_fraction);
        let upper = end - margin;
        let lower = start + margin;
        let forward = value > previous;

        if (forward && value >= upper) || value > end {
            self.plan_forward(value, upper, margin)
        } else if (!forward && value <= lower) || value < start {
            self.plan_backward(value, lower, margin)
        } else {
            None
        }
    }

    fn plan_forward(&self, value: T, upper: T, margin: T) -> Option<ShiftPlan<T>> {
        let domain = &self.domain;
        let start = self.start;
        let step = domain.step();
        let room = domain.max_start() - start;
        if !(room > T::ZERO) {
            return None;
        }
        // Smallest n >= 1 with value < upper + n*step.
        let n = (value - upper).floor_div(step) + T::ONE;
        let mut target = if n >= scalar::ceil_div(room, step) {
            domain.max_start()
        } else {
            start + n * step
        };
        // With hysteresis the value must end strictly above the new lower
        // trigger. A step wider than the trigger band cannot guarantee that.
        if margin > T::ZERO && !(target + margin < value) {
            target = domain.seed_start(value, SeedStrategy::Centered);
        }
        if !(target > start) {
            return None;
        }
        Some(ShiftPlan {
            direction: ShiftDirection::Forward,
            from: start,
            target_start: target,
            steps: scalar::ceil_div(target - start, step).to_u64_saturating(),
        })
    }

    fn plan_backward(&self, value: T, lower: T, margin: T) -> Option<ShiftPlan<T>> {
        let domain = &self.domain;
        let start = self.start;
        let step = domain.step();
        let room = start - domain.min();
        if !(room > T::ZERO) {
            return None;
        }
        // Smallest n >= 1 with value > lower - n*step.
        let n = (lower - value).floor_div(step) + T::ONE;
        let mut target = if n >= scalar::ceil_div(room, step) {
            domain.min()
        } else {
            start - n * step
        };
        // Mirror of the forward rule: strictly below the new upper trigger.
        if margin > T::ZERO && !(value + margin < target + domain.size()) {
            target = domain.seed_start(value, SeedStrategy::Centered);
        }
        if !(target < start) {
            return None;
        }
        Some(ShiftPlan {
            direction: ShiftDirection::Backward,
            from: start,
            target_start: target,
            steps: scalar::ceil_div(start - target, step).to_u64_saturating(),
        })
    }
}
