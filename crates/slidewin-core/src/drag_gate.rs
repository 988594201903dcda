#![forbid(unsafe_code)]

//! Drag gating for window shifts.
//!
//! [`DragGate`] answers "is the user currently manipulating the control?"
//! and owns the single pending-shift slot. While a drag is active, shifts
//! are held; on release they are armed to apply after the settle delay.
//!
//! The gate expects exactly one `begin`/`end` pair per gesture. Hosts whose
//! release can arrive in another execution context (an embedding parent,
//! say) must multiplex those sources before calling the gate; see
//! `slidewin_web::release`.
//!
//! # State Machine
//!
//! ```text
//!            begin                      end
//!   Idle ───────────▶ Dragging ───────────────▶ Idle (+ armed slot)
//!    ▲                   │  ▲                       │
//!    │                   │  └──── begin (disarm) ───┘
//!    └─── poll/clear ────┘
//! ```
//!
//! # Invariants
//!
//! 1. `begin` while active and `end` while inactive are no-ops.
//! 2. Nothing is delivered by [`poll`](DragGate::poll) while active.
//! 3. A new drag disarms the settle timer but keeps the pending payload,
//!    which is re-armed by the next `end`.
//! 4. After [`reset`](DragGate::reset) the gate is inactive and empty.

use std::time::Duration;

use web_time::Instant;

use crate::settle::SettleSlot;

#[inline]
fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier)
        .unwrap_or(Duration::ZERO)
}

/// Drag activity tracker with a single deferred payload.
#[derive(Debug, Clone)]
pub struct DragGate<P> {
    active: bool,
    last_activity: Option<Instant>,
    settle_delay: Duration,
    slot: SettleSlot<P>,
    gestures: u64,
}

impl<P> DragGate<P> {
    /// Create an inactive gate.
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            active: false,
            last_activity: None,
            settle_delay,
            slot: SettleSlot::new(),
            gestures: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    #[must_use]
    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Number of gestures begun (diagnostic).
    #[inline]
    #[must_use]
    pub fn gesture_count(&self) -> u64 {
        self.gestures
    }

    /// Mark the start of a drag. Returns `false` if already active.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.last_activity = Some(now);
        self.gestures += 1;
        self.slot.disarm();
        true
    }

    /// Mark the end of a drag and arm any pending payload to fire after
    /// the settle delay. Returns `false` if not active.
    pub fn end(&mut self, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.last_activity = Some(now);
        self.slot.arm(now + self.settle_delay);
        true
    }

    /// Record activity within the current drag.
    pub fn touch(&mut self, now: Instant) {
        if self.active {
            self.last_activity = Some(now);
        }
    }

    /// Hold a payload until the drag ends. Returns the superseded one.
    pub fn defer(&mut self, payload: P) -> Option<P> {
        self.slot.hold(payload)
    }

    /// Store a payload that fires at `deadline` (idle debounce). Returns the
    /// superseded one.
    pub fn schedule(&mut self, payload: P, deadline: Instant) -> Option<P> {
        self.slot.schedule(payload, deadline)
    }

    /// Drop the pending payload.
    pub fn clear(&mut self) -> Option<P> {
        self.slot.cancel()
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<&P> {
        self.slot.pending()
    }

    /// Firing time of the pending payload, if armed.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.slot.deadline()
    }

    /// Deliver the pending payload if released and due.
    pub fn poll(&mut self, now: Instant) -> Option<P> {
        if self.active {
            return None;
        }
        self.slot.poll(now)
    }

    /// True when a drag has been active without activity for longer than
    /// `timeout`.
    #[must_use]
    pub fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        match (self.active, self.last_activity) {
            (true, Some(last)) => duration_since_or_zero(now, last) > timeout,
            _ => false,
        }
    }

    /// Return to inactive with nothing pending.
    pub fn reset(&mut self) {
        self.active = false;
        self.last_activity = None;
        self.slot.cancel();
    }
}
