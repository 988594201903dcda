#![forbid(unsafe_code)]

//! Single-slot cancellable deferred task.
//!
//! [`SettleSlot`] holds at most one payload and an optional deadline. It is
//! the only deferral primitive in the crate: drag-release settling and idle
//! debouncing both go through it.
//!
//! The slot owns no thread or OS timer. The host polls it with the current
//! time, so once a slot is cancelled nothing can fire from it later.
//!
//! # Invariants
//!
//! 1. At most one payload exists; storing a new one returns the old one.
//! 2. A deadline exists only while a payload exists.
//! 3. `poll` yields a payload at most once, and only when `now >= deadline`.

use web_time::Instant;

/// One pending payload with an optional firing deadline.
#[derive(Debug, Clone)]
pub struct SettleSlot<P> {
    payload: Option<P>,
    deadline: Option<Instant>,
}

impl<P> Default for SettleSlot<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SettleSlot<P> {
    /// Create an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            payload: None,
            deadline: None,
        }
    }

    /// Hold a payload without a deadline (waits for [`arm`](Self::arm)).
    ///
    /// Returns the superseded payload, if any.
    pub fn hold(&mut self, payload: P) -> Option<P> {
        self.deadline = None;
        self.payload.replace(payload)
    }

    /// Store a payload that fires at `deadline`.
    ///
    /// Returns the superseded payload, if any.
    pub fn schedule(&mut self, payload: P, deadline: Instant) -> Option<P> {
        self.deadline = Some(deadline);
        self.payload.replace(payload)
    }

    /// Arm the held payload to fire at `deadline`. Returns `false` when
    /// the slot is empty.
    pub fn arm(&mut self, deadline: Instant) -> bool {
        if self.payload.is_none() {
            return false;
        }
        self.deadline = Some(deadline);
        true
    }

    /// Stop the timer but keep the payload. Returns `true` if a timer was armed.
    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Drop the payload and its timer.
    pub fn cancel(&mut self) -> Option<P> {
        self.deadline = None;
        self.payload.take()
    }

    /// Take the payload if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<P> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.payload.take()
            }
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn empty_slot_never_fires() {
        let mut slot: SettleSlot<u32> = SettleSlot::new();
        let t = Instant::now();
        assert!(slot.is_empty());
        assert!(!slot.arm(t));
        assert_eq!(slot.poll(t + ms(1_000)), None);
    }

    #[test]
    fn scheduled_payload_fires_at_deadline() {
        let mut slot = SettleSlot::new();
        let t = Instant::now();
        slot.schedule(7, t + ms(150));
        assert_eq!(slot.poll(t + ms(149)), None);
        assert_eq!(slot.poll(t + ms(150)), Some(7));
        assert!(slot.is_empty());
        assert!(!slot.is_armed());
        assert_eq!(slot.poll(t + ms(500)), None);
    }

    #[test]
    fn held_payload_waits_for_arm() {
        let mut slot = SettleSlot::new();
        let t = Instant::now();
        slot.hold("shift");
        assert_eq!(slot.poll(t + ms(10_000)), None);
        assert!(slot.arm(t + ms(100)));
        assert_eq!(slot.poll(t + ms(100)), Some("shift"));
    }

    #[test]
    fn newer_payload_supersedes_older() {
        let mut slot = SettleSlot::new();
        let t = Instant::now();
        assert_eq!(slot.schedule(1, t + ms(10)), None);
        assert_eq!(slot.schedule(2, t + ms(20)), Some(1));
        assert_eq!(slot.poll(t + ms(15)), None);
        assert_eq!(slot.poll(t + ms(20)), Some(2));
    }

    #[test]
    fn hold_clears_an_armed_deadline() {
        let mut slot = SettleSlot::new();
        let t = Instant::now();
        slot.schedule(1, t + ms(10));
        slot.hold(2);
        assert!(!slot.is_armed());
        assert_eq!(slot.poll(t + ms(50)), None);
        assert_eq!(slot.pending(), Some(&2));
    }

    #[test]
    fn disarm_keeps_payload() {
        let mut slot = SettleSlot::new();
        let t = Instant::now();
        slot.schedule(9, t + ms(10));
        assert!(slot.disarm());
        assert!(!slot.disarm());
        assert_eq!(slot.poll(t + ms(50)), None);
        assert_eq!(slot.pending(), Some(&9));
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut slot = SettleSlot::new();
        let t = Instant::now();
        slot.schedule(3, t + ms(10));
        assert_eq!(slot.cancel(), Some(3));
        assert_eq!(slot.cancel(), None);
        assert_eq!(slot.poll(t + ms(50)), None);
        assert_eq!(slot.deadline(), None);
    }
}
