#![forbid(unsafe_code)]

//! Host-facing slider binding.
//!
//! [`SliderBinding`] pairs one [`WindowController`] with one
//! [`ReleaseRouter`]. The host forwards raw events with the current time and
//! applies what comes back: the window to configure the primitive with,
//! listener commands, and on release the value to commit.

use slidewin_core::{
    ConfigError, Scalar, ShiftPlan, WindowConfig, WindowController, WindowSnapshot,
};
use web_time::Instant;

use crate::release::{
    DragSignal, ExecutionContext, ListenerCommand, ReleaseDispatch, ReleaseLogEntry, ReleaseRouter,
};

/// Event pushed by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum HostEvent<T> {
    PointerDown {
        context: ExecutionContext,
        pointer_id: u32,
    },
    PointerUp {
        context: ExecutionContext,
        pointer_id: u32,
    },
    PointerCancel {
        context: ExecutionContext,
        pointer_id: Option<u32>,
    },
    Blur {
        context: ExecutionContext,
    },
    /// The wrapped primitive reported a value, in its own coordinates.
    PrimitiveChange { value: T },
    /// The value changed outside the control.
    ExternalValue { value: T },
    /// Advance deferred work.
    Tick,
}

/// What the host should apply after one event.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingOutput<T> {
    pub snapshot: WindowSnapshot<T>,
    /// Value to hand the primitive, in its own coordinates.
    pub primitive_value: T,
    /// Changes whenever the window moves.
    pub remount_key: u64,
    pub commands: Vec<ListenerCommand>,
    /// Final value of a finished drag.
    pub commit: Option<T>,
    /// Shift applied while handling the event.
    pub applied: Option<ShiftPlan<T>>,
    pub release_log: Option<ReleaseLogEntry>,
}

/// One wrapped range control.
#[derive(Debug, Clone)]
pub struct SliderBinding<T> {
    controller: WindowController<T>,
    router: ReleaseRouter,
    disposed: bool,
}

impl<T: Scalar> SliderBinding<T> {
    pub fn new(config: WindowConfig<T>, initial: T) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: WindowController::new(config, initial)?,
            router: ReleaseRouter::new(),
            disposed: false,
        })
    }

    #[must_use]
    pub fn controller(&self) -> &WindowController<T> {
        &self.controller
    }

    #[must_use]
    pub fn router(&self) -> &ReleaseRouter {
        &self.router
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Install release listeners in `contexts`.
    pub fn mount(&mut self, contexts: &[ExecutionContext]) -> BindingOutput<T> {
        if self.disposed {
            return self.output(Vec::new(), None, None, None);
        }
        let dispatch = self.router.attach(contexts);
        self.output(dispatch.commands, None, None, Some(dispatch.log))
    }

    /// Handle one host event at `now`.
    pub fn handle(&mut self, event: HostEvent<T>, now: Instant) -> BindingOutput<T> {
        if self.disposed {
            return self.output(Vec::new(), None, None, None);
        }
        match event {
            HostEvent::PointerDown {
                context,
                pointer_id,
            } => {
                let dispatch = self.router.pointer_down(context, pointer_id);
                self.route(dispatch, now)
            }
            HostEvent::PointerUp {
                context,
                pointer_id,
            } => {
                let dispatch = self.router.pointer_up(context, pointer_id);
                self.route(dispatch, now)
            }
            HostEvent::PointerCancel {
                context,
                pointer_id,
            } => {
                let dispatch = self.router.pointer_cancel(context, pointer_id);
                self.route(dispatch, now)
            }
            HostEvent::Blur { context } => {
                let dispatch = self.router.blur(context);
                self.route(dispatch, now)
            }
            HostEvent::PrimitiveChange { value } => {
                let before = self.controller.shift_count();
                self.controller.on_primitive_change(value, now);
                let applied = self.applied_since(before);
                self.output(Vec::new(), None, applied, None)
            }
            HostEvent::ExternalValue { value } => {
                let before = self.controller.shift_count();
                self.controller.on_value_change(value, now);
                let applied = self.applied_since(before);
                self.output(Vec::new(), None, applied, None)
            }
            HostEvent::Tick => {
                let was_dragging = self.controller.is_dragging();
                let applied = self.controller.tick(now);
                if was_dragging && !self.controller.is_dragging() {
                    // Stale-drag timeout fired; the router still holds the pointer.
                    let dispatch = self.router.expire();
                    let commit = Some(self.controller.external_value());
                    return self.output(dispatch.commands, commit, applied, Some(dispatch.log));
                }
                self.output(Vec::new(), None, applied, None)
            }
        }
    }

    /// Remove listeners and stop the controller. Idempotent; later calls
    /// return no commands.
    pub fn dispose(&mut self, now: Instant) -> BindingOutput<T> {
        if self.disposed {
            return self.output(Vec::new(), None, None, None);
        }
        let dispatch = self.router.detach();
        if dispatch.signal.is_some() {
            self.controller.on_drag_end(now);
        }
        self.controller.dispose();
        self.disposed = true;
        self.output(dispatch.commands, None, None, Some(dispatch.log))
    }

    fn route(&mut self, dispatch: ReleaseDispatch, now: Instant) -> BindingOutput<T> {
        let before = self.controller.shift_count();
        let commit = match dispatch.signal {
            Some(DragSignal::Begin { .. }) => {
                self.controller.on_drag_begin(now);
                None
            }
            Some(DragSignal::End { .. }) => {
                self.controller.on_drag_end(now);
                Some(self.controller.external_value())
            }
            None => None,
        };
        let applied = self.applied_since(before);
        self.output(dispatch.commands, commit, applied, Some(dispatch.log))
    }

    fn applied_since(&self, before: u64) -> Option<ShiftPlan<T>> {
        if self.controller.shift_count() > before {
            self.controller.last_plan()
        } else {
            None
        }
    }

    fn output(
        &self,
        commands: Vec<ListenerCommand>,
        commit: Option<T>,
        applied: Option<ShiftPlan<T>>,
        release_log: Option<ReleaseLogEntry>,
    ) -> BindingOutput<T> {
        BindingOutput {
            snapshot: self.controller.snapshot(),
            primitive_value: self.controller.primitive_value(),
            remount_key: self.controller.shift_count(),
            commands,
            commit,
            applied,
            release_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{ListenerSignal, ReleaseIgnoredReason, ReleaseLogOutcome};
    use pretty_assertions::assert_eq;
    use slidewin_core::SeedStrategy;
    use std::time::Duration;

    const BOTH: [ExecutionContext; 2] = [ExecutionContext::Local, ExecutionContext::Embedder];

    fn binding(initial: u64) -> SliderBinding<u64> {
        let config = WindowConfig::new(0, 100_000, 20_000, SeedStrategy::Bucket).step(10_000);
        let mut binding = SliderBinding::new(config, initial).expect("valid config");
        binding.mount(&BOTH);
        binding
    }

    fn window(output: &BindingOutput<u64>) -> (u64, u64) {
        (output.snapshot.start, output.snapshot.end)
    }

    #[test]
    fn mount_returns_subscriptions() {
        let config = WindowConfig::new(0u64, 100, 10, SeedStrategy::Bucket);
        let mut binding = SliderBinding::new(config, 0).expect("valid config");
        let output = binding.mount(&[ExecutionContext::Local]);
        assert_eq!(
            output.commands,
            ListenerSignal::ALL
                .into_iter()
                .map(|signal| ListenerCommand::Subscribe {
                    context: ExecutionContext::Local,
                    signal,
                })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn drag_across_frames_commits_once_and_shifts_after_settle() {
        let mut b = binding(15_000);
        let t = Instant::now();

        b.handle(
            HostEvent::PointerDown {
                context: ExecutionContext::Local,
                pointer_id: 1,
            },
            t,
        );
        let moved = b.handle(HostEvent::PrimitiveChange { value: 25_000 }, t);
        assert_eq!(window(&moved), (0, 20_000));
        assert_eq!(moved.snapshot.value, 20_000);

        let released = b.handle(
            HostEvent::PointerUp {
                context: ExecutionContext::Embedder,
                pointer_id: 1,
            },
            t + Duration::from_millis(30),
        );
        assert_eq!(released.commit, Some(25_000));

        let echoed = b.handle(
            HostEvent::PointerUp {
                context: ExecutionContext::Local,
                pointer_id: 1,
            },
            t + Duration::from_millis(31),
        );
        assert_eq!(echoed.commit, None);
        assert_eq!(
            echoed.release_log.map(|log| log.outcome),
            Some(ReleaseLogOutcome::Ignored(
                ReleaseIgnoredReason::DuplicateRelease
            ))
        );

        let settled = b.handle(HostEvent::Tick, t + Duration::from_millis(180));
        assert_eq!(window(&settled), (10_000, 30_000));
        assert_eq!(settled.remount_key, 1);
        assert_eq!(settled.applied.map(|plan| plan.target_start), Some(10_000));
    }

    #[test]
    fn external_value_shifts_immediately_when_idle() {
        let mut b = binding(0);
        let output = b.handle(HostEvent::ExternalValue { value: 21_000 }, Instant::now());
        assert_eq!(window(&output), (10_000, 30_000));
        assert!(output.applied.is_some());
        assert_eq!(output.commit, None);
    }

    #[test]
    fn dispose_unsubscribes_once() {
        let mut b = binding(0);
        let t = Instant::now();
        let first = b.dispose(t);
        assert_eq!(first.commands.len(), 6);
        assert!(
            first
                .commands
                .iter()
                .all(|command| matches!(command, ListenerCommand::Unsubscribe { .. }))
        );
        let second = b.dispose(t);
        assert!(second.commands.is_empty());
        assert!(b.controller().is_disposed());

        let ignored = b.handle(HostEvent::ExternalValue { value: 90_000 }, t);
        assert_eq!(window(&ignored), (0, 20_000));
    }

    #[test]
    fn dispose_mid_drag_drops_pending_shift() {
        let mut b = binding(15_000);
        let t = Instant::now();
        b.handle(
            HostEvent::PointerDown {
                context: ExecutionContext::Local,
                pointer_id: 1,
            },
            t,
        );
        b.handle(HostEvent::PrimitiveChange { value: 25_000 }, t);
        b.dispose(t);
        let after = b.handle(HostEvent::Tick, t + Duration::from_secs(5));
        assert_eq!(window(&after), (0, 20_000));
        assert!(!b.controller().is_dragging());
    }
}
