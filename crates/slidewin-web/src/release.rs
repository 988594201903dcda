#![forbid(unsafe_code)]

//! Deterministic release routing for slider drags.
//!
//! A drag starts on the control, but its release can be observed in any
//! execution context the pointer ends up over: the frame hosting the
//! control, or an embedding parent once the pointer leaves an embedded
//! frame. [`ReleaseRouter`] multiplexes those sources so the
//! [`DragGate`](slidewin_core::drag_gate::DragGate) sees:
//! - one active pointer at a time,
//! - exactly one `End` per gesture, whichever context reports it first, and
//! - symmetric listener subscribe/unsubscribe commands for the host.

use std::fmt;

/// Where a signal was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExecutionContext {
    /// The frame hosting the control.
    Local,
    /// The parent across an embedding boundary.
    Embedder,
    /// Any further host-defined context.
    Other(u32),
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Embedder => f.write_str("embedder"),
            Self::Other(id) => write!(f, "other:{id}"),
        }
    }
}

/// Release-of-control signals the router listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ListenerSignal {
    PointerUp,
    PointerCancel,
    Blur,
}

impl ListenerSignal {
    /// Every signal, in subscription order.
    pub const ALL: [Self; 3] = [Self::PointerUp, Self::PointerCancel, Self::Blur];
}

/// Listener bookkeeping the host must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ListenerCommand {
    Subscribe {
        context: ExecutionContext,
        signal: ListenerSignal,
    },
    Unsubscribe {
        context: ExecutionContext,
        signal: ListenerSignal,
    },
}

/// Drag lifecycle signal for the window controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSignal {
    Begin { gesture: u64, pointer_id: u32 },
    /// `context` is `None` when the gesture ended without a release signal
    /// (teardown or expiry).
    End {
        gesture: u64,
        context: Option<ExecutionContext>,
    },
}

/// Lifecycle phase recorded for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePhase {
    Attach,
    Detach,
    PointerDown,
    PointerUp,
    PointerCancel,
    Blur,
    /// The controller gave up on a drag whose release never arrived.
    Expire,
}

/// Why an incoming signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseIgnoredReason {
    InvalidPointerId,
    /// No release listeners are installed, so a drag could never end.
    NotAttached,
    AlreadyAttached,
    /// The signal came from a context the router never subscribed to.
    UnknownContext,
    ActivePointerAlreadyInProgress,
    NoActivePointer,
    PointerMismatch,
    /// The gesture already ended; another context reported the same release.
    DuplicateRelease,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseLogOutcome {
    SignalForwarded,
    ListenersUpdated,
    Ignored(ReleaseIgnoredReason),
}

/// Structured record for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseLogEntry {
    pub phase: ReleasePhase,
    pub context: Option<ExecutionContext>,
    pub pointer_id: Option<u32>,
    pub gesture: Option<u64>,
    pub outcome: ReleaseLogOutcome,
}

/// Result of one router dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDispatch {
    pub signal: Option<DragSignal>,
    pub commands: Vec<ListenerCommand>,
    pub log: ReleaseLogEntry,
}

impl ReleaseDispatch {
    fn ignored(
        phase: ReleasePhase,
        reason: ReleaseIgnoredReason,
        context: Option<ExecutionContext>,
        pointer_id: Option<u32>,
    ) -> Self {
        slidewin_core::trace!(
            phase = ?phase,
            reason = ?reason,
            context = ?context,
            pointer_id = ?pointer_id,
            "release signal ignored"
        );
        Self {
            signal: None,
            commands: Vec::new(),
            log: ReleaseLogEntry {
                phase,
                context,
                pointer_id,
                gesture: None,
                outcome: ReleaseLogOutcome::Ignored(reason),
            },
        }
    }

    fn listeners(phase: ReleasePhase, commands: Vec<ListenerCommand>) -> Self {
        Self {
            signal: None,
            commands,
            log: ReleaseLogEntry {
                phase,
                context: None,
                pointer_id: None,
                gesture: None,
                outcome: ReleaseLogOutcome::ListenersUpdated,
            },
        }
    }

    /// True when the dispatch was dropped.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self.log.outcome, ReleaseLogOutcome::Ignored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveGesture {
    gesture: u64,
    pointer_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EndedGesture {
    gesture: u64,
    pointer_id: u32,
}

/// Multiplexes release signals from several execution contexts into one
/// begin/end pair per gesture.
#[derive(Debug, Clone, Default)]
pub struct ReleaseRouter {
    contexts: Vec<ExecutionContext>,
    active: Option<ActiveGesture>,
    ended: Option<EndedGesture>,
    next_gesture: u64,
}

impl ReleaseRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribed contexts, in attach order.
    #[must_use]
    pub fn contexts(&self) -> &[ExecutionContext] {
        &self.contexts
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.contexts.is_empty()
    }

    #[must_use]
    pub fn active_pointer_id(&self) -> Option<u32> {
        self.active.map(|active| active.pointer_id)
    }

    /// Number of gestures begun.
    #[must_use]
    pub fn gesture_count(&self) -> u64 {
        self.next_gesture
    }

    /// Install release listeners in every context. Every context gets the
    /// same signal set. Duplicate contexts are subscribed once.
    pub fn attach(&mut self, contexts: &[ExecutionContext]) -> ReleaseDispatch {
        if self.is_attached() {
            return ReleaseDispatch::ignored(
                ReleasePhase::Attach,
                ReleaseIgnoredReason::AlreadyAttached,
                None,
                None,
            );
        }
        for context in contexts {
            if !self.contexts.contains(context) {
                self.contexts.push(*context);
            }
        }
        let commands = self
            .contexts
            .iter()
            .flat_map(|&context| {
                ListenerSignal::ALL
                    .into_iter()
                    .map(move |signal| ListenerCommand::Subscribe { context, signal })
            })
            .collect::<Vec<_>>();
        slidewin_core::debug!(contexts = self.contexts.len(), "release listeners attached");
        ReleaseDispatch::listeners(ReleasePhase::Attach, commands)
    }

    /// Remove every listener [`attach`](Self::attach) installed. An in-flight
    /// gesture ends. Idempotent: a second call returns no commands.
    pub fn detach(&mut self) -> ReleaseDispatch {
        let commands = self
            .contexts
            .drain(..)
            .flat_map(|context| {
                ListenerSignal::ALL
                    .into_iter()
                    .map(move |signal| ListenerCommand::Unsubscribe { context, signal })
            })
            .collect::<Vec<_>>();
        let mut dispatch = ReleaseDispatch::listeners(ReleasePhase::Detach, commands);
        if let Some(active) = self.active.take() {
            dispatch.signal = Some(DragSignal::End {
                gesture: active.gesture,
                context: None,
            });
            dispatch.log.gesture = Some(active.gesture);
            dispatch.log.pointer_id = Some(active.pointer_id);
        }
        self.ended = None;
        if !dispatch.commands.is_empty() {
            slidewin_core::debug!("release listeners detached");
        }
        dispatch
    }

    /// A pointer pressed the control.
    pub fn pointer_down(&mut self, context: ExecutionContext, pointer_id: u32) -> ReleaseDispatch {
        let phase = ReleasePhase::PointerDown;
        if pointer_id == 0 {
            return ReleaseDispatch::ignored(
                phase,
                ReleaseIgnoredReason::InvalidPointerId,
                Some(context),
                Some(pointer_id),
            );
        }
        if !self.is_attached() {
            return ReleaseDispatch::ignored(
                phase,
                ReleaseIgnoredReason::NotAttached,
                Some(context),
                Some(pointer_id),
            );
        }
        if self.active.is_some() {
            return ReleaseDispatch::ignored(
                phase,
                ReleaseIgnoredReason::ActivePointerAlreadyInProgress,
                Some(context),
                Some(pointer_id),
            );
        }

        self.next_gesture = self.next_gesture.saturating_add(1);
        let gesture = self.next_gesture;
        self.active = Some(ActiveGesture {
            gesture,
            pointer_id,
        });
        self.ended = None;
        slidewin_core::debug!(gesture, pointer_id, context = %context, "gesture began");
        ReleaseDispatch {
            signal: Some(DragSignal::Begin {
                gesture,
                pointer_id,
            }),
            commands: Vec::new(),
            log: ReleaseLogEntry {
                phase,
                context: Some(context),
                pointer_id: Some(pointer_id),
                gesture: Some(gesture),
                outcome: ReleaseLogOutcome::SignalForwarded,
            },
        }
    }

    /// A pointer was released in `context`.
    pub fn pointer_up(&mut self, context: ExecutionContext, pointer_id: u32) -> ReleaseDispatch {
        self.release(ReleasePhase::PointerUp, context, Some(pointer_id))
    }

    /// The pointer stream was cancelled in `context`. `pointer_id` is
    /// `None` when the host cannot tell which pointer was lost.
    pub fn pointer_cancel(
        &mut self,
        context: ExecutionContext,
        pointer_id: Option<u32>,
    ) -> ReleaseDispatch {
        self.release(ReleasePhase::PointerCancel, context, pointer_id)
    }

    /// `context` lost focus.
    pub fn blur(&mut self, context: ExecutionContext) -> ReleaseDispatch {
        self.release(ReleasePhase::Blur, context, None)
    }

    /// Forget the active gesture without a release signal. Used when the
    /// drag was ended by a stale-drag timeout, so the next press can begin a
    /// new gesture. Late releases of the expired gesture count as duplicates.
    pub fn expire(&mut self) -> ReleaseDispatch {
        let phase = ReleasePhase::Expire;
        let Some(active) = self.active.take() else {
            return ReleaseDispatch::ignored(phase, ReleaseIgnoredReason::NoActivePointer, None, None);
        };
        self.ended = Some(EndedGesture {
            gesture: active.gesture,
            pointer_id: active.pointer_id,
        });
        slidewin_core::warn!(
            gesture = active.gesture,
            pointer_id = active.pointer_id,
            "gesture expired without release"
        );
        ReleaseDispatch {
            signal: Some(DragSignal::End {
                gesture: active.gesture,
                context: None,
            }),
            commands: Vec::new(),
            log: ReleaseLogEntry {
                phase,
                context: None,
                pointer_id: Some(active.pointer_id),
                gesture: Some(active.gesture),
                outcome: ReleaseLogOutcome::SignalForwarded,
            },
        }
    }

    fn release(
        &mut self,
        phase: ReleasePhase,
        context: ExecutionContext,
        pointer_id: Option<u32>,
    ) -> ReleaseDispatch {
        if !self.contexts.contains(&context) {
            return ReleaseDispatch::ignored(
                phase,
                ReleaseIgnoredReason::UnknownContext,
                Some(context),
                pointer_id,
            );
        }
        let Some(active) = self.active else {
            let duplicate = self
                .ended
                .filter(|ended| pointer_id.is_none_or(|id| id == ended.pointer_id));
            let Some(ended) = duplicate else {
                return ReleaseDispatch::ignored(
                    phase,
                    ReleaseIgnoredReason::NoActivePointer,
                    Some(context),
                    pointer_id,
                );
            };
            let mut dispatch = ReleaseDispatch::ignored(
                phase,
                ReleaseIgnoredReason::DuplicateRelease,
                Some(context),
                pointer_id,
            );
            dispatch.log.gesture = Some(ended.gesture);
            return dispatch;
        };
        if let Some(id) = pointer_id
            && id != active.pointer_id
        {
            return ReleaseDispatch::ignored(
                phase,
                ReleaseIgnoredReason::PointerMismatch,
                Some(context),
                Some(id),
            );
        }

        self.active = None;
        self.ended = Some(EndedGesture {
            gesture: active.gesture,
            pointer_id: active.pointer_id,
        });
        slidewin_core::debug!(
            gesture = active.gesture,
            phase = ?phase,
            context = %context,
            "gesture ended"
        );
        ReleaseDispatch {
            signal: Some(DragSignal::End {
                gesture: active.gesture,
                context: Some(context),
            }),
            commands: Vec::new(),
            log: ReleaseLogEntry {
                phase,
                context: Some(context),
                pointer_id: Some(active.pointer_id),
                gesture: Some(active.gesture),
                outcome: ReleaseLogOutcome::SignalForwarded,
            },
        }
    }
}
