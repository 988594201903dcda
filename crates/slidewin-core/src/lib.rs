#![forbid(unsafe_code)]

//! Core: window placement, drag gating, and settle scheduling for a
//! range control over a domain too large to manipulate at full resolution.
//!
//! Everything here is deterministic. Time is passed in as `now`, and
//! deferred work only runs when the host calls
//! [`WindowController::tick`](controller::WindowController::tick).

pub mod config;
pub mod controller;
pub mod domain;
pub mod drag_gate;
pub mod error;
pub mod logging;
pub mod projector;
pub mod scalar;
pub mod settle;

pub use config::{ControllerOptions, Projection, WindowConfig};
pub use controller::{
    ControllerState, PendingShift, ShiftDirection, ShiftPlan, ShiftRelease, WindowController,
    WindowSnapshot,
};
pub use domain::{Domain, SeedStrategy};
pub use error::{ConfigError, OptionsError};
pub use scalar::Scalar;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, trace, trace_span, warn};
