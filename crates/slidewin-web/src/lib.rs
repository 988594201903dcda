#![forbid(unsafe_code)]

//! `slidewin-web` adapts the window controller to a host-driven UI.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes pointer, focus,
//!   and value events; the binding answers with what to render and which
//!   listeners to install or remove.
//! - **Deterministic time**: the host passes `now` with every event and
//!   calls `Tick` to run deferred work.
//! - **No blocking, no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. A JS shim translates DOM
//! events into [`HostEvent`](binding::HostEvent)s and carries out the
//! returned [`ListenerCommand`](release::ListenerCommand)s.

pub mod binding;
pub mod release;

pub use binding::{BindingOutput, HostEvent, SliderBinding};
pub use release::{
    DragSignal, ExecutionContext, ListenerCommand, ListenerSignal, ReleaseDispatch,
    ReleaseIgnoredReason, ReleaseLogEntry, ReleaseLogOutcome, ReleasePhase, ReleaseRouter,
};
