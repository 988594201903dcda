#![forbid(unsafe_code)]

//! Scenario replay for the windowed range controller.
//!
//! A [`Scenario`] is a JSON document describing a domain, an initial value
//! and a list of host events stamped with milliseconds since start. Replay
//! drives a [`SliderBinding`] on a synthetic clock and records one
//! [`SnapshotRecord`] per event, so the same scenario always yields the same
//! JSONL output.
//!
//! # Scenario Format
//!
//! ```json
//! {
//!   "name": "edge_shift",
//!   "domain": { "min": 0, "max": 100000, "size": 20000, "step": 10000, "seed": "bucket" },
//!   "initial": 0,
//!   "events": [
//!     { "at_ms": 0, "kind": "external_value", "value": 21000 },
//!     { "at_ms": 200, "kind": "tick" }
//!   ]
//! }
//! ```

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slidewin_core::{
    ConfigError, ControllerOptions, Projection, SeedStrategy, ShiftDirection, WindowConfig,
};
use slidewin_web::{ExecutionContext, HostEvent, ReleaseLogOutcome, SliderBinding};
use web_time::Instant;

/// Harness error type.
#[derive(Debug)]
pub enum HarnessError {
    Io(io::Error),
    Json(serde_json::Error),
    Config(ConfigError),
    /// Event timestamps must be non-decreasing.
    TimeWentBackwards { index: usize, at_ms: u64, previous_ms: u64 },
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "invalid scenario json: {err}"),
            Self::Config(err) => write!(f, "invalid window config: {err}"),
            Self::TimeWentBackwards {
                index,
                at_ms,
                previous_ms,
            } => write!(
                f,
                "event {index} at {at_ms}ms precedes previous event at {previous_ms}ms"
            ),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::TimeWentBackwards { .. } => None,
        }
    }
}

impl From<io::Error> for HarnessError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Domain section of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub min: f64,
    pub max: f64,
    pub size: f64,
    #[serde(default)]
    pub step: Option<f64>,
    pub seed: SeedStrategy,
}

/// Option overrides. Unset fields keep the base options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsSpec {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub settle_ms: Option<u64>,
    #[serde(default)]
    pub defer_idle_shifts: Option<bool>,
    /// `0` disables stale-drag recovery.
    #[serde(default)]
    pub stale_drag_ms: Option<u64>,
    #[serde(default)]
    pub projection: Option<Projection>,
}

impl OptionsSpec {
    /// Apply the overrides on top of `base`.
    #[must_use]
    pub fn apply(&self, mut base: ControllerOptions) -> ControllerOptions {
        if let Some(threshold) = self.threshold {
            base.threshold_fraction = threshold;
        }
        if let Some(ms) = self.settle_ms {
            base.settle_delay = Duration::from_millis(ms);
        }
        if let Some(defer) = self.defer_idle_shifts {
            base.defer_idle_shifts = defer;
        }
        if let Some(ms) = self.stale_drag_ms {
            base.stale_drag_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(projection) = self.projection {
            base.projection = projection;
        }
        base
    }
}

/// One host event at a point on the synthetic clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: HostEvent<f64>,
}

fn default_contexts() -> Vec<ExecutionContext> {
    vec![ExecutionContext::Local]
}

/// A replayable scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub domain: DomainSpec,
    #[serde(default)]
    pub options: OptionsSpec,
    pub initial: f64,
    /// Contexts whose release listeners are installed before the first event.
    #[serde(default = "default_contexts")]
    pub contexts: Vec<ExecutionContext>,
    pub events: Vec<TimedEvent>,
}

impl Scenario {
    /// Parse a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self, HarnessError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Window config for this scenario on top of `base` options.
    #[must_use]
    pub fn config(&self, base: ControllerOptions) -> WindowConfig<f64> {
        let d = &self.domain;
        let mut config =
            WindowConfig::new(d.min, d.max, d.size, d.seed).options(self.options.apply(base));
        if let Some(step) = d.step {
            config = config.step(step);
        }
        config
    }
}

/// Applied shift, as recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub direction: ShiftDirection,
    pub from: f64,
    pub to: f64,
    pub steps: u64,
}

/// Observable state after one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub seq: u64,
    pub at_ms: u64,
    pub event: String,
    pub start: f64,
    pub end: f64,
    pub value: f64,
    pub primitive_value: f64,
    pub remount_key: u64,
    pub dragging: bool,
    pub pending_target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shift: Option<ShiftRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub commit: Option<f64>,
    /// Why the router dropped a release signal, if it did.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ignored: Option<String>,
}

/// Stable name of a host event for records.
#[must_use]
pub fn event_name<T>(event: &HostEvent<T>) -> &'static str {
    match event {
        HostEvent::PointerDown { .. } => "pointer_down",
        HostEvent::PointerUp { .. } => "pointer_up",
        HostEvent::PointerCancel { .. } => "pointer_cancel",
        HostEvent::Blur { .. } => "blur",
        HostEvent::PrimitiveChange { .. } => "primitive_change",
        HostEvent::ExternalValue { .. } => "external_value",
        HostEvent::Tick => "tick",
    }
}

/// Replay `scenario` with default base options.
pub fn replay(scenario: &Scenario) -> Result<Vec<SnapshotRecord>, HarnessError> {
    replay_with(scenario, ControllerOptions::default())
}

/// Replay `scenario` with `base` options under its overrides.
pub fn replay_with(
    scenario: &Scenario,
    base: ControllerOptions,
) -> Result<Vec<SnapshotRecord>, HarnessError> {
    let mut binding = SliderBinding::new(scenario.config(base), scenario.initial)?;
    let origin = Instant::now();
    binding.mount(&scenario.contexts);
    tracing::info!(
        scenario = %scenario.name,
        events = scenario.events.len(),
        "replaying scenario"
    );

    let mut records = Vec::with_capacity(scenario.events.len());
    let mut previous_ms = 0;
    for (index, timed) in scenario.events.iter().enumerate() {
        if timed.at_ms < previous_ms {
            return Err(HarnessError::TimeWentBackwards {
                index,
                at_ms: timed.at_ms,
                previous_ms,
            });
        }
        previous_ms = timed.at_ms;

        let now = origin + Duration::from_millis(timed.at_ms);
        let output = binding.handle(timed.event, now);
        let controller = binding.controller();
        let ignored = output.release_log.and_then(|log| match log.outcome {
            ReleaseLogOutcome::Ignored(reason) => Some(format!("{reason:?}")),
            _ => None,
        });
        records.push(SnapshotRecord {
            seq: index as u64,
            at_ms: timed.at_ms,
            event: event_name(&timed.event).to_string(),
            start: output.snapshot.start,
            end: output.snapshot.end,
            value: output.snapshot.value,
            primitive_value: output.primitive_value,
            remount_key: output.remount_key,
            dragging: controller.is_dragging(),
            pending_target: controller.pending_shift().map(|p| p.target_start),
            shift: output.applied.map(|plan| ShiftRecord {
                direction: plan.direction,
                from: plan.from,
                to: plan.target_start,
                steps: plan.steps,
            }),
            commit: output.commit,
            ignored,
        });
    }

    let end = origin + Duration::from_millis(previous_ms);
    binding.dispose(end);
    Ok(records)
}

/// Render records as JSON lines.
pub fn to_jsonl(records: &[SnapshotRecord]) -> Result<String, HarnessError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EDGE: &str = r#"{
        "name": "edge",
        "domain": { "min": 0, "max": 100000, "size": 20000, "step": 10000, "seed": "bucket" },
        "initial": 0,
        "events": [
            { "at_ms": 0, "kind": "external_value", "value": 15000 },
            { "at_ms": 5, "kind": "external_value", "value": 21000 }
        ]
    }"#;

    #[test]
    fn parses_scenario_with_defaults() {
        let scenario = Scenario::from_json(EDGE).expect("valid scenario");
        assert_eq!(scenario.contexts, vec![ExecutionContext::Local]);
        assert_eq!(scenario.options, OptionsSpec::default());
        assert_eq!(scenario.events.len(), 2);
        assert_eq!(
            scenario.events[1].event,
            HostEvent::ExternalValue { value: 21_000.0 }
        );
    }

    #[test]
    fn replay_records_each_event() {
        let scenario = Scenario::from_json(EDGE).expect("valid scenario");
        let records = replay(&scenario).expect("replay");
        let windows: Vec<_> = records.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(windows, vec![(0.0, 20_000.0), (10_000.0, 30_000.0)]);
        assert!(records[0].shift.is_none());
        assert_eq!(
            records[1].shift,
            Some(ShiftRecord {
                direction: ShiftDirection::Forward,
                from: 0.0,
                to: 10_000.0,
                steps: 1,
            })
        );
    }

    #[test]
    fn options_override_base() {
        let spec = OptionsSpec {
            settle_ms: Some(0),
            stale_drag_ms: Some(0),
            ..OptionsSpec::default()
        };
        let base = ControllerOptions {
            stale_drag_timeout: Some(Duration::from_secs(1)),
            ..ControllerOptions::default()
        };
        let options = spec.apply(base);
        assert_eq!(options.settle_delay, Duration::ZERO);
        assert_eq!(options.stale_drag_timeout, None);
        assert_eq!(options.threshold_fraction, 0.0);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let text = EDGE.replace(r#""initial": 0,"#, r#""initial": 0, "options": { "settle": 1 },"#);
        assert!(matches!(
            Scenario::from_json(&text),
            Err(HarnessError::Json(_))
        ));
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let text = EDGE.replace(r#""at_ms": 5"#, r#""at_ms": 0"#).replace(
            r#""at_ms": 0, "kind": "external_value", "value": 15000"#,
            r#""at_ms": 9, "kind": "external_value", "value": 15000"#,
        );
        let scenario = Scenario::from_json(&text).expect("valid json");
        let err = replay(&scenario).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::TimeWentBackwards {
                index: 1,
                at_ms: 0,
                previous_ms: 9
            }
        ));
    }

    #[test]
    fn invalid_domain_is_a_config_error() {
        let text = EDGE.replace(r#""size": 20000"#, r#""size": 0"#);
        let scenario = Scenario::from_json(&text).expect("valid json");
        assert!(matches!(
            replay(&scenario),
            Err(HarnessError::Config(ConfigError::NonPositiveSize { .. }))
        ));
    }

    #[test]
    fn jsonl_has_one_line_per_record() {
        let scenario = Scenario::from_json(EDGE).expect("valid scenario");
        let records = replay(&scenario).expect("replay");
        let jsonl = to_jsonl(&records).expect("serialize");
        assert_eq!(jsonl.lines().count(), 2);
        let parsed: SnapshotRecord =
            serde_json::from_str(jsonl.lines().nth(1).expect("second line")).expect("parse");
        assert_eq!(parsed, records[1]);
    }
}
