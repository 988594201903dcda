#![forbid(unsafe_code)]

//! Scenario replay CLI.
//!
//! # Running
//!
//! ```sh
//! cargo run -p slidewin-harness -- crates/slidewin-harness/scenarios/drag_settle.json
//! ```
//!
//! Prints one JSON snapshot per event to stdout. Logs go to stderr and are
//! filtered with `SLIDEWIN_LOG` (e.g. `SLIDEWIN_LOG=slidewin_core=debug`).
//! Controller options are read from the `SLIDEWIN_*` variables first; the
//! scenario's `options` block overrides them.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use slidewin_core::ControllerOptions;
use slidewin_harness::{HarnessError, Scenario, replay_with, to_jsonl};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "SLIDEWIN_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(paths: &[PathBuf]) -> Result<(), HarnessError> {
    let parsed = ControllerOptions::from_env_with_diagnostics();
    for error in &parsed.errors {
        tracing::warn!(field = error.field, value = %error.value, "{}", error.message);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in paths {
        let scenario = Scenario::load(path)?;
        let records = replay_with(&scenario, parsed.options.clone())?;
        out.write_all(to_jsonl(&records)?.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: slidewin-harness <scenario.json>...");
        return ExitCode::from(2);
    }

    match run(&paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("slidewin-harness: {err}");
            ExitCode::FAILURE
        }
    }
}
