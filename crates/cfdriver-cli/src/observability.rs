//! Logging setup for the driver binary.
//!
//! Logs are written to stderr because stdout carries the NDJSON responses.
//! The subscriber starts at a bootstrap level and switches to the configured
//! level once the config file has been read, unless `RUST_LOG` is set.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER: OnceLock<FilterHandle> = OnceLock::new();

/// Directive the subscriber should run with: a parseable `RUST_LOG`, or the
/// configured level.
fn directive(rust_log: Option<&str>, level: &str) -> String {
    match rust_log {
        Some(env) if EnvFilter::try_new(env).is_ok() => env.to_string(),
        _ => level.to_string(),
    }
}

fn rust_log() -> Option<String> {
    std::env::var("RUST_LOG").ok()
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(bootstrap_level: &str) {
    let filter = EnvFilter::new(directive(rust_log().as_deref(), bootstrap_level));
    let (layer, handle) = reload::Layer::new(filter);
    if FILTER.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Switches to the level from the loaded configuration. Returns whether the
/// filter changed.
pub fn set_log_level(level: &str) -> bool {
    if rust_log().is_some() {
        return false;
    }
    let Some(handle) = FILTER.get() else {
        return false;
    };
    handle.modify(|f| *f = EnvFilter::new(level)).is_ok()
}
