//! Tracing setup for the bridge daemon.
//!
//! Log output goes to stderr so the control socket's stdout stays free for
//! anything a host process wants to do with it. The format and filter come
//! from [`Config`]; everything else is fixed.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{Subscriber as FmtSubscriber, time::UtcTime};

use pilot_config::{Config, LogFormat};

static TELEMETRY_INSTALLED: OnceCell<()> = OnceCell::new();

/// Marker returned once telemetry is live.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another subscriber is already registered globally.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first call.
///
/// Later calls see the guard already set and return a fresh
/// [`TelemetryHandle`] without touching global state, so embedding hosts
/// and tests may call this freely.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter fails to parse or a
/// subscriber is already installed by other means.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_INSTALLED
        .get_or_try_init(|| install(config))
        .map(|()| TelemetryHandle)
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(&config.log_filter)?;
    let base = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let outcome = match config.log_format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(base.json().flatten_event(true).finish())
        }
        LogFormat::Compact => tracing::subscriber::set_global_default(base.compact().finish()),
    };
    outcome.map_err(TelemetryError::Subscriber)
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter(error.to_string()))
}
