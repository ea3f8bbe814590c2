//! Shared configuration for the Game Pilot bridge binaries.
//!
//! Configuration is supplied once at startup from CLI flags and environment
//! variables and is immutable afterwards. The daemon and the CLI agree on
//! the [`TcpEndpoint`] notation (`tcp://host:port`) so both sides can be
//! pointed at the same listener.

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

mod defaults;
mod endpoint;
mod logging;
mod point;

pub use defaults::{
    DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_MAX_CONNECTIONS, DEFAULT_TCP_PORT,
    default_endpoint, default_log_filter,
};
pub use endpoint::{EndpointParseError, TcpEndpoint};
pub use logging::{LogFormat, LogFormatParseError};
pub use point::{InputPoint, PointParseError};

/// Startup configuration for the bridge daemon.
///
/// None of these values are mutable at runtime; restarting the daemon is
/// the only way to change them.
#[derive(Debug, Clone, Parser)]
#[command(name = "pilotd", about = "Visual-novel control bridge daemon")]
pub struct Config {
    /// Listener endpoint, e.g. `tcp://127.0.0.1:47201`.
    #[arg(long, env = "PILOT_ENDPOINT", default_value_t = defaults::default_endpoint())]
    pub endpoint: TcpEndpoint,

    /// Seconds a connection may stay silent before it is closed.
    #[arg(long, env = "PILOT_IDLE_TIMEOUT", default_value_t = defaults::DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,

    /// Cap on concurrently served connections; further ones are refused.
    #[arg(long, env = "PILOT_MAX_CONNECTIONS", default_value_t = defaults::DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// Variable names the `state` command is allowed to report.
    #[arg(long = "state-variable", env = "PILOT_STATE_VARIABLES", value_delimiter = ',')]
    pub state_variables: Vec<String>,

    /// Title the demo engine reports through `ping` and its snapshots.
    #[arg(long, env = "PILOT_GAME_TITLE", default_value = "Untitled Story")]
    pub game_title: String,

    /// Fallback screen point for synthetic input, as `x,y`.
    #[arg(long, env = "PILOT_INPUT_POINT")]
    pub input_point: Option<InputPoint>,

    /// Log filter expression (tracing `EnvFilter` syntax).
    #[arg(long, env = "PILOT_LOG_FILTER", default_value = defaults::DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Log output format.
    #[arg(long, env = "PILOT_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an argument fails to parse. Help and
    /// version requests surface as errors too; callers decide how to exit.
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_parse().map_err(ConfigError::from)
    }

    /// Loads configuration from an explicit argument iterator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an argument fails to parse.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ConfigError::from)
    }

    /// Idle timeout as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: defaults::default_endpoint(),
            idle_timeout_secs: defaults::DEFAULT_IDLE_TIMEOUT_SECS,
            max_connections: defaults::DEFAULT_MAX_CONNECTIONS,
            state_variables: Vec::new(),
            game_title: "Untitled Story".to_owned(),
            input_point: None,
            log_filter: defaults::DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Argument parsing failed (includes help/version requests).
    #[error(transparent)]
    Arguments(#[from] clap::Error),
}
