//! Error types for request parsing and dispatch.
//!
//! Every variant except the transport ones renders to an in-band
//! `{ok:false, error}` response and leaves the connection open; transport
//! failures close the one affected connection and nothing else.

use std::io;

use thiserror::Error;

use pilot_engine::{EngineError, ShimError};

/// Errors surfaced during request parsing and dispatch.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    /// Frame could not be parsed as a JSON command.
    #[error("Invalid JSON: {detail}")]
    InvalidJson { detail: String },

    /// `cmd` named an operation outside the fixed table.
    #[error("Unknown command: {cmd}")]
    UnknownCommand { cmd: String },

    /// A known command carried arguments of the wrong shape.
    #[error("Invalid arguments for {cmd}: {detail}")]
    InvalidArguments { cmd: String, detail: String },

    /// The collaborator reported a command failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The marshalling shim could not reach the engine.
    #[error(transparent)]
    Shim(#[from] ShimError),

    /// A frame exceeded the request size limit.
    #[error("Request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// Transport-level I/O failure; connection-local and fatal to it.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialization failed; treated as connection-fatal.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl DispatchError {
    /// Whether this error must close the connection instead of being
    /// reported in-band.
    pub(crate) const fn is_connection_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::SerializeResponse(_))
    }

    pub(crate) fn invalid_json(detail: impl Into<String>) -> Self {
        Self::InvalidJson {
            detail: detail.into(),
        }
    }

    pub(crate) fn unknown_command(cmd: impl Into<String>) -> Self {
        Self::UnknownCommand { cmd: cmd.into() }
    }

    pub(crate) fn invalid_arguments(cmd: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidArguments {
            cmd: cmd.into(),
            detail: detail.into(),
        }
    }

    pub(crate) const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_render_verbatim() {
        let error = DispatchError::from(EngineError::NoActiveChoice);
        assert_eq!(error.to_string(), "No active choice");
    }

    #[test]
    fn only_transport_errors_close_the_connection() {
        assert!(DispatchError::from(io::Error::other("broken pipe")).is_connection_fatal());
        assert!(!DispatchError::invalid_json("oops").is_connection_fatal());
        assert!(!DispatchError::unknown_command("reboot").is_connection_fatal());
        assert!(!DispatchError::from(ShimError::EngineGone).is_connection_fatal());
    }
}
