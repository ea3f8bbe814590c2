//! Error types for the bridge listener.
//!
//! A failed bind is the one condition the daemon surfaces loudly: a
//! silently-absent listener is worse than a visible startup failure.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host/port resolution failed.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Resolution produced no usable address.
    #[error("no addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },

    /// The bind itself failed, e.g. the port is already taken.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The listener socket could not switch to non-blocking accepts.
    #[error("failed to configure non-blocking accepts: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },

    /// The accept-loop thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
