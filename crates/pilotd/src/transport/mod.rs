//! TCP listener for the bridge control plane.
//!
//! The transport module binds the configured loopback endpoint, accepts
//! connections in a background thread, and hands each accepted socket to a
//! [`ConnectionHandler`] on its own thread, up to the configured cap.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::handler::ConnectionHandler;
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
