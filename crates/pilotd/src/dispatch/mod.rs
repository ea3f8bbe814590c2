//! JSONL command dispatch for the bridge.
//!
//! Each connected client sends one JSON object per newline-terminated line
//! and receives exactly one response line per request, in request order:
//!
//! ```json
//! {"cmd":"choose","index":1}
//! {"ok":true,"chosen":1}
//! ```
//!
//! Framing errors and command failures are reported in-band as
//! `{"ok":false,"error":...}` lines; the connection stays open. Only a
//! transport-level I/O failure closes a connection, and never any other.
//!
//! Commands that read or mutate engine state run inside a marshalled
//! closure on the engine thread; `ping` never leaves the connection
//! thread.

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub(crate) use self::handler::BridgeConnectionHandler;
pub(crate) use self::router::CommandRouter;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
