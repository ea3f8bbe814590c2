//! The Game Pilot bridge daemon.
//!
//! `pilotd` exposes a visual-novel engine over a loopback TCP control
//! plane: one JSON object per newline-terminated line, one response per
//! request, in request order. External processes use it to read dialogue
//! state, pick menu choices, set variables, advance dialogue, capture
//! screenshots, and jump between script labels.
//!
//! ## Architecture
//!
//! The [`transport`] module owns the listener: a non-blocking accept loop
//! on a background thread with a cooperative shutdown flag and a cap on
//! concurrently served connections. Each accepted socket gets its own
//! thread running the [`dispatch`] loop, which frames bytes into JSONL
//! requests and routes them through a command router.
//!
//! Engine state is only safe on the engine's own thread, so every
//! state-touching command is marshalled through a `pilot_engine`
//! [`pilot_engine::EngineHandle`]; concurrent requests serialize there in
//! arrival order. `ping` answers from captured identity without ever
//! touching the engine.
//!
//! The protocol is deliberately unauthenticated and relies on the
//! loopback-only default binding as its trust boundary; any process on the
//! same host can connect.

mod bootstrap;
mod capture;
mod dispatch;
mod telemetry;
mod transport;

pub use bootstrap::{Bridge, BootstrapError, ConfigLoader, SystemConfigLoader};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
