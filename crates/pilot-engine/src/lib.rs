//! Collaborator seam for the Game Pilot bridge.
//!
//! The bridge daemon never talks to a game engine directly; it drives the
//! [`EngineControl`] trait, which a host implements over its live state.
//! Because engine state is only safe to touch from one logical thread, all
//! access goes through the marshalling shim: [`EngineThread`] owns the
//! engine and [`EngineHandle`] runs closures on it, one at a time, in
//! arrival order.
//!
//! [`ScriptedEngine`] is the in-memory implementation powering the demo
//! binary and the behavioural tests.

mod control;
mod error;
mod scripted;
mod shim;
mod snapshot;

pub use control::EngineControl;
pub use error::EngineError;
pub use scripted::ScriptedEngine;
pub use shim::{EngineHandle, EngineThread, ShimError};
pub use snapshot::{AdvanceMethod, CaptureMethod, Choice, EngineIdentity, EngineSnapshot};
