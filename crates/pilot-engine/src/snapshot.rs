//! Point-in-time views of engine state exposed to the bridge.

use serde::{Deserialize, Serialize};

/// One entry of an active choice menu.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Choice {
    /// Zero-based position within the menu.
    pub index: usize,
    /// Caption shown to the player.
    pub caption: String,
}

/// A read of the engine's current dialogue position.
///
/// Owned by the engine and produced inside the marshalled closure; the
/// network layer never holds a live reference into engine internals.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Script label currently executing, when known.
    pub label: Option<String>,
    /// Speaker of the line on screen, when a character is speaking.
    pub speaker: Option<String>,
    /// Dialogue text on screen.
    pub dialogue: Option<String>,
    /// Active choice menu, empty when none is shown.
    pub choices: Vec<Choice>,
}

/// Identity reported by `ping` without touching live engine state.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EngineIdentity {
    /// Engine implementation identifier.
    pub engine: String,
    /// Title of the hosted game.
    pub game: String,
}

/// How a dialogue advance was achieved.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AdvanceMethod {
    /// The engine's logical dismiss action.
    Dismiss,
    /// A synthesized click at the configured or default point.
    SyntheticInput,
}

/// How a screenshot was captured.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMethod {
    /// The engine's own capture API.
    Engine,
    /// An OS-level capture utility.
    OsUtility,
}
