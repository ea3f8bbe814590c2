//! The collaborator seam between the bridge and a hosted game engine.

use std::path::Path;

use pilot_config::InputPoint;
use serde_json::Value;

use crate::error::EngineError;
use crate::snapshot::{Choice, EngineIdentity, EngineSnapshot};

/// Live-state operations the bridge drives against a game engine.
///
/// Implementations are owned by a single thread (see [`crate::EngineThread`])
/// and are never called concurrently; `&mut self` receivers reflect that
/// every call may mutate engine state. Capability gaps are reported as
/// [`EngineError::Unsupported`] so the dispatcher can apply its fallback
/// strategies only when a facility is genuinely absent.
pub trait EngineControl: Send {
    /// Engine and game identity. Must not touch live dialogue state.
    fn identity(&self) -> EngineIdentity;

    /// Point-in-time read of label, speaker, dialogue, and choices.
    fn snapshot(&self) -> EngineSnapshot;

    /// Captions of the active choice menu; empty when none is shown.
    fn choices(&self) -> Vec<Choice>;

    /// Selects a menu entry by index.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoActiveChoice`] when no menu is shown and
    /// [`EngineError::ChoiceOutOfRange`] when the index falls outside it.
    fn select_choice(&mut self, index: i64) -> Result<usize, EngineError>;

    /// Advances dialogue through the engine's logical dismiss action.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unsupported`] when the engine has no dismiss
    /// facility; the dispatcher then falls back to synthetic input.
    fn advance_dialogue(&mut self) -> Result<(), EngineError>;

    /// Synthesizes a click/tap at the given point, or the engine's default
    /// when `point` is `None`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unsupported`] when input synthesis is unavailable.
    fn synthesize_input(&mut self, point: Option<InputPoint>) -> Result<(), EngineError>;

    /// Reads a variable, `None` when it does not exist.
    fn read_variable(&self, name: &str) -> Option<Value>;

    /// Writes a variable.
    ///
    /// # Errors
    ///
    /// [`EngineError::VariableNotSettable`] with a descriptive reason when
    /// the target refuses the write.
    fn write_variable(&mut self, name: &str, value: Value) -> Result<(), EngineError>;

    /// Captures a screenshot to `path` via the engine's own capture API.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unsupported`] when the engine cannot capture and
    /// [`EngineError::CaptureFailed`] when the attempt itself failed.
    fn capture_screenshot(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Transfers control to a script label.
    ///
    /// # Errors
    ///
    /// [`EngineError::LabelNotFound`] when the target does not exist.
    fn jump_to_label(&mut self, label: &str) -> Result<(), EngineError>;
}
