//! Error taxonomy for collaborator calls.

use thiserror::Error;

/// Errors reported by an [`crate::EngineControl`] implementation.
///
/// Every variant renders to a human-readable message suitable for an
/// `{ok:false, error}` response line. [`EngineError::Unsupported`] is the
/// only variant that licences a fallback strategy in the dispatcher;
/// anything else means the operation itself failed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No choice menu is currently on screen.
    #[error("No active choice")]
    NoActiveChoice,

    /// A choice index fell outside the active menu.
    #[error("Index {index} out of range (0-{})", .count.saturating_sub(1))]
    ChoiceOutOfRange {
        /// The index the caller asked for.
        index: i64,
        /// Number of entries in the active menu.
        count: usize,
    },

    /// The requested jump target does not exist in the script.
    #[error("Label '{label}' not found")]
    LabelNotFound {
        /// The missing label.
        label: String,
    },

    /// The named variable cannot be written.
    #[error("Variable '{name}' is not settable: {reason}")]
    VariableNotSettable {
        /// The variable the caller tried to write.
        name: String,
        /// Why the engine refused the write.
        reason: String,
    },

    /// Screenshot capture failed; the detail is reported verbatim.
    #[error("{0}")]
    CaptureFailed(String),

    /// The engine lacks this capability entirely.
    #[error("engine does not support {feature}")]
    Unsupported {
        /// The missing capability.
        feature: &'static str,
    },
}

impl EngineError {
    /// Whether this error signals a missing capability rather than a
    /// failed operation.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
