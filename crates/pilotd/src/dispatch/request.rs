//! Request deserialization for the dispatch loop.
//!
//! Requests carry a `cmd` field selecting the operation plus
//! handler-specific arguments. Parsing happens in two stages: the line is
//! first read as a generic JSON value so an unrecognised `cmd` can be
//! reported as `Unknown command: <cmd>` rather than a schema error, then
//! converted into the typed [`Command`].

use serde::Deserialize;
use serde_json::Value;

use super::errors::DispatchError;

/// The fixed table of operations the dispatcher accepts.
pub(crate) const KNOWN_COMMANDS: [&str; 9] = [
    "ping",
    "state",
    "choices",
    "choose",
    "advance",
    "variables",
    "set_variable",
    "screenshot",
    "jump",
];

/// A parsed command message.
///
/// Argument defaults mirror the wire contract: a `choose` without an index
/// targets entry 0, a `variables` without names reads nothing, and so on.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub(crate) enum Command {
    /// Liveness check; never touches engine state.
    Ping,
    /// Full snapshot plus the allow-listed variables.
    State,
    /// Active choice menu captions.
    Choices,
    /// Select a menu entry.
    Choose {
        #[serde(default)]
        index: i64,
    },
    /// Advance dialogue, falling back to synthetic input.
    Advance,
    /// Read variables by name; unknown names map to null.
    Variables {
        #[serde(default)]
        names: Vec<String>,
    },
    /// Write one variable.
    SetVariable {
        #[serde(default)]
        name: String,
        #[serde(default)]
        value: Value,
    },
    /// Capture a screenshot, falling back to an OS utility.
    Screenshot {
        #[serde(default)]
        path: Option<String>,
    },
    /// Transfer control to a script label.
    Jump {
        #[serde(default)]
        label: String,
    },
}

impl Command {
    /// Parses one frame into a typed command.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed
    /// before parsing.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidJson`] for unparseable frames,
    /// [`DispatchError::UnknownCommand`] for a `cmd` outside the fixed
    /// table, and [`DispatchError::InvalidArguments`] when a known command
    /// carries arguments of the wrong shape.
    pub(crate) fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(DispatchError::invalid_json("empty request line"));
        }
        let value: Value = serde_json::from_slice(trimmed)
            .map_err(|error| DispatchError::invalid_json(error.to_string()))?;
        let cmd = value
            .get("cmd")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| DispatchError::invalid_json("missing 'cmd' field"))?;
        if !KNOWN_COMMANDS.contains(&cmd.as_str()) {
            return Err(DispatchError::unknown_command(cmd));
        }
        serde_json::from_value(value)
            .map_err(|error| DispatchError::invalid_arguments(cmd, error.to_string()))
    }
}

/// Trims trailing ASCII whitespace from a byte slice.
pub(crate) fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}
