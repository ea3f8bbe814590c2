//! Response serialization for the dispatch loop.
//!
//! Every reply is one JSON object on one line, `{"ok":true,...}` on
//! success and `{"ok":false,"error":...}` on failure, flushed per line so
//! pipelined callers see responses as they are produced.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use pilot_engine::{AdvanceMethod, CaptureMethod, Choice, EngineIdentity, EngineSnapshot};

use super::errors::DispatchError;

/// One response line, success or failure.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Reply {
    Ping {
        ok: bool,
        engine: String,
        game: String,
    },
    State {
        ok: bool,
        label: Option<String>,
        speaker: Option<String>,
        dialogue: Option<String>,
        choices: Vec<Choice>,
        variables: Map<String, Value>,
    },
    Choices {
        ok: bool,
        choices: Vec<Choice>,
    },
    Chosen {
        ok: bool,
        chosen: usize,
    },
    Advanced {
        ok: bool,
        method: AdvanceMethod,
    },
    Variables {
        ok: bool,
        variables: Map<String, Value>,
    },
    VariableSet {
        ok: bool,
        name: String,
        value: Value,
    },
    Screenshot {
        ok: bool,
        path: String,
        method: CaptureMethod,
    },
    Jumped {
        ok: bool,
        label: String,
    },
    Error {
        ok: bool,
        error: String,
    },
}

impl Reply {
    pub(crate) fn ping(identity: EngineIdentity) -> Self {
        Self::Ping {
            ok: true,
            engine: identity.engine,
            game: identity.game,
        }
    }

    pub(crate) fn state(snapshot: EngineSnapshot, variables: Map<String, Value>) -> Self {
        Self::State {
            ok: true,
            label: snapshot.label,
            speaker: snapshot.speaker,
            dialogue: snapshot.dialogue,
            choices: snapshot.choices,
            variables,
        }
    }

    pub(crate) fn choices(choices: Vec<Choice>) -> Self {
        Self::Choices { ok: true, choices }
    }

    pub(crate) const fn chosen(chosen: usize) -> Self {
        Self::Chosen { ok: true, chosen }
    }

    pub(crate) const fn advanced(method: AdvanceMethod) -> Self {
        Self::Advanced { ok: true, method }
    }

    pub(crate) fn variables(variables: Map<String, Value>) -> Self {
        Self::Variables {
            ok: true,
            variables,
        }
    }

    pub(crate) fn variable_set(name: String, value: Value) -> Self {
        Self::VariableSet {
            ok: true,
            name,
            value,
        }
    }

    pub(crate) fn screenshot(path: String, method: CaptureMethod) -> Self {
        Self::Screenshot {
            ok: true,
            path,
            method,
        }
    }

    pub(crate) fn jumped(label: String) -> Self {
        Self::Jumped { ok: true, label }
    }

    pub(crate) fn error(error: &DispatchError) -> Self {
        Self::Error {
            ok: false,
            error: error.to_string(),
        }
    }
}

/// Writer that frames replies as JSONL.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one reply line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns a connection-fatal error when serialization or writing
    /// fails.
    pub(crate) fn write_reply(&mut self, reply: &Reply) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, reply)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
