//! Maps typed commands onto collaborator calls.

use std::env;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use pilot_config::InputPoint;
use pilot_engine::{AdvanceMethod, CaptureMethod, EngineHandle, EngineIdentity};

use crate::capture;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::Command;
use super::response::Reply;

/// Routes commands to the engine through the marshalling shim.
///
/// The router owns everything a handler needs that is not live engine
/// state: the engine identity captured once at startup (so `ping` never
/// contends for the engine thread), the `state` variable allow-list, and
/// the synthetic-input fallback point.
#[derive(Debug, Clone)]
pub(crate) struct CommandRouter {
    engine: EngineHandle,
    identity: EngineIdentity,
    state_variables: Vec<String>,
    input_point: Option<InputPoint>,
}

impl CommandRouter {
    pub(crate) const fn new(
        engine: EngineHandle,
        identity: EngineIdentity,
        state_variables: Vec<String>,
        input_point: Option<InputPoint>,
    ) -> Self {
        Self {
            engine,
            identity,
            state_variables,
            input_point,
        }
    }

    /// Executes one command and builds its success reply.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`]; the connection handler decides whether it is
    /// reported in-band or closes the connection.
    pub(crate) fn dispatch(&self, command: Command) -> Result<Reply, DispatchError> {
        match command {
            Command::Ping => Ok(Reply::ping(self.identity.clone())),
            Command::State => self.dispatch_state(),
            Command::Choices => {
                let choices = self.engine.with_engine(|engine| engine.choices())?;
                Ok(Reply::choices(choices))
            }
            Command::Choose { index } => {
                let chosen = self
                    .engine
                    .with_engine(move |engine| engine.select_choice(index))??;
                Ok(Reply::chosen(chosen))
            }
            Command::Advance => self.dispatch_advance(),
            Command::Variables { names } => {
                let variables = self.engine.with_engine(move |engine| {
                    let mut map = Map::new();
                    for name in names {
                        let value = engine.read_variable(&name).unwrap_or(Value::Null);
                        map.insert(name, value);
                    }
                    map
                })?;
                Ok(Reply::variables(variables))
            }
            Command::SetVariable { name, value } => {
                let echo_name = name.clone();
                let echo_value = value.clone();
                self.engine
                    .with_engine(move |engine| engine.write_variable(&name, value))??;
                Ok(Reply::variable_set(echo_name, echo_value))
            }
            Command::Screenshot { path } => self.dispatch_screenshot(path),
            Command::Jump { label } => {
                let target = label.clone();
                self.engine
                    .with_engine(move |engine| engine.jump_to_label(&target))??;
                Ok(Reply::jumped(label))
            }
        }
    }

    fn dispatch_state(&self) -> Result<Reply, DispatchError> {
        let names = self.state_variables.clone();
        let (snapshot, variables) = self.engine.with_engine(move |engine| {
            let snapshot = engine.snapshot();
            let mut variables = Map::new();
            // Allow-listed names that the engine does not know are simply
            // omitted, matching the read-what-exists contract.
            for name in &names {
                if let Some(value) = engine.read_variable(name) {
                    variables.insert(name.clone(), value);
                }
            }
            (snapshot, variables)
        })?;
        Ok(Reply::state(snapshot, variables))
    }

    fn dispatch_advance(&self) -> Result<Reply, DispatchError> {
        let point = self.input_point;
        // The fallback runs inside the same marshalled closure so the
        // dismiss attempt and the synthetic click are one atomic turn on
        // the engine thread.
        let method = self.engine.with_engine(move |engine| {
            match engine.advance_dialogue() {
                Ok(()) => Ok(AdvanceMethod::Dismiss),
                Err(error) if error.is_unsupported() => engine
                    .synthesize_input(point)
                    .map(|()| AdvanceMethod::SyntheticInput),
                Err(error) => Err(error),
            }
        })??;
        Ok(Reply::advanced(method))
    }

    fn dispatch_screenshot(&self, path: Option<String>) -> Result<Reply, DispatchError> {
        let path = path.map_or_else(default_screenshot_path, PathBuf::from);
        let engine_path = path.clone();
        let attempt = self
            .engine
            .with_engine(move |engine| engine.capture_screenshot(&engine_path))?;
        let method = match attempt {
            Ok(()) => CaptureMethod::Engine,
            Err(error) if error.is_unsupported() => {
                debug!(
                    target: DISPATCH_TARGET,
                    %error,
                    "engine capture unavailable, trying OS utility"
                );
                capture::os_capture(&path)?;
                CaptureMethod::OsUtility
            }
            Err(error) => return Err(error.into()),
        };
        Ok(Reply::screenshot(path.display().to_string(), method))
    }
}

fn default_screenshot_path() -> PathBuf {
    env::temp_dir().join("pilot-screenshot.png")
}
