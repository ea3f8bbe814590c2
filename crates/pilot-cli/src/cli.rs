//! Argument surface for the `pilot` client.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use pilot_config::{TcpEndpoint, default_endpoint};

/// Command-line client for the Game Pilot bridge.
#[derive(Debug, Parser)]
#[command(name = "pilot", about = "Drive a visual-novel engine over its bridge")]
pub struct Cli {
    /// Bridge endpoint, e.g. `tcp://127.0.0.1:47201`.
    #[arg(long, env = "PILOT_ENDPOINT", default_value_t = default_endpoint())]
    pub endpoint: TcpEndpoint,

    /// Seconds to wait for the bridge to answer.
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: PilotCommand,
}

/// One bridge command per invocation.
#[derive(Debug, Subcommand, PartialEq)]
pub enum PilotCommand {
    /// Liveness check: engine id and game title.
    Ping,
    /// Label, speaker, dialogue, choices, and allow-listed variables.
    State,
    /// Captions of the active choice menu.
    Choices,
    /// Select a menu entry by index.
    Choose {
        /// Zero-based menu index.
        index: i64,
    },
    /// Advance dialogue.
    Advance,
    /// Read variables by name; unknown names print as null.
    Variables {
        /// Variable names to read.
        names: Vec<String>,
    },
    /// Write one variable.
    Set {
        /// Variable name.
        name: String,
        /// Value, parsed as JSON with a plain-string fallback.
        value: String,
    },
    /// Capture a screenshot.
    Screenshot {
        /// Target path; the bridge picks a default when omitted.
        path: Option<PathBuf>,
    },
    /// Jump to a script label.
    Jump {
        /// Target label.
        label: String,
    },
}

impl PilotCommand {
    /// Builds the one-line request object for this command.
    #[must_use]
    pub fn to_request(&self) -> Value {
        match self {
            Self::Ping => json!({"cmd": "ping"}),
            Self::State => json!({"cmd": "state"}),
            Self::Choices => json!({"cmd": "choices"}),
            Self::Choose { index } => json!({"cmd": "choose", "index": index}),
            Self::Advance => json!({"cmd": "advance"}),
            Self::Variables { names } => json!({"cmd": "variables", "names": names}),
            Self::Set { name, value } => {
                json!({"cmd": "set_variable", "name": name, "value": parse_value(value)})
            }
            Self::Screenshot { path } => match path {
                Some(path) => json!({"cmd": "screenshot", "path": path.display().to_string()}),
                None => json!({"cmd": "screenshot"}),
            },
            Self::Jump { label } => json!({"cmd": "jump", "label": label}),
        }
    }
}

/// Interprets a value argument as JSON, falling back to a bare string so
/// `pilot set player_name Anna` works without quoting gymnastics.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn choose_carries_index() {
        let request = PilotCommand::Choose { index: 2 }.to_request();
        assert_eq!(request, json!({"cmd": "choose", "index": 2}));
    }

    #[test]
    fn set_parses_json_values() {
        let request = PilotCommand::Set {
            name: "chapter".to_owned(),
            value: "3".to_owned(),
        }
        .to_request();
        assert_eq!(request["value"], json!(3));
    }

    #[test]
    fn set_falls_back_to_bare_strings() {
        let request = PilotCommand::Set {
            name: "player_name".to_owned(),
            value: "Anna".to_owned(),
        }
        .to_request();
        assert_eq!(request["value"], json!("Anna"));
    }

    #[test]
    fn screenshot_omits_path_when_unset() {
        let request = PilotCommand::Screenshot { path: None }.to_request();
        assert_eq!(request, json!({"cmd": "screenshot"}));
    }

    #[test]
    fn parses_full_invocation() {
        let cli = Cli::try_parse_from(["pilot", "--endpoint", "tcp://127.0.0.1:9000", "jump", "start"])
            .expect("parse invocation");
        assert_eq!(cli.endpoint.port(), 9000);
        assert_eq!(
            cli.command,
            PilotCommand::Jump {
                label: "start".to_owned()
            }
        );
    }
}
