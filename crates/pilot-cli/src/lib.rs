//! Command-line client runtime for the Game Pilot bridge.
//!
//! The runtime owns argument parsing, request serialisation, and the single
//! request/reply exchange with the daemon. It is designed to be exercised both
//! from the binary entrypoint and from tests where the IO streams can be
//! substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;

mod cli;
mod client;

pub use cli::{Cli, PilotCommand};
pub use client::exchange;

/// Parses `args`, performs one exchange with the bridge, and prints the reply
/// line to `stdout`.
///
/// The exit code mirrors the bridge's verdict: success when the reply carries
/// `"ok": true`, failure otherwise or when the exchange itself fails.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_clap_error(&error, stdout, stderr),
    };

    let request = cli.command.to_request();
    let timeout = Duration::from_secs(cli.timeout_secs);
    let reply = match exchange(&cli.endpoint, timeout, &request) {
        Ok(reply) => reply,
        Err(error) => {
            let _ = writeln!(stderr, "pilot: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    if writeln!(stdout, "{reply}").is_err() {
        return ExitCode::FAILURE;
    }
    if reply_succeeded(&reply) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn reply_succeeded(reply: &Value) -> bool {
    reply.get("ok").and_then(Value::as_bool) == Some(true)
}

/// Routes clap output to the right stream: help and version go to stdout with
/// a success code, genuine argument errors go to stderr with a failure code.
fn report_clap_error<W: Write, E: Write>(
    error: &clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    let rendered = error.render();
    if error.use_stderr() {
        let _ = write!(stderr, "{rendered}");
        ExitCode::FAILURE
    } else {
        let _ = write!(stdout, "{rendered}");
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn run_with(args: &[&str]) -> (ExitCode, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(
            args.iter().copied().map(OsString::from),
            &mut stdout,
            &mut stderr,
        );
        (
            code,
            String::from_utf8(stdout).expect("stdout is UTF-8"),
            String::from_utf8(stderr).expect("stderr is UTF-8"),
        )
    }

    #[test]
    fn help_prints_to_stdout_and_succeeds() {
        let (code, stdout, stderr) = run_with(&["pilot", "--help"]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(stdout.contains("Usage"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn unknown_flag_prints_to_stderr_and_fails() {
        let (code, stdout, stderr) = run_with(&["pilot", "--no-such-flag", "ping"]);
        assert_eq!(code, ExitCode::FAILURE);
        assert!(stdout.is_empty());
        assert!(stderr.contains("--no-such-flag"));
    }

    #[test]
    fn unreachable_bridge_reports_on_stderr() {
        let (code, stdout, stderr) = run_with(&[
            "pilot",
            "--endpoint",
            "tcp://127.0.0.1:1",
            "--timeout-secs",
            "1",
            "ping",
        ]);
        assert_eq!(code, ExitCode::FAILURE);
        assert!(stdout.is_empty());
        assert!(stderr.starts_with("pilot: "));
    }

    #[test]
    fn success_verdict_follows_the_ok_field() {
        assert!(reply_succeeded(&json!({"ok": true, "pong": true})));
        assert!(!reply_succeeded(&json!({"ok": false, "error": "nope"})));
        assert!(!reply_succeeded(&json!({"pong": true})));
    }
}
