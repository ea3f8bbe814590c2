//! Binary entrypoint for the `pilot` bridge client.
//!
//! The binary delegates to [`pilot_cli::run`], which parses arguments, sends
//! one JSONL request to the configured bridge endpoint, and prints the one
//! JSON reply line.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    pilot_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
