//! OS-level screenshot fallback.
//!
//! When the engine's own capture API is unavailable the dispatcher shells
//! out to whichever capture utility the host platform offers. This runs on
//! the connection thread, not the engine thread, since it never touches
//! engine state.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use pilot_engine::EngineError;

const CAPTURE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::capture");

#[cfg(target_os = "macos")]
const CAPTURE_UTILITIES: &[&[&str]] = &[&["screencapture", "-x"]];

#[cfg(not(target_os = "macos"))]
const CAPTURE_UTILITIES: &[&[&str]] = &[
    &["gnome-screenshot", "-f"],
    &["import", "-window", "root"],
    &["scrot"],
];

/// Captures the screen to `path` with the first utility that succeeds.
///
/// # Errors
///
/// [`EngineError::CaptureFailed`] when every utility fails or is absent.
pub(crate) fn os_capture(path: &Path) -> Result<(), EngineError> {
    capture_with(CAPTURE_UTILITIES, path)
}

fn capture_with(utilities: &[&[&str]], path: &Path) -> Result<(), EngineError> {
    for utility in utilities {
        let Some((program, args)) = utility.split_first() else {
            continue;
        };
        let outcome = Command::new(program)
            .args(args)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match outcome {
            Ok(status) if status.success() && path.exists() => {
                debug!(target: CAPTURE_TARGET, utility = *program, "OS capture succeeded");
                return Ok(());
            }
            Ok(status) => {
                debug!(
                    target: CAPTURE_TARGET,
                    utility = *program,
                    %status,
                    "OS capture utility failed"
                );
            }
            Err(error) => {
                debug!(
                    target: CAPTURE_TARGET,
                    utility = *program,
                    %error,
                    "OS capture utility unavailable"
                );
            }
        }
    }
    Err(EngineError::CaptureFailed(
        "All screenshot methods failed".to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn multi_argument_utility_receives_the_target_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shot.png");
        // The appended capture path lands in $0, so a successful write
        // proves the utility's own arguments and the path both arrived.
        let utilities: &[&[&str]] = &[&["sh", "-c", "printf scene > \"$0\""]];
        capture_with(utilities, &path).expect("scripted utility captures");
        assert!(path.exists());
    }

    #[test]
    fn reports_failure_when_no_utility_captures() {
        // Point the utilities at an uncreatable path so even a present
        // utility cannot satisfy the exists() check.
        let path = Path::new("/nonexistent-dir/shot.png");
        let error = os_capture(path).expect_err("capture cannot succeed");
        assert_eq!(error.to_string(), "All screenshot methods failed");
    }
}
