//! Error types for bridge operations
//!
//! Every failure of an external command carries the command text and the
//! captured output streams so the calling agent can reproduce and debug the
//! invocation. Other failures carry a message only.

use std::path::PathBuf;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Closed error type for the adb bridge
///
/// The first two variants are "command-shaped": they carry full diagnostic
/// context (command text plus both output streams) and render as a three-part
/// error envelope. Everything else renders as a message-only envelope.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// External command exited with a non-zero status (or was killed)
    #[error("command exited with status {}", fmt_status(.status))]
    CommandFailed {
        /// Rendered argv of the failing command
        command: String,
        /// Exit code, `None` if terminated by a signal
        status:  Option<i32>,
        /// Captured standard output of the failed process
        stdout:  String,
        /// Captured standard error of the failed process
        stderr:  String,
    },

    /// Command exited zero but a promised output file is missing
    #[error("command succeeded but expected file {} is missing", .path.display())]
    ArtifactMissing {
        /// Rendered argv of the command that promised the artifact
        command: String,
        /// Captured standard output of the successful process
        stdout:  String,
        /// The path that failed to validate
        path:    PathBuf,
    },

    /// Decoding or masking a captured frame failed
    #[error("image processing failed: {0}")]
    Image(String),

    /// I/O error (spawning a process, reading or writing a file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Diagnostic context of a command-shaped error
///
/// Borrowed view used by the response renderer to append the command and
/// output parts after the primary message.
#[derive(Debug, Clone, Copy)]
pub struct CommandDiagnostics<'a> {
    /// Rendered argv of the command
    pub command: &'a str,
    /// Captured standard output
    pub stdout:  &'a str,
    /// Captured standard error (empty for missing-artifact failures)
    pub stderr:  &'a str,
}

impl BridgeError {
    /// Returns the command diagnostics for command-shaped errors
    ///
    /// `ArtifactMissing` reports an empty stderr: the process itself
    /// succeeded, only its promised output is absent.
    pub fn command_diagnostics(&self) -> Option<CommandDiagnostics<'_>> {
        match self {
            BridgeError::CommandFailed {
                command,
                stdout,
                stderr,
                ..
            } => Some(CommandDiagnostics {
                command,
                stdout,
                stderr,
            }),
            BridgeError::ArtifactMissing {
                command, stdout, ..
            } => Some(CommandDiagnostics {
                command,
                stdout,
                stderr: "",
            }),
            BridgeError::Image(_) | BridgeError::Io(_) => None,
        }
    }
}
