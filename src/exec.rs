//! External command execution
//!
//! This module is the only place the bridge touches external processes.
//! Commands are built as explicit argument vectors (`CommandLine`) rather
//! than shell strings, so tool inputs like component names can never be
//! interpreted by a shell. The `CommandRunner` trait is the seam between the
//! real system (`SystemRunner`) and the scripted device used in tests
//! (`MockRunner`).

use std::{
    collections::VecDeque,
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};

/// One external command as an explicit argument vector
///
/// Rendered (via `Display`) into the diagnostic command text carried by
/// command-shaped errors.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    program: String,
    args:    Vec<String>,
    cwd:     Option<PathBuf>,
}

impl CommandLine {
    /// Creates a command line for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args:    Vec::new(),
            cwd:     None,
        }
    }

    /// Appends one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory the command runs in
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector (without the program)
    pub fn arg_slice(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) || arg.is_empty() {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Raw output of one external process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub status: Option<i32>,
    /// Captured standard output (bytes; screencap output is binary)
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// True when the process exited with status zero
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Standard output as lossy UTF-8 text
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error as lossy UTF-8 text
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Seam for spawning external commands
///
/// Implementations must be `Send + Sync`: tool invocations may run
/// concurrently and each spawns its own process. No locking is imposed here.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion and returns its captured output
    ///
    /// Spawn failures (program missing, no permission) are I/O errors; a
    /// non-zero exit is not an error at this level.
    async fn run(&self, cmd: &CommandLine) -> BridgeResult<CommandOutput>;
}

/// Runner that spawns real processes via tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &CommandLine) -> BridgeResult<CommandOutput> {
        let mut command = Command::new(cmd.program());
        command
            .args(cmd.arg_slice())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }

        debug!(command = %cmd, "running external command");
        let output = command.output().await?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Scripted runner for tests and development
///
/// Responses are served in FIFO order; when the script is exhausted every
/// call succeeds with empty output. All rendered command lines are recorded
/// for assertion.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: Mutex<VecDeque<CommandOutput>>,
    calls:     Mutex<Vec<String>>,
}

impl MockRunner {
    /// Creates a runner with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a zero-exit response with the given stdout text
    pub fn push_ok(&self, stdout: &str) {
        self.push_output(Some(0), stdout.as_bytes(), b"");
    }

    /// Queues an arbitrary response
    pub fn push_output(&self, status: Option<i32>, stdout: &[u8], stderr: &[u8]) {
        self.responses
            .lock()
            .expect("mock script poisoned")
            .push_back(CommandOutput {
                status,
                stdout: stdout.to_vec(),
                stderr: stderr.to_vec(),
            });
    }

    /// Rendered command lines of every call so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, cmd: &CommandLine) -> BridgeResult<CommandOutput> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push(cmd.to_string());

        let next = self
            .responses
            .lock()
            .expect("mock script poisoned")
            .pop_front();

        Ok(next.unwrap_or(CommandOutput {
            status: Some(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        }))
    }
}

/// Command executor enforcing the exit-status and artifact contracts
///
/// Exactly one process per call; no retry and no timeout. Cancellation is
/// left to the transport: a process spawned here runs to completion even if
/// the client disconnects.
#[derive(Clone)]
pub struct Exec {
    runner: Arc<dyn CommandRunner>,
}

impl Exec {
    /// Creates an executor over the given runner
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Creates an executor that spawns real processes
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    async fn checked(&self, cmd: &CommandLine) -> BridgeResult<CommandOutput> {
        let output = self.runner.run(cmd).await?;
        if !output.success() {
            return Err(BridgeError::CommandFailed {
                command: cmd.to_string(),
                status:  output.status,
                stdout:  output.stdout_text(),
                stderr:  output.stderr_text(),
            });
        }
        Ok(output)
    }

    /// Runs a command, failing on non-zero exit, and returns its stdout text
    pub async fn run(&self, cmd: &CommandLine) -> BridgeResult<String> {
        Ok(self.checked(cmd).await?.stdout_text())
    }

    /// Runs a command and returns its raw stdout bytes
    ///
    /// Used for binary payloads such as `adb exec-out screencap -p`.
    pub async fn run_raw(&self, cmd: &CommandLine) -> BridgeResult<Vec<u8>> {
        Ok(self.checked(cmd).await?.stdout)
    }

    /// Runs a command and additionally validates that `artifact` exists
    ///
    /// Distinguishes "command ran but the promised artifact is missing"
    /// (zero exit, `ArtifactMissing` with empty stderr) from "command itself
    /// failed" (`CommandFailed`).
    pub async fn run_validating(
        &self,
        cmd: &CommandLine,
        artifact: &Path,
    ) -> BridgeResult<String> {
        let stdout = self.run(cmd).await?;
        if tokio::fs::metadata(artifact).await.is_err() {
            return Err(BridgeError::ArtifactMissing {
                command: cmd.to_string(),
                stdout,
                path: artifact.to_path_buf(),
            });
        }
        Ok(stdout)
    }
}
