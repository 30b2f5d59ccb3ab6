//! Typed invocation of external command-line tools.
//!
//! Every tool call is described by an [`Invocation`]: a program, an explicit
//! argument vector and an optional stdin script. Nothing is ever formatted
//! into a shell line, and every invocation carries its own timeout.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The program could not be started (not installed, not executable).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program did not finish within its timeout and was killed.
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// I/O failure while talking to a running program.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenient Result alias for tool invocations.
pub type ShellResult<T> = Result<T, ShellError>;

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

/// A single, fully-described call to an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    stdin: Option<String>,
    timeout: Duration,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    /// Appends one argument. Arguments are passed verbatim, never shell-split.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments in order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feeds `script` to the program's stdin, then closes it.
    #[must_use]
    pub fn stdin(mut self, script: impl Into<String>) -> Self {
        self.stdin = Some(script.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn stdin_script(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a completed invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the program exited with status zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited non-zero.
    #[must_use]
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for executing tool invocations.
///
/// Adapters depend on this trait rather than on `tokio::process` so that tool
/// behaviour can be scripted in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the invocation to completion or until its timeout expires.
    ///
    /// A non-zero exit status is reported through [`CommandOutput::success`],
    /// not as an error.
    async fn run(&self, invocation: &Invocation) -> ShellResult<CommandOutput>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> ShellResult<CommandOutput> {
        log::debug!("[Shell] Running: {}", invocation);

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.arguments())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if invocation.stdin_script().is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn().map_err(|source| ShellError::Spawn {
            program: invocation.program().to_string(),
            source,
        })?;

        if let (Some(script), Some(mut stdin)) = (invocation.stdin_script(), child.stdin.take()) {
            stdin.write_all(script.as_bytes()).await?;
            // Dropping stdin closes the pipe so interactive tools see EOF.
            drop(stdin);
        }

        // On timeout the future owning the child is dropped, which kills it.
        let output = timeout(invocation.timeout(), child.wait_with_output())
            .await
            .map_err(|_| ShellError::Timeout {
                program: invocation.program().to_string(),
                secs: invocation.timeout().as_secs(),
            })??;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
