//! Command execution primitives with consistent error handling.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};
use crate::utils::{shell, signals};

/// A fully described external command: program, arguments, extra
/// environment and working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Shell-quoted command line, for display and error details.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        shell::quote_args(&parts)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Captured output from command execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Prefers stderr, falls back to stdout if stderr is empty.
    pub fn error_text(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            self.stdout.trim().to_string()
        }
    }
}

impl From<Output> for CapturedOutput {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Seam between the procedures and the external tools they drive.
pub trait CommandRunner {
    /// Run to completion with captured stdout/stderr. Only a failure to
    /// start the process is an error; the exit status is reported in the
    /// returned output.
    fn output(&self, invocation: &Invocation) -> Result<CapturedOutput>;

    /// Run with inherited stdio and return the exit code.
    fn interactive(&self, invocation: &Invocation) -> Result<i32>;
}

/// Runs commands as child processes of this one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, invocation: &Invocation) -> Result<CapturedOutput> {
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::command_spawn_failed(invocation.command_line(), e.to_string()))?;

        signals::check()?;
        Ok(CapturedOutput::from(output))
    }

    fn interactive(&self, invocation: &Invocation) -> Result<i32> {
        let status = invocation
            .to_command()
            .status()
            .map_err(|e| Error::command_spawn_failed(invocation.command_line(), e.to_string()))?;

        signals::check()?;
        Ok(status.code().unwrap_or(1))
    }
}

/// Run a command and return its stdout on success.
///
/// A non-zero exit becomes a `command.failed` error carrying the command
/// line and both output streams.
pub fn run_checked(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<String> {
    let output = runner.output(invocation)?;
    require_success(invocation, output)
}

/// Like [`run_checked`], with stdout trimmed.
pub fn run_trimmed(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<String> {
    run_checked(runner, invocation).map(|stdout| stdout.trim().to_string())
}

/// Run a command, returning `None` on failure or empty output.
///
/// Useful when command failure is expected/acceptable (e.g., checking for optional tags).
pub fn run_optional(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<Option<String>> {
    let output = runner.output(invocation)?;
    if !output.success() {
        return Ok(None);
    }

    let stdout = output.stdout.trim();
    if stdout.is_empty() {
        Ok(None)
    } else {
        Ok(Some(stdout.to_string()))
    }
}

/// Whether a command exits successfully; its output is discarded.
pub fn succeeded(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<bool> {
    Ok(runner.output(invocation)?.success())
}

fn require_success(invocation: &Invocation, output: CapturedOutput) -> Result<String> {
    if output.success() {
        return Ok(output.stdout);
    }

    Err(Error::command_failed(CommandFailedDetails {
        command: invocation.command_line(),
        exit_code: output.exit_code,
        stdout: output.stdout.trim().to_string(),
        stderr: output.stderr.trim().to_string(),
    }))
}
