//! External process execution
//!
//! Every external tool (frontend bundler, backend bundler, smoke-test
//! runtime) is invoked through the [`ProcessRunner`] trait. Output is always
//! captured so failures can be reported with the tool's own diagnostic.

use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::error::StageError;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Create an invocation with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Add a single argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render as a shell-like command line for logs and messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Diagnostic text: stderr, or stdout when stderr is empty
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs external processes to completion
pub trait ProcessRunner {
    /// Run the invocation, blocking until it exits
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// Runs processes on the host with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let program = resolve_program(&invocation.program)
            .unwrap_or_else(|| PathBuf::from(&invocation.program));
        let mut cmd = Command::new(program);
        cmd.args(&invocation.args);
        if let Some(ref dir) = invocation.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let output = cmd.output()?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Locate a program on `PATH`
///
/// Also finds `.cmd` shims such as `npx.cmd` on Windows, which
/// `Command::new` does not.
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    // paths are resolved by the child against its own working directory
    if name.contains(['/', '\\']) {
        return None;
    }
    which::which(name).ok()
}

/// Run an invocation and turn spawn errors or non-zero exits into [`StageError`]
pub fn run_checked(
    runner: &dyn ProcessRunner,
    invocation: &Invocation,
) -> Result<ProcessOutput, StageError> {
    tracing::debug!("Running: {}", invocation.display());

    let output = runner.run(invocation).map_err(|e| StageError::Spawn {
        program: invocation.program.clone(),
        error: e.to_string(),
    })?;

    if output.success() {
        Ok(output)
    } else {
        Err(StageError::ProcessFailed {
            program: invocation.program.clone(),
            code: output.code,
            diagnostic: output.diagnostic(),
        })
    }
}
