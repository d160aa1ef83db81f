//! Failed command records.
//!
//! A [`FailureRecord`] describes one failed execution: the command, where and
//! how it ran, and what it printed. Records are built once by the capture
//! layer and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One failed command execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// The command that was executed
    pub command: String,

    /// Working directory where the command was run
    pub working_directory: Option<String>,

    /// Shell type (bash, zsh, fish, etc.)
    pub shell: Option<String>,

    /// Exit code from the command
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,

    /// Standard error output
    pub stderr: String,

    /// Wall-clock execution time, if measured
    pub execution_time: Option<Duration>,
}

impl FailureRecord {
    /// Create a record with just a command and exit code
    pub fn new(command: impl Into<String>, exit_code: i32) -> Self {
        Self {
            command: command.into(),
            working_directory: None,
            shell: None,
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            execution_time: None,
        }
    }

    /// Builder: set stderr
    pub fn stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Builder: set stdout
    pub fn stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Builder: set working directory
    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Builder: set shell type
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Builder: set execution time
    pub fn execution_time(mut self, elapsed: Duration) -> Self {
        self.execution_time = Some(elapsed);
        self
    }

    pub fn is_successful(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether anything non-blank was written to stderr
    pub fn has_error(&self) -> bool {
        !self.stderr.trim().is_empty()
    }

    /// First three lines of stderr, with a `...` marker when truncated
    pub fn error_summary(&self) -> String {
        if !self.has_error() {
            return String::new();
        }

        let trimmed = self.stderr.trim();
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() <= 3 {
            return trimmed.to_string();
        }

        format!("{}\n...", lines[..3].join("\n"))
    }
}
