//! Running a command and recording how it failed.

use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Instant;

use crate::failure::FailureRecord;

/// The user's shell binary, from `$SHELL`
pub fn user_shell_path() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_shell().to_string())
}

#[cfg(unix)]
fn default_shell() -> &'static str {
    "/bin/sh"
}

#[cfg(not(unix))]
fn default_shell() -> &'static str {
    "cmd"
}

/// Shell name from its path (`/usr/bin/zsh` -> `zsh`)
pub fn shell_name(shell_path: &str) -> String {
    Path::new(shell_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(shell_path)
        .to_string()
}

/// Working directory and shell of the current process, for records built
/// from command-line input
pub fn current_context(record: FailureRecord) -> FailureRecord {
    let record = record.shell(shell_name(&user_shell_path()));
    match env::current_dir() {
        Ok(dir) => record.working_directory(dir.display().to_string()),
        Err(_) => record,
    }
}

/// Run `command` through the user's shell and record the result
pub async fn capture(command: &str) -> Result<FailureRecord> {
    capture_with_shell(&user_shell_path(), command).await
}

/// Run `command` through a specific shell and record the result
pub async fn capture_with_shell(shell_path: &str, command: &str) -> Result<FailureRecord> {
    let mut process = tokio::process::Command::new(shell_path);
    if cfg!(windows) {
        process.arg("/C");
    } else {
        process.arg("-c");
    }
    process.arg(command);

    let start = Instant::now();
    let output = process
        .output()
        .await
        .with_context(|| format!("Failed to run `{command}` with {shell_path}"))?;
    let elapsed = start.elapsed();

    let exit_code = exit_code(&output.status);
    tracing::debug!(command, exit_code, elapsed_ms = elapsed.as_millis() as u64, "captured command");

    let mut record = FailureRecord::new(command, exit_code)
        .stdout(String::from_utf8_lossy(&output.stdout))
        .stderr(String::from_utf8_lossy(&output.stderr))
        .shell(shell_name(shell_path))
        .execution_time(elapsed);
    if let Ok(dir) = env::current_dir() {
        record = record.working_directory(dir.display().to_string());
    }
    Ok(record)
}

/// Exit code, with signals reported shell-style as 128 + signal
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
