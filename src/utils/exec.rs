//! External command execution.
//!
//! The bundler and minifier are external tools configured as command
//! vectors (program + leading arguments). This module runs them and turns
//! non-zero exits into readable errors.

use anyhow::{Context, Result, bail};
use std::{
    ffi::OsStr,
    process::{Command, Output},
};

/// Run an external command with extra arguments appended.
///
/// `cmd` is the configured command vector (program + fixed arguments);
/// `args` are the per-invocation arguments.
///
/// # Errors
/// Returns an error if the command cannot be spawned or exits non-zero.
pub fn run<S: AsRef<OsStr>>(cmd: &[String], args: &[S]) -> Result<Output> {
    let Some((program, fixed)) = cmd.split_first() else {
        bail!("Empty command");
    };

    let output = Command::new(program)
        .args(fixed)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute `{program}`"))?;

    if !output.status.success() {
        bail!(format_error(program, &output));
    }

    Ok(output)
}

/// Format a command failure with its captured output.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        msg.push('\n');
        msg.push_str(stderr);
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
