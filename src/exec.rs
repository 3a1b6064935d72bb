//! Running external diagnostic tools
//!
//! Every probe in this crate shells out to a binary (`curl`, `mtr`, `ping`)
//! and only ever needs three things back: stdout, stderr and the exit code.
//! [`CommandRunner`] is that capability; [`SystemRunner`] is the real one,
//! tests substitute canned output.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ExecError;

/// Default upper bound for a single tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs `program args…` to completion and captures its output.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput, ExecError>> + Send;
}

/// Spawns real processes through tokio, killing them once `timeout` elapses.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        log::debug!("Running {program} {}", args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout {
                program: program.to_string(),
                after: self.timeout,
            })??;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
