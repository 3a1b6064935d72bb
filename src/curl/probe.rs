use chrono::Utc;

use super::prelude::*;
use crate::error::ProbeError;
use crate::exec::CommandRunner;

/// Runs curl once against `invocation.target` and parses what it printed.
///
/// A non-zero exit status is not fatal on its own: curl still prints the
/// summary line for failed transfers, and the trace explains what happened.
pub async fn probe_url<R: CommandRunner>(
    runner: &R,
    invocation: &CurlInvocation,
) -> Result<ProbeResult, ProbeError> {
    let captured_at = Utc::now();
    let command = invocation.command_line();
    log::debug!("Probing {} with: {command}", invocation.target);

    let output = runner.run(&invocation.program, &invocation.args()).await?;
    if !output.success() {
        log::warn!(
            "curl exited with {:?} for {}",
            output.exit_code,
            invocation.target
        );
    }

    let mut result = ProbeResult::parse(
        &invocation.target,
        &command,
        &output.stdout,
        &output.stderr,
    )?;
    result.captured_at = Some(captured_at);
    result.exit_code = output.exit_code;
    Ok(result)
}
