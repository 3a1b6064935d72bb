//! mtr report parsing and hop-loss attribution

pub mod report;

use crate::error::{InvocationError, ProbeError};
use crate::exec::CommandRunner;

pub use report::{Hop, MtrReport, find_lossy_hop};

pub const DEFAULT_MTR_BIN: &str = "mtr";
pub const DEFAULT_PACKET_SIZE: u32 = 1500;
pub const DEFAULT_COUNT: u32 = 10;

/// One mtr run towards `destination`.
///
/// With `command` set, that command line is run instead of the built-in
/// one. Its output is read as a `--report-wide` text report unless it asks
/// for JSON with `-j` or `--json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtrProbe {
    pub program: String,
    pub destination: String,
    pub packet_size: u32,
    pub count: u32,
    pub command: Option<String>,
}

fn wants_json(args: &[String]) -> bool {
    args.iter().any(|a| a == "-j" || a == "--json")
}

impl MtrProbe {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_MTR_BIN.to_string(),
            destination: destination.into(),
            packet_size: DEFAULT_PACKET_SIZE,
            count: DEFAULT_COUNT,
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            self.destination.clone(),
            "-s".to_string(),
            self.packet_size.to_string(),
            "-c".to_string(),
            self.count.to_string(),
            "--report-wide".to_string(),
            "-b".to_string(),
            "-j".to_string(),
        ]
    }

    /// Program and arguments actually run.
    pub fn command_words(&self) -> Result<(String, Vec<String>), InvocationError> {
        let Some(command) = &self.command else {
            return Ok((self.program.clone(), self.args()));
        };
        let mut words = shlex::split(command)
            .ok_or_else(|| InvocationError::UnbalancedQuotes(command.clone()))?;
        if words.is_empty() {
            return Err(InvocationError::EmptyCommand);
        }
        let program = words.remove(0);
        Ok((program, words))
    }

    pub async fn run<R: CommandRunner>(&self, runner: &R) -> Result<MtrReport, ProbeError> {
        let (program, args) = self.command_words()?;
        let output = runner.run(&program, &args).await?;
        if !output.success() {
            log::warn!(
                "mtr exited with {:?} for {}: {}",
                output.exit_code,
                self.destination,
                output.stderr.trim()
            );
        }
        let report = if wants_json(&args) {
            MtrReport::from_json(&output.stdout)?
        } else {
            MtrReport::from_text(&output.stdout)?
        };
        if let Some(hop) = report.lossy_hop {
            log::info!("Loss towards {} starts at hop {hop}", self.destination);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ExecError;
    use crate::exec::CommandOutput;

    /// Returns `stdout` and remembers what it was asked to run.
    struct Canned {
        stdout: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(stdout: &'static str) -> Self {
            Self {
                stdout,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for Canned {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(program.to_string());
            seen.extend(args.iter().cloned());
            Ok(CommandOutput {
                stdout: self.stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    const WIDE_REPORT: &str = "\
Start: 2021-02-20T06:57:56+0000
HOST: probe-host                   Loss%   Snt   Last   Avg  Best  Wrst StDev
  1.|-- 192.168.1.1                 0.0%     5    1.2   1.3   1.0   2.0   0.3
  2.|-- 10.20.0.1                  40.0%     5    8.1   8.5   7.9   9.9   0.6
  3.|-- example.com (93.184.216.34) 20.0%    5   20.1  20.5  19.9  22.0   0.7
";

    #[test]
    fn test_args() {
        let probe = MtrProbe {
            count: 5,
            ..MtrProbe::new("1.1.1.1")
        };
        assert_eq!(
            probe.args(),
            ["1.1.1.1", "-s", "1500", "-c", "5", "--report-wide", "-b", "-j"]
        );
    }

    #[tokio::test]
    async fn test_custom_command_reads_text_report() {
        let runner = Canned::new(WIDE_REPORT);
        let probe = MtrProbe::new("example.com")
            .with_command("sudo mtr example.com -c 5 --report-wide -b --interval '0.5'");

        let report = probe.run(&runner).await.unwrap();
        assert_eq!(report.hops.len(), 3);
        assert_eq!(report.lossy_hop, Some(2));
        assert!(report.started.is_some());

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0], "sudo");
        assert_eq!(seen.last().map(String::as_str), Some("0.5"));
    }

    #[tokio::test]
    async fn test_custom_command_asking_for_json() {
        let runner = Canned::new(r#"{"report": {"mtr": {}, "hubs": []}}"#);
        let probe = MtrProbe::new("example.com").with_command("mtr --json example.com");
        let report = probe.run(&runner).await.unwrap();
        assert_eq!(report.lossy_hop, None);
        assert!(report.hops.is_empty());
    }

    #[test]
    fn test_bad_custom_commands() {
        let unbalanced = MtrProbe::new("x").with_command("mtr 'x");
        assert!(matches!(
            unbalanced.command_words(),
            Err(InvocationError::UnbalancedQuotes(_))
        ));
        let empty = MtrProbe::new("x").with_command("  ");
        assert!(matches!(
            empty.command_words(),
            Err(InvocationError::EmptyCommand)
        ));
    }
}
