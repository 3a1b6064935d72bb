//! Probing configured targets
//!
//! Every target of a group is probed in its own task; probes share nothing
//! but the runner and tool settings.

use std::sync::Arc;

use serde::Serialize;

use crate::config::app_config::ToolConfig;
use crate::config::probe_config::{GroupConfig, ProbeKind, TargetConfig};
use crate::curl::prelude::*;
use crate::error::ProbeError;
use crate::exec::CommandRunner;
use crate::mtr::{MtrProbe, MtrReport};
use crate::ping::{PingProbe, PingSummary};
use crate::util::target_host;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Curl {
        accepted: bool,
        result: Box<ProbeResult>,
    },
    Mtr {
        report: MtrReport,
    },
    Ping {
        summary: PingSummary,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub group: String,
    pub target: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl TargetReport {
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            Outcome::Curl { accepted, .. } => *accepted,
            Outcome::Mtr { report } => report.lossy_hop.is_none(),
            Outcome::Ping { summary } => summary.received > 0,
            Outcome::Failed { .. } => false,
        }
    }
}

/// Probes one target with the tool its config asks for.
pub async fn probe_target<R: CommandRunner>(
    runner: &R,
    tools: &ToolConfig,
    target: &TargetConfig,
) -> Result<Outcome, ProbeError> {
    match target.kind {
        ProbeKind::Curl => {
            let mut invocation = CurlInvocation::new(&target.url)
                .with_program(&tools.curl)
                .with_headers(&target.headers);
            if let Some(extra) = &target.extra_options {
                invocation = invocation.with_extra_options(extra)?;
            }
            let result = probe_url(runner, &invocation).await?;
            let accepted = result
                .status_code()
                .map(|code| target.accepted_status_codes.contains(&code))
                .unwrap_or(false);
            Ok(Outcome::Curl {
                accepted,
                result: Box::new(result),
            })
        }
        ProbeKind::Mtr => {
            let probe = MtrProbe {
                program: tools.mtr.clone(),
                packet_size: target.packet_size,
                count: target.count,
                command: target.mtr_command.clone(),
                ..MtrProbe::new(target_host(&target.url)?)
            };
            Ok(Outcome::Mtr {
                report: probe.run(runner).await?,
            })
        }
        ProbeKind::Ping => {
            let probe = PingProbe {
                program: tools.ping.clone(),
                ..PingProbe::new(target_host(&target.url)?, target.count)
            };
            Ok(Outcome::Ping {
                summary: probe.run(runner).await?,
            })
        }
    }
}

/// Probes every target of `group` concurrently, reporting in config order.
pub async fn run_group<R>(
    runner: Arc<R>,
    tools: Arc<ToolConfig>,
    name: &str,
    group: &GroupConfig,
) -> Vec<TargetReport>
where
    R: CommandRunner + 'static,
{
    let mut handles = vec![];

    for target in &group.targets {
        let runner = runner.clone();
        let tools = tools.clone();
        let target = target.clone();

        let handle = tokio::spawn(async move {
            let outcome = match probe_target(runner.as_ref(), &tools, &target).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("Probe error for {}: {e}", target.url);
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            (target.url, outcome)
        });
        handles.push(handle);
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok((target, outcome)) => reports.push(TargetReport {
                group: name.to_string(),
                target,
                outcome,
            }),
            Err(e) => log::error!("Probe task in group {name} failed: {e}"),
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::exec::CommandOutput;

    /// Answers by program name with canned output.
    struct FakeTools;

    impl CommandRunner for FakeTools {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
            let stdout = match program {
                "curl" => "curlout:1000:0.001:0.002:0.002:0.003:0.004:0.005".to_string(),
                "ping" => {
                    assert_eq!(args.last().map(String::as_str), Some("example.org"));
                    "2 packets transmitted, 2 received, 0% packet loss\n\
                     rtt min/avg/max/mdev = 1.0/1.5/2.0/0.5 ms\n"
                        .to_string()
                }
                "mtr" => r#"{"report": {"mtr": {}, "hubs": []}}"#.to_string(),
                "mtr-wide" => "1.|-- 10.0.0.1  0.0%  3  1.0  1.0  1.0  1.0  0.0\n\
                               2.|-- 10.0.0.2 50.0%  3  2.0  2.0  2.0  2.0  0.0\n"
                    .to_string(),
                other => {
                    return Err(ExecError::Spawn {
                        program: other.to_string(),
                        source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    });
                }
            };
            let stderr = if program == "curl" {
                "10:00:00.000000 < HTTP/1.1 301 Moved Permanently\n".to_string()
            } else {
                String::new()
            };
            Ok(CommandOutput {
                stdout,
                stderr,
                exit_code: Some(0),
            })
        }
    }

    fn group(yaml: &str) -> GroupConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_group_reports_in_config_order() {
        let group = group(
            r#"
            targets:
              - url: http://example.com/
                accepted_status_codes: [200, 301]
              - url: https://example.org/
                kind: ping
              - url: example.net
                kind: mtr
              - url: http://example.com/strict
            "#,
        );
        let reports = run_group(
            Arc::new(FakeTools),
            Arc::new(ToolConfig::default()),
            "edge",
            &group,
        )
        .await;

        let summary: Vec<(&str, bool)> = reports
            .iter()
            .map(|r| (r.target.as_str(), r.is_success()))
            .collect();
        assert_eq!(
            summary,
            [
                ("http://example.com/", true),
                ("https://example.org/", true),
                ("example.net", true),
                ("http://example.com/strict", false),
            ]
        );
        assert!(reports.iter().all(|r| r.group == "edge"));
    }

    #[tokio::test]
    async fn test_mtr_command_from_config() {
        let group = group(
            r#"
            targets:
              - url: example.net
                kind: mtr
                mtr_command: "mtr-wide example.net --report-wide -b"
            "#,
        );
        let reports = run_group(
            Arc::new(FakeTools),
            Arc::new(ToolConfig::default()),
            "paths",
            &group,
        )
        .await;
        match &reports[0].outcome {
            Outcome::Mtr { report } => {
                assert_eq!(report.hops.len(), 2);
                assert_eq!(report.lossy_hop, Some(2));
            }
            other => panic!("expected mtr outcome, got {other:?}"),
        }
        assert!(!reports[0].is_success());
    }

    #[tokio::test]
    async fn test_failed_probe_is_reported() {
        let tools = ToolConfig {
            curl: "missing-curl".to_string(),
            ..ToolConfig::default()
        };
        let group = group("targets: [{url: 'http://example.com/'}]");
        let reports = run_group(Arc::new(FakeTools), Arc::new(tools), "g", &group).await;
        assert!(matches!(reports[0].outcome, Outcome::Failed { .. }));

        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["kind"], "failed");
        assert_eq!(json["group"], "g");
    }
}
