use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::time::sleep;

use netdiag::cli::{Args, Command};
use netdiag::config::app_config::{ToolConfig, load_config};
use netdiag::curl::prelude::*;
use netdiag::exec::SystemRunner;
use netdiag::mtr::MtrProbe;
use netdiag::ping::PingProbe;
use netdiag::report::{render_mtr, render_ping, render_probe, to_fixed_width};
use netdiag::runner::{Outcome, TargetReport, run_group};
use netdiag::util::ip::{is_ip, is_private_ip};
use netdiag::util::{asn, target_host};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_target(report: &TargetReport, group_width: usize) {
    let group = to_fixed_width(&report.group, group_width);
    let url = &report.target;
    match &report.outcome {
        Outcome::Curl { accepted: true, result } => {
            let t = &result.timing;
            println!(
                "[{group}] ✅ URL: {url}, Status: {:?}, Total: {}ms (dns {} tcp {} ssl {} ttfb {})",
                result.status_code(),
                t.total_ms(),
                t.dns_ms,
                t.tcp_ms,
                t.ssl_ms,
                t.ttfb_ms
            );
        }
        Outcome::Curl { result, .. } => {
            println!(
                "[{group}] ❌ Unexpected status for {url}: {:?}",
                result.status_code()
            );
        }
        Outcome::Mtr { report } => match report.lossy_hop {
            None => println!("[{group}] ✅ Path to {url}: no persistent loss"),
            Some(hop) => println!("[{group}] ❌ Path to {url}: loss starts at hop {hop}"),
        },
        Outcome::Ping { summary } => {
            let mark = if summary.received > 0 { "✅" } else { "❌" };
            println!(
                "[{group}] {mark} Ping {url}: {}/{} received, avg {:?}ms",
                summary.received,
                summary.sent,
                summary.rtt.map(|r| r.avg)
            );
        }
        Outcome::Failed { error } => println!("[{group}] ❌ Probe error for {url}: {error}"),
    }
}

async fn run_configured(
    tools: ToolConfig,
    config: Option<&Path>,
    once: bool,
    json: bool,
) -> Result<()> {
    let app = load_config(config).context("Failed to load probe configuration")?;
    let tools = Arc::new(tools);
    let runner = Arc::new(SystemRunner::new(tools.timeout));
    let width = app.max_group_width;

    let mut handles = vec![];
    for (name, group) in app.config {
        let tools = tools.clone();
        let runner = runner.clone();

        handles.push(tokio::spawn(async move {
            loop {
                for report in run_group(runner.clone(), tools.clone(), &name, &group).await {
                    if json {
                        if let Err(e) = print_json(&report) {
                            log::error!("Failed to serialize result for {}: {e}", report.target);
                        }
                    } else {
                        print_target(&report, width);
                    }
                }
                if once {
                    break;
                }
                sleep(Duration::from_secs(group.polling_interval_seconds)).await;
            }
        }));
    }

    for handle in handles {
        handle.await.context("Probe group task panicked")?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut tools = ToolConfig::from_env().context("Invalid environment")?;
    log::debug!("Using tools: {tools:?}");
    if let Some(secs) = args.timeout {
        tools.timeout = Duration::from_secs(secs);
    }
    let runner = SystemRunner::new(tools.timeout);

    match &args.command {
        Command::Curl {
            url,
            headers,
            extra,
            verbose,
        } => {
            let mut invocation = CurlInvocation::new(url)
                .with_program(&tools.curl)
                .with_headers(headers);
            if let Some(extra) = extra {
                invocation = invocation.with_extra_options(extra)?;
            }
            let result = probe_url(&runner, &invocation)
                .await
                .with_context(|| format!("Probe of {url} failed"))?;
            if args.json {
                print_json(&result)?;
            } else {
                print!("{}", render_probe(&result, *verbose));
            }
        }
        Command::Mtr {
            destination,
            count,
            packet_size,
            asn: with_asn,
            mtr_command,
        } => {
            let probe = MtrProbe {
                program: tools.mtr.clone(),
                packet_size: *packet_size,
                count: *count,
                command: mtr_command.clone(),
                ..MtrProbe::new(target_host(destination)?)
            };
            let report = probe
                .run(&runner)
                .await
                .with_context(|| format!("mtr towards {destination} failed"))?;

            let records = if *with_asn {
                let ips = report
                    .hops
                    .iter()
                    .map(|h| h.ip.as_str())
                    .filter(|ip| is_ip(ip) && !is_private_ip(ip));
                match asn::lookup(ips, tools.timeout).await {
                    Ok(records) => Some(records),
                    Err(e) => {
                        log::warn!("ASN lookup failed: {e}");
                        None
                    }
                }
            } else {
                None
            };

            if args.json {
                print_json(&serde_json::json!({ "report": report, "asn": records }))?;
            } else {
                print!("{}", render_mtr(&report, records.as_ref()));
            }
        }
        Command::Ping { destination, count } => {
            let host = target_host(destination)?;
            let probe = PingProbe {
                program: tools.ping.clone(),
                ..PingProbe::new(host.clone(), *count)
            };
            let summary = probe
                .run(&runner)
                .await
                .with_context(|| format!("ping of {host} failed"))?;
            if args.json {
                print_json(&summary)?;
            } else {
                print!("{}", render_ping(&host, &summary));
            }
        }
        Command::Run { config, once } => {
            run_configured(tools, config.as_deref(), *once, args.json).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
