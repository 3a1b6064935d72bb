//! Human-readable rendering of probe results
//!
//! Everything here works from the parsed records; nothing is collected while
//! parsing.

use std::collections::BTreeMap;
use std::fmt::Write;

use unicode_truncate::UnicodeTruncateStr;

use crate::curl::prelude::*;
use crate::mtr::MtrReport;
use crate::ping::PingSummary;
use crate::util::asn::AsnRecord;

pub fn to_fixed_width(input: &str, width: usize) -> String {
    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

/// Column-aligned table, `|`-separated. With `heading` the first row is
/// underlined. Cells wider than `max_cell` are truncated.
pub fn pretty_table(rows: &[Vec<String>], heading: bool, max_cell: usize) -> String {
    let rows: Vec<&Vec<String>> = rows.iter().filter(|r| !r.is_empty()).collect();
    let Some(columns) = rows.iter().map(|r| r.len()).max() else {
        return String::new();
    };

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|cell| cell.chars().count().min(max_cell))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |row: &Vec<String>| {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let _ = write!(line, "{} | ", to_fixed_width(cell, *width));
        }
        line
    };

    let mut out = String::new();
    let mut body = rows.as_slice();
    if heading {
        let header = format_row(rows[0]);
        let _ = writeln!(out, "{header}");
        let _ = writeln!(out, "{}", "-".repeat(header.chars().count()));
        body = &rows[1..];
    }
    for row in body {
        let _ = writeln!(out, "{}", format_row(*row));
    }
    out
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

fn header_rows(headers: &HeaderMap) -> Vec<Vec<String>> {
    headers
        .iter()
        .flat_map(|(name, values)| values.iter().map(move |v| vec![name.to_string(), v.clone()]))
        .collect()
}

pub fn render_probe(result: &ProbeResult, verbose: bool) -> String {
    let mut out = String::new();
    let status = result
        .response
        .start
        .as_ref()
        .map(|s| format!("{} {}", s.version, s.code))
        .unwrap_or_else(|| "no response".to_string());
    let _ = writeln!(out, "{} ({status})", result.target);
    let _ = writeln!(
        out,
        "peer {}:{} conn {} tls {} {}",
        opt(&result.connection.peer_ip),
        opt(&result.connection.peer_port),
        opt(&result.connection.connection_id),
        opt(&result.tls.protocol),
        opt(&result.tls.cipher),
    );

    let t = &result.timing;
    let phases: Vec<Vec<String>> = vec![
        vec!["dns", "tcp", "ssl", "req", "ttfb", "xfer", "Mbps"]
            .into_iter()
            .map(String::from)
            .collect(),
        vec![
            t.dns_ms.to_string(),
            t.tcp_ms.to_string(),
            t.ssl_ms.to_string(),
            t.req_ms.to_string(),
            t.ttfb_ms.to_string(),
            t.xfer_ms.to_string(),
            format!("{:.2}", t.throughput_mbps),
        ],
    ];
    out.push_str(&pretty_table(&phases, true, 12));

    if !result.timeline.is_empty() {
        let mut rows = vec![vec!["stage".to_string(), "ms".to_string()]];
        rows.extend(
            result
                .timeline
                .entries()
                .iter()
                .map(|e| vec![e.stage.clone(), e.relative_ms.to_string()]),
        );
        out.push('\n');
        out.push_str(&pretty_table(&rows, true, 40));
    }

    if verbose {
        for (title, lines) in [
            ("request", &result.transcript.request),
            ("response", &result.transcript.response),
            ("info", &result.transcript.info),
        ] {
            let _ = writeln!(out, "\n{title}:");
            for line in lines {
                let _ = writeln!(out, "  {line}");
            }
        }
    } else if !result.response.headers.is_empty() {
        out.push('\n');
        out.push_str(&pretty_table(&header_rows(&result.response.headers), false, 60));
    }

    out
}

pub fn render_mtr(report: &MtrReport, asn: Option<&BTreeMap<String, AsnRecord>>) -> String {
    let mut rows = vec![
        ["hop", "name", "ip", "asn", "loss%", "snt", "avg", "best", "wrst", "stdev", "lossy"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>(),
    ];
    for hop in &report.hops {
        let asn = asn
            .and_then(|records| records.get(&hop.ip))
            .map(|r| format!("AS{} {}", r.asn, r.company))
            .unwrap_or_else(|| "-".to_string());
        rows.push(vec![
            hop.count.to_string(),
            hop.name.clone(),
            hop.ip.clone(),
            asn,
            format!("{:.1}", hop.loss_pct),
            hop.sent.to_string(),
            format!("{:.1}", hop.avg),
            format!("{:.1}", hop.best),
            format!("{:.1}", hop.worst),
            format!("{:.1}", hop.stdev),
            if hop.is_lossy { "yes" } else { "" }.to_string(),
        ]);
    }

    let mut out = pretty_table(&rows, true, 32);
    match report.lossy_hop {
        Some(hop) => {
            let _ = writeln!(out, "loss starts at hop {hop}");
        }
        None => {
            let _ = writeln!(out, "no persistent loss");
        }
    }
    out
}

pub fn render_ping(destination: &str, summary: &PingSummary) -> String {
    let rtt = summary
        .rtt
        .map(|r| {
            format!(
                "min/avg/max/stddev {:.3}/{:.3}/{:.3}/{:.3} ms",
                r.min, r.avg, r.max, r.stddev
            )
        })
        .unwrap_or_else(|| "no replies".to_string());
    format!(
        "{destination}: {}/{} received, {:.0}% loss, {rtt}\n",
        summary.received,
        summary.sent,
        summary.loss * 100.0
    )
}
