use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseError;

/// One row of an mtr report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hop {
    pub count: u32,
    /// Reverse DNS name, `-` when mtr only printed an address.
    pub name: String,
    pub ip: String,
    pub loss_pct: f64,
    pub sent: u32,
    pub last: f64,
    pub avg: f64,
    pub best: f64,
    pub worst: f64,
    pub stdev: f64,
    pub is_lossy: bool,
}

/// A parsed mtr run with loss attributed to a hop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MtrReport {
    pub started: Option<NaiveDateTime>,
    /// Options mtr reported (JSON) or the header columns (text).
    pub meta: BTreeMap<String, serde_json::Value>,
    pub hops: Vec<Hop>,
    pub lossy_hop: Option<u32>,
}

/// Splits mtr's `name (ip)` host column. A lone token is an address.
fn split_host(parts: &[&str]) -> (String, String) {
    match parts {
        [] => ("-".to_string(), "???".to_string()),
        [only] => ("-".to_string(), only.to_string()),
        [name, ip, ..] => (name.to_string(), ip.trim_matches(['(', ')']).to_string()),
    }
}

fn count_from_number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }
    match Count::deserialize(d)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct JsonHub {
    #[serde(deserialize_with = "count_from_number_or_string")]
    count: u32,
    host: String,
    #[serde(rename = "Loss%")]
    loss: f64,
    #[serde(rename = "Snt")]
    sent: u32,
    #[serde(rename = "Last")]
    last: f64,
    #[serde(rename = "Avg")]
    avg: f64,
    #[serde(rename = "Best")]
    best: f64,
    #[serde(rename = "Wrst")]
    worst: f64,
    #[serde(rename = "StDev")]
    stdev: f64,
}

#[derive(Deserialize)]
struct JsonBody {
    #[serde(default)]
    mtr: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    hubs: Vec<JsonHub>,
}

#[derive(Deserialize)]
struct JsonReport {
    report: JsonBody,
}

impl MtrReport {
    /// Parses `mtr -j` output.
    pub fn from_json(raw: &str) -> Result<Self, ParseError> {
        let parsed: JsonReport =
            serde_json::from_str(raw).map_err(|e| ParseError::MtrJson(e.to_string()))?;

        let hops = parsed
            .report
            .hubs
            .into_iter()
            .map(|hub| {
                let parts: Vec<&str> = hub.host.split_whitespace().collect();
                let (name, ip) = split_host(&parts);
                Hop {
                    count: hub.count,
                    name,
                    ip,
                    loss_pct: hub.loss,
                    sent: hub.sent,
                    last: hub.last,
                    avg: hub.avg,
                    best: hub.best,
                    worst: hub.worst,
                    stdev: hub.stdev,
                    is_lossy: false,
                }
            })
            .collect();

        Ok(Self::finish(None, parsed.report.mtr, hops))
    }

    /// Parses `mtr --report-wide -b` text output.
    pub fn from_text(raw: &str) -> Result<Self, ParseError> {
        let mut started = None;
        let mut meta = BTreeMap::new();
        let mut hops = Vec::new();

        for line in raw.lines() {
            if let Some(start) = line.strip_prefix("Start: ") {
                started = parse_start(start.trim());
            } else if let Some(header) = line.strip_prefix("HOST: ") {
                let columns: Vec<serde_json::Value> =
                    header.split_whitespace().map(Into::into).collect();
                meta.insert("columns".to_string(), columns.into());
            } else if is_hop_line(line) {
                hops.push(parse_hop(line)?);
            }
        }

        Ok(Self::finish(started, meta, hops))
    }

    fn finish(
        started: Option<NaiveDateTime>,
        meta: BTreeMap<String, serde_json::Value>,
        mut hops: Vec<Hop>,
    ) -> Self {
        hops.sort_by_key(|h| h.count);
        let lossy_hop = find_lossy_hop(&hops);
        if let Some(lossy) = lossy_hop {
            for hop in hops.iter_mut().filter(|h| h.count >= lossy) {
                hop.is_lossy = true;
            }
        }
        MtrReport {
            started,
            meta,
            hops,
            lossy_hop,
        }
    }

    pub fn hop(&self, count: u32) -> Option<&Hop> {
        self.hops.iter().find(|h| h.count == count)
    }
}

/// `2021-02-20T06:57:56+0000`; the offset is dropped.
fn parse_start(s: &str) -> Option<NaiveDateTime> {
    let local = s.get(..19).unwrap_or(s);
    NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S").ok()
}

/// `  1.|-- 192.168.1.1 ...` or `  2.|-- ???`.
fn is_hop_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    (1..=3).contains(&digits) && trimmed[digits..].starts_with(".|--")
}

const STAT_COLUMNS: usize = 7;

fn parse_hop(line: &str) -> Result<Hop, ParseError> {
    let err = |reason: &str| ParseError::Hop {
        line: line.to_string(),
        reason: reason.to_string(),
    };
    let cleaned = line.replacen(".|--", " ", 1);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() < STAT_COLUMNS + 1 {
        return Err(err("too few columns"));
    }

    let count: u32 = tokens[0].parse().map_err(|_| err("hop number"))?;
    let stats = &tokens[tokens.len() - STAT_COLUMNS..];
    let num = |i: usize, what: &str| -> Result<f64, ParseError> {
        stats[i].trim_end_matches('%').parse().map_err(|_| err(what))
    };
    let (name, ip) = split_host(&tokens[1..tokens.len() - STAT_COLUMNS]);

    Ok(Hop {
        count,
        name,
        ip,
        loss_pct: num(0, "Loss%")?,
        sent: stats[1].parse().map_err(|_| err("Snt"))?,
        last: num(2, "Last")?,
        avg: num(3, "Avg")?,
        best: num(4, "Best")?,
        worst: num(5, "Wrst")?,
        stdev: num(6, "StDev")?,
        is_lossy: false,
    })
}

/// The hop right after the last loss-free hop, unless the final hop itself
/// is loss-free. Loss that clears up further along the path is treated as
/// ICMP rate limiting rather than real loss.
pub fn find_lossy_hop(hops: &[Hop]) -> Option<u32> {
    let last = hops.iter().max_by_key(|h| h.count)?;
    if last.loss_pct == 0.0 {
        return None;
    }
    let last_clean = hops
        .iter()
        .filter(|h| h.loss_pct == 0.0)
        .map(|h| h.count)
        .max()
        .unwrap_or(0);
    Some(last_clean + 1)
}
