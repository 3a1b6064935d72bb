use serde::Serialize;

use crate::error::{FormatIssue, TraceError};

pub const SUMMARY_PREFIX: &str = "curlout:";

/// Field names of the summary line after the prefix, in order.
pub const SUMMARY_FIELDS: [&str; 7] = [
    "speed_download",
    "time_namelookup",
    "time_connect",
    "time_appconnect",
    "time_pretransfer",
    "time_starttransfer",
    "time_total",
];

/// The `-w` write-out template producing a line `PhaseTiming::parse` accepts.
pub const WRITE_OUT: &str = "curlout:%{speed_download}:%{time_namelookup}:%{time_connect}:%{time_appconnect}:%{time_pretransfer}:%{time_starttransfer}:%{time_total}";

/// Per-phase latency derived from curl's cumulative timers.
///
/// See <https://blog.cloudflare.com/a-question-of-timing/> for what each
/// interval covers. Every phase is the difference of two consecutive timers
/// floored to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseTiming {
    pub throughput_mbps: f64,
    /// Name resolution.
    pub dns_ms: i64,
    /// TCP connect (SYN to SYN-ACK).
    pub tcp_ms: i64,
    /// TLS handshake; zero for plain HTTP.
    pub ssl_ms: i64,
    /// Until curl is ready to send the request.
    pub req_ms: i64,
    /// Request sent to first response byte.
    pub ttfb_ms: i64,
    /// First to last response byte.
    pub xfer_ms: i64,
}

fn floor_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).floor() as i64
}

impl PhaseTiming {
    /// Parses the write-out line. The last `curlout:` occurrence in `stdout`
    /// is used, so anything printed before it is tolerated.
    pub fn parse(stdout: &str) -> Result<Self, TraceError> {
        let line = stdout.trim();
        let format_error = |issue| TraceError::Format {
            line: line.to_string(),
            issue,
        };

        let start = line
            .rfind(SUMMARY_PREFIX)
            .ok_or_else(|| format_error(FormatIssue::MissingPrefix))?;
        let summary = line[start + SUMMARY_PREFIX.len()..].trim();

        let raw: Vec<&str> = summary.split(':').map(str::trim).collect();
        if raw.len() < SUMMARY_FIELDS.len() {
            return Err(format_error(FormatIssue::MissingFields(
                SUMMARY_FIELDS[raw.len()..].to_vec(),
            )));
        }
        if raw.len() > SUMMARY_FIELDS.len() {
            return Err(format_error(FormatIssue::ExtraFields(raw.len())));
        }

        let mut values = [0f64; 7];
        for ((slot, value), field) in values.iter_mut().zip(&raw).zip(SUMMARY_FIELDS) {
            *slot = value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    format_error(FormatIssue::NotNumeric {
                        field,
                        value: value.to_string(),
                    })
                })?;
        }

        let [speed, namelookup, connect, appconnect, pretransfer, starttransfer, total] = values;
        let [namelookup, connect, appconnect, pretransfer, starttransfer, total] =
            [namelookup, connect, appconnect, pretransfer, starttransfer, total].map(floor_ms);

        Ok(PhaseTiming {
            throughput_mbps: speed * 8.0 / 1_000_000.0,
            dns_ms: namelookup,
            tcp_ms: connect - namelookup,
            ssl_ms: appconnect - connect,
            req_ms: pretransfer - appconnect,
            ttfb_ms: starttransfer - pretransfer,
            xfer_ms: total - starttransfer,
        })
    }

    /// Sum of every phase, i.e. `floor(time_total * 1000)`.
    pub fn total_ms(&self) -> i64 {
        self.dns_ms + self.tcp_ms + self.ssl_ms + self.req_ms + self.ttfb_ms + self.xfer_ms
    }
}
