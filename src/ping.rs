//! ping output parsing

use serde::Serialize;

use crate::error::{ParseError, ProbeError};
use crate::exec::CommandRunner;

pub const DEFAULT_PING_BIN: &str = "ping";

/// Round-trip statistics from the closing `min/avg/max` line, in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RttStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub stddev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingSummary {
    pub sent: u32,
    pub received: u32,
    /// Fraction of packets lost, rounded to two decimals.
    pub loss: f64,
    /// Absent when every packet was lost.
    pub rtt: Option<RttStats>,
    /// Per-reply round trip times, duplicates excluded.
    pub times: Vec<f64>,
}

fn parse_rtt(line: &str) -> Option<RttStats> {
    // `round-trip min/avg/max/stddev = 46.942/89.985/244.588/41.762 ms`
    // `rtt min/avg/max/mdev = 11.2/12.0/13.1/0.5 ms`
    let values = line.split('=').nth(1)?.split_whitespace().next()?;
    let stats: Vec<f64> = values
        .split('/')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match stats[..] {
        [min, avg, max, stddev] => Some(RttStats {
            min,
            avg,
            max,
            stddev,
        }),
        _ => None,
    }
}

impl PingSummary {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut counts = None;
        let mut rtt = None;
        let mut times = Vec::new();

        for line in raw.lines() {
            if line.contains("packets transmitted") {
                // `10 packets transmitted, 9 received, 10% packet loss`
                let info: Vec<&str> = line.split_whitespace().collect();
                let parse = |i: usize| info.get(i).and_then(|t| t.parse::<u32>().ok());
                match (parse(0), parse(3)) {
                    (Some(sent), Some(received)) => counts = Some((sent, received)),
                    _ => {
                        return Err(ParseError::PingLine {
                            line: line.to_string(),
                        });
                    }
                }
            } else if line.contains("min/avg/max") {
                rtt = Some(parse_rtt(line).ok_or_else(|| ParseError::PingLine {
                    line: line.to_string(),
                })?);
            } else if line.contains("bytes from") && !line.contains("(DUP!)") {
                let time = line
                    .split_whitespace()
                    .find_map(|t| t.strip_prefix("time="))
                    .and_then(|t| t.parse::<f64>().ok());
                match time {
                    Some(time) => times.push(time),
                    None => log::debug!("Reply without time: {line:?}"),
                }
            }
        }

        let (sent, received) = counts.ok_or(ParseError::PingSummary("packets transmitted"))?;
        if rtt.is_none() && received > 0 {
            return Err(ParseError::PingSummary("round-trip"));
        }
        let loss = if sent == 0 {
            0.0
        } else {
            let fraction = f64::from(sent.saturating_sub(received)) / f64::from(sent);
            (fraction * 100.0).round() / 100.0
        };

        Ok(PingSummary {
            sent,
            received,
            loss,
            rtt,
            times,
        })
    }
}

/// `ping -c <count> <destination>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingProbe {
    pub program: String,
    pub destination: String,
    pub count: u32,
}

impl PingProbe {
    pub fn new(destination: impl Into<String>, count: u32) -> Self {
        Self {
            program: DEFAULT_PING_BIN.to_string(),
            destination: destination.into(),
            count,
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.count.to_string(),
            self.destination.clone(),
        ]
    }

    pub async fn run<R: CommandRunner>(&self, runner: &R) -> Result<PingSummary, ProbeError> {
        let output = runner.run(&self.program, &self.args()).await?;
        // ping exits 1 when replies were lost; the summary is still printed.
        if output.exit_code.is_some_and(|code| code > 1) {
            log::warn!(
                "ping exited with {:?} for {}: {}",
                output.exit_code,
                self.destination,
                output.stderr.trim()
            );
        }
        Ok(PingSummary::parse(&output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BSD_OUTPUT: &str = "\
PING 1.1.1.1 (1.1.1.1): 56 data bytes
64 bytes from 1.1.1.1: icmp_seq=0 ttl=253 time=95.450 ms
64 bytes from 1.1.1.1: icmp_seq=0 ttl=253 time=98.275 ms (DUP!)
64 bytes from 1.1.1.1: icmp_seq=1 ttl=253 time=96.287 ms
Request timeout for icmp_seq 2

--- 1.1.1.1 ping statistics ---
3 packets transmitted, 2 packets received, +1 duplicates, 33.3% packet loss
round-trip min/avg/max/stddev = 95.450/96.670/98.275/1.180 ms
";

    const LINUX_OUTPUT: &str = "\
PING example.com (93.184.216.34) 56(84) bytes of data.
64 bytes from 93.184.216.34 (93.184.216.34): icmp_seq=1 ttl=56 time=11.2 ms
64 bytes from 93.184.216.34 (93.184.216.34): icmp_seq=2 ttl=56 time=12.9 ms

--- example.com ping statistics ---
2 packets transmitted, 2 received, 0% packet loss, time 1001ms
rtt min/avg/max/mdev = 11.200/12.050/12.900/0.850 ms
";

    #[test]
    fn test_bsd_output() {
        let summary = PingSummary::parse(BSD_OUTPUT).unwrap();
        assert_eq!(summary.sent, 3);
        assert_eq!(summary.received, 2);
        assert_eq!(summary.loss, 0.33);
        assert_eq!(summary.times, [95.45, 96.287]);
        assert_eq!(
            summary.rtt,
            Some(RttStats {
                min: 95.45,
                avg: 96.67,
                max: 98.275,
                stddev: 1.18,
            })
        );
    }

    #[test]
    fn test_linux_output() {
        let summary = PingSummary::parse(LINUX_OUTPUT).unwrap();
        assert_eq!(summary.loss, 0.0);
        assert_eq!(summary.times, [11.2, 12.9]);
        assert_eq!(summary.rtt.map(|r| r.max), Some(12.9));
    }

    #[test]
    fn test_total_loss_has_no_rtt() {
        let raw = "\
--- 10.255.255.1 ping statistics ---
4 packets transmitted, 0 packets received, 100.0% packet loss
";
        let summary = PingSummary::parse(raw).unwrap();
        assert_eq!(summary.loss, 1.0);
        assert_eq!(summary.rtt, None);
        assert!(summary.times.is_empty());
    }

    #[test]
    fn test_missing_statistics() {
        assert_eq!(
            PingSummary::parse("ping: cannot resolve nope.invalid: Unknown host"),
            Err(ParseError::PingSummary("packets transmitted"))
        );
    }
}
