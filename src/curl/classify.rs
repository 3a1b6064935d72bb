use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Serialize, Serializer};

const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Wall-clock capture time written by `--trace-time` (`HH:MM:SS.ffffff`, no date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TraceTime(NaiveTime);

impl TraceTime {
    /// Whole milliseconds from `earlier` to `self`, truncated toward zero.
    ///
    /// Both times are assumed to fall on the same day, so a capture that
    /// straddles midnight yields a negative value.
    pub fn millis_since(&self, earlier: &TraceTime) -> i64 {
        (self.0 - earlier.0).num_milliseconds()
    }
}

impl FromStr for TraceTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, TIME_FORMAT).map(TraceTime)
    }
}

impl fmt::Display for TraceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S%.6f"))
    }
}

impl Serialize for TraceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `>` data sent by curl
    Request,
    /// `<` data received from the server
    Response,
    /// `*` informational
    Info,
}

impl Marker {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Marker::Request),
            '<' => Some(Marker::Response),
            '*' => Some(Marker::Info),
            _ => None,
        }
    }
}

/// One marker line of the trace with the marker and surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine<'a> {
    pub timestamp: Option<TraceTime>,
    pub marker: Marker,
    pub content: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent<'a> {
    Request(TraceLine<'a>),
    Response(TraceLine<'a>),
    Info(TraceLine<'a>),
    /// A `* TLS…` annotation paired with the line that follows it.
    Handshake {
        stage: String,
        /// Leading time token of the partner line.
        timestamp: TraceTime,
    },
    /// A marker with no content: the end of a header block.
    BlockEnd(Marker),
}

/// Splits a physical line into its capture time (if the first token is one)
/// and the remainder.
fn split_timestamp(line: &str) -> (Option<TraceTime>, &str) {
    let trimmed = line.trim_start();
    let (first, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };
    match first.parse::<TraceTime>() {
        Ok(ts) => (Some(ts), rest.trim()),
        Err(_) => (None, trimmed.trim_end()),
    }
}

/// Reads one physical line as a marker line. Lines that do not start with
/// `>`, `<` or `*` (after the optional time token) yield `None`.
pub fn parse_line(line: &str) -> Option<TraceLine<'_>> {
    let (timestamp, body) = split_timestamp(line);
    let marker = Marker::from_char(body.chars().next()?)?;
    Some(TraceLine {
        timestamp,
        marker,
        content: body[1..].trim(),
    })
}

/// `* TLSv1.3 (OUT), TLS handshake, Client hello (1):` → `Client hello (1):`
fn handshake_stage(content: &str) -> String {
    content.split_whitespace().skip(4).collect::<Vec<_>>().join(" ")
}

/// Classifies every line of a `--trace-time -v` capture in one pass.
///
/// Handshake annotations consume the following physical line, which supplies
/// the milestone time. An annotation without a usable partner is dropped.
pub fn classify(trace: &str) -> Vec<TraceEvent<'_>> {
    let lines: Vec<&str> = trace.split('\n').collect();
    let mut events = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        i += 1;

        let Some(line) = parse_line(raw) else {
            continue;
        };

        if line.content.is_empty() {
            events.push(TraceEvent::BlockEnd(line.marker));
            continue;
        }

        match line.marker {
            Marker::Request => events.push(TraceEvent::Request(line)),
            Marker::Response => events.push(TraceEvent::Response(line)),
            Marker::Info if line.content.starts_with("TLS") => {
                let partner = lines.get(i).copied();
                i += 1;
                let timestamp = partner
                    .and_then(|p| p.split_whitespace().next())
                    .and_then(|token| token.parse::<TraceTime>().ok());
                match timestamp {
                    Some(timestamp) => events.push(TraceEvent::Handshake {
                        stage: handshake_stage(line.content),
                        timestamp,
                    }),
                    None => log::debug!("Dropping unpaired handshake line: {raw:?}"),
                }
            }
            Marker::Info => events.push(TraceEvent::Info(line)),
        }
    }

    events
}
