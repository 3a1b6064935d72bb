use serde::Serialize;

use super::milestone::MilestoneLog;
use crate::error::TraceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub stage: String,
    pub relative_ms: i64,
}

/// TLS handshake stages with the time each took.
///
/// The first entry is measured from the TCP connect, every later one from
/// the previous handshake stage. Plain HTTP probes have an empty timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConnectionTimeline(Vec<TimelineEntry>);

impl ConnectionTimeline {
    pub fn from_log(log: &MilestoneLog) -> Result<Self, TraceError> {
        let handshakes: Vec<_> = log.handshakes().collect();
        let Some(first) = handshakes.first() else {
            return Ok(Self::default());
        };
        let connect = log.connect().ok_or(TraceError::MissingMilestone {
            handshakes: handshakes.len(),
        })?;

        let mut entries = Vec::with_capacity(handshakes.len());
        entries.push(TimelineEntry {
            stage: first.name.clone(),
            relative_ms: first.timestamp.millis_since(&connect.timestamp),
        });
        for pair in handshakes.windows(2) {
            entries.push(TimelineEntry {
                stage: pair[1].name.clone(),
                relative_ms: pair[1].timestamp.millis_since(&pair[0].timestamp),
            });
        }

        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
