use chrono::{DateTime, Utc};
use serde::Serialize;

use super::classify::{TraceEvent, classify};
use super::headers::{RequestHeaders, ResponseHeaders};
use super::milestone::{ConnectionInfo, Milestone, MilestoneLog, TlsInfo};
use super::timeline::ConnectionTimeline;
use super::timing::PhaseTiming;
use crate::error::TraceError;

/// Content of every classified line, per side, for human display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub request: Vec<String>,
    pub response: Vec<String>,
    pub info: Vec<String>,
}

/// Everything learnt from one curl run against one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub target: String,
    pub command: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub request: RequestHeaders,
    pub response: ResponseHeaders,
    pub connection: ConnectionInfo,
    pub tls: TlsInfo,
    pub timing: PhaseTiming,
    pub milestones: Vec<Milestone>,
    pub timeline: ConnectionTimeline,
    #[serde(skip_serializing_if = "is_empty_transcript")]
    pub transcript: Transcript,
}

fn is_empty_transcript(t: &Transcript) -> bool {
    t.request.is_empty() && t.response.is_empty() && t.info.is_empty()
}

impl ProbeResult {
    /// Builds a result from captured curl output.
    ///
    /// `stdout` must hold the `curlout:` summary and `stderr` the verbose
    /// trace. The same input always yields the same result; `captured_at`
    /// and `exit_code` are left for the caller to fill in.
    pub fn parse(
        target: &str,
        command: &str,
        stdout: &str,
        stderr: &str,
    ) -> Result<Self, TraceError> {
        let timing = PhaseTiming::parse(stdout)?;

        let mut request = RequestHeaders::default();
        let mut response = ResponseHeaders::default();
        let mut log = MilestoneLog::new();
        let mut transcript = Transcript::default();

        for event in classify(stderr) {
            match event {
                TraceEvent::Request(line) => {
                    request.accept(line.content);
                    transcript.request.push(line.content.to_string());
                }
                TraceEvent::Response(line) => {
                    response.accept(line.content);
                    transcript.response.push(line.content.to_string());
                }
                TraceEvent::Info(line) => {
                    log.accept_info(&line);
                    transcript.info.push(line.content.to_string());
                }
                TraceEvent::Handshake { stage, timestamp } => {
                    log.accept_handshake(&stage, timestamp)
                }
                TraceEvent::BlockEnd(_) => {}
            }
        }

        let timeline = ConnectionTimeline::from_log(&log)?;
        let connection = log.connection.clone();
        let tls = log.tls.clone();

        Ok(ProbeResult {
            target: target.to_string(),
            command: command.to_string(),
            captured_at: None,
            exit_code: None,
            request,
            response,
            connection,
            tls,
            timing,
            milestones: log.into_milestones(),
            timeline,
            transcript,
        })
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response.status_code()
    }

    pub fn is_tls(&self) -> bool {
        !self.timeline.is_empty() || self.tls.protocol.is_some()
    }
}
