use serde::Serialize;

use super::classify::{TraceLine, TraceTime};

pub const CONNECT_MILESTONE: &str = "connect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    Connect,
    Handshake,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub name: String,
    pub kind: MilestoneKind,
    pub timestamp: TraceTime,
}

/// Peer and local details from `* Connected to host (ip) port N (#id)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub peer_ip: Option<String>,
    pub peer_port: Option<u16>,
    pub connection_id: Option<String>,
}

/// Negotiated parameters from `* SSL connection using TLSv1.3 / CIPHER`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TlsInfo {
    pub protocol: Option<String>,
    pub cipher: Option<String>,
}

/// Connection milestones in the order they appear in the trace, plus the
/// connection facts found along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneLog {
    milestones: Vec<Milestone>,
    pub connection: ConnectionInfo,
    pub tls: TlsInfo,
}

/// Removes one wrapping bracket or quote character from each end.
fn strip_wrapping(token: &str) -> &str {
    let token = token
        .strip_prefix(['(', '[', '{', '<', '"', '\''])
        .unwrap_or(token);
    token
        .strip_suffix([')', ']', '}', '>', '"', '\''])
        .unwrap_or(token)
}

impl MilestoneLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn into_milestones(self) -> Vec<Milestone> {
        self.milestones
    }

    /// The first connect milestone, which anchors the handshake timeline.
    pub fn connect(&self) -> Option<&Milestone> {
        self.milestones
            .iter()
            .find(|m| m.kind == MilestoneKind::Connect)
    }

    pub fn handshakes(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones
            .iter()
            .filter(|m| m.kind == MilestoneKind::Handshake)
    }

    /// Feeds a `*` line that is not a handshake annotation.
    ///
    /// Returns `true` when the line carried structured facts.
    pub fn accept_info(&mut self, line: &TraceLine<'_>) -> bool {
        if line.content.contains("Connected") {
            self.record_connect(line);
            true
        } else if line.content.contains("SSL connection") {
            let tokens: Vec<&str> = line.content.split_whitespace().collect();
            self.tls = TlsInfo {
                protocol: tokens.get(3).map(|t| t.to_string()),
                cipher: tokens.get(5).map(|t| t.to_string()),
            };
            true
        } else {
            false
        }
    }

    pub fn accept_handshake(&mut self, stage: &str, timestamp: TraceTime) {
        self.milestones.push(Milestone {
            name: stage.to_string(),
            kind: MilestoneKind::Handshake,
            timestamp,
        });
    }

    fn record_connect(&mut self, line: &TraceLine<'_>) {
        let tokens: Vec<&str> = line.content.split_whitespace().collect();

        // Older curl appends `(#0)` after the port, newer curl ends at the port.
        let (port, id) = match tokens.iter().rposition(|t| *t == "port") {
            Some(pos) => (tokens.get(pos + 1), tokens.get(pos + 2)),
            None if tokens.len() >= 2 => (tokens.get(tokens.len() - 2), tokens.last()),
            None => (None, None),
        };

        self.connection = ConnectionInfo {
            peer_ip: tokens.get(3).map(|t| strip_wrapping(t).to_string()),
            peer_port: port.and_then(|p| p.parse().ok()),
            connection_id: id.map(|t| strip_wrapping(t).to_string()),
        };

        match line.timestamp {
            Some(timestamp) => self.milestones.push(Milestone {
                name: CONNECT_MILESTONE.to_string(),
                kind: MilestoneKind::Connect,
                timestamp,
            }),
            None => log::debug!("Connected line without timestamp: {:?}", line.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::classify::parse_line;

    fn info(log: &mut MilestoneLog, raw: &str) -> bool {
        let line = parse_line(raw).unwrap();
        log.accept_info(&line)
    }

    #[test]
    fn test_connected_with_connection_id() {
        let mut log = MilestoneLog::new();
        assert!(info(
            &mut log,
            "10:00:00.050000 * Connected to example.com (93.184.216.34) port 443 (#0)"
        ));
        assert_eq!(
            log.connection,
            ConnectionInfo {
                peer_ip: Some("93.184.216.34".to_string()),
                peer_port: Some(443),
                connection_id: Some("#0".to_string()),
            }
        );
        let connect = log.connect().unwrap();
        assert_eq!(connect.name, CONNECT_MILESTONE);
        assert_eq!(connect.timestamp.to_string(), "10:00:00.050000");
    }

    #[test]
    fn test_connected_without_connection_id() {
        let mut log = MilestoneLog::new();
        info(
            &mut log,
            "10:00:00.050000 * Connected to example.com (93.184.216.34) port 443",
        );
        assert_eq!(log.connection.peer_ip.as_deref(), Some("93.184.216.34"));
        assert_eq!(log.connection.peer_port, Some(443));
        assert_eq!(log.connection.connection_id, None);
    }

    #[test]
    fn test_connected_ipv6_peer() {
        let mut log = MilestoneLog::new();
        info(
            &mut log,
            "10:00:00.050000 * Connected to example.com (2606:2800:220:1::1) port 80 (#3)",
        );
        assert_eq!(log.connection.peer_ip.as_deref(), Some("2606:2800:220:1::1"));
        assert_eq!(log.connection.peer_port, Some(80));
        assert_eq!(log.connection.connection_id.as_deref(), Some("#3"));
    }

    #[test]
    fn test_connected_without_timestamp_records_facts_only() {
        let mut log = MilestoneLog::new();
        info(&mut log, "* Connected to example.com (93.184.216.34) port 443 (#0)");
        assert_eq!(log.connection.peer_port, Some(443));
        assert!(log.connect().is_none());
    }

    #[test]
    fn test_ssl_connection_facts() {
        let mut log = MilestoneLog::new();
        assert!(info(
            &mut log,
            "10:00:00.300000 * SSL connection using TLSv1.3 / TLS_AES_256_GCM_SHA384 / X25519 / RSASSA-PSS"
        ));
        assert_eq!(log.tls.protocol.as_deref(), Some("TLSv1.3"));
        assert_eq!(log.tls.cipher.as_deref(), Some("TLS_AES_256_GCM_SHA384"));
        assert!(log.milestones().is_empty());
    }

    #[test]
    fn test_other_info_is_not_structured() {
        let mut log = MilestoneLog::new();
        assert!(!info(&mut log, "10:00:00.000100 * Trying 93.184.216.34:443..."));
        assert_eq!(log, MilestoneLog::new());
    }

    #[test]
    fn test_strip_wrapping() {
        assert_eq!(strip_wrapping("(1.2.3.4)"), "1.2.3.4");
        assert_eq!(strip_wrapping("'#0'"), "#0");
        assert_eq!(strip_wrapping("plain"), "plain");
    }
}
