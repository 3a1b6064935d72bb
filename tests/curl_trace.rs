use netdiag::curl::prelude::*;
use netdiag::error::{FormatIssue, TraceError};

const TLS_SUMMARY: &str = "curlout:1250000:0.001000:0.050000:0.150000:0.151000:0.300000:0.500000";

const TLS_TRACE: &str = "\
10:00:00.000100 *   Trying 93.184.216.34:443...
10:00:00.050000 * Connected to example.com (93.184.216.34) port 443 (#0)
10:00:00.050200 * ALPN: offers h2,http/1.1
10:00:00.050300 * TLSv1.3 (OUT), TLS handshake, Client hello (1):
10:00:00.050400 } [512 bytes data]
10:00:00.100000 * TLSv1.3 (IN), TLS handshake, Server hello (2):
10:00:00.100100 { [122 bytes data]
10:00:00.140000 * TLSv1.3 (IN), TLS handshake, Finished (20):
10:00:00.150500 { [52 bytes data]
10:00:00.151000 * SSL connection using TLSv1.3 / TLS_AES_256_GCM_SHA384
10:00:00.152000 > GET / HTTP/1.1
10:00:00.152000 > Host: example.com
10:00:00.152000 > User-Agent: curl/8.4.0
10:00:00.152000 > Accept: */*
10:00:00.152000 >
10:00:00.300000 < HTTP/1.1 200 OK
10:00:00.300100 < Content-Type: text/html; charset=UTF-8
10:00:00.300100 < Set-Cookie: a=1
10:00:00.300100 < Set-Cookie: b=2
10:00:00.300100 <
10:00:00.500000 * Connection #0 to host example.com left intact
";

fn tls_result() -> ProbeResult {
    ProbeResult::parse(
        "https://example.com/",
        "curl https://example.com/",
        TLS_SUMMARY,
        TLS_TRACE,
    )
    .unwrap()
}

#[test]
fn test_tls_trace_headers() {
    let result = tls_result();

    let request = result.request.start.as_ref().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/");
    assert_eq!(request.version, "HTTP/1.1");
    assert_eq!(result.request.headers.first("accept"), Some("*/*"));
    assert_eq!(result.request.headers.len(), 3);

    assert_eq!(result.status_code(), Some(200));
    assert_eq!(
        result.response.headers.get_all("Set-Cookie"),
        ["a=1", "b=2"]
    );
    assert_eq!(
        result.response.headers.first("Content-Type"),
        Some("text/html; charset=UTF-8")
    );
}

#[test]
fn test_tls_trace_connection_facts() {
    let result = tls_result();
    assert_eq!(
        result.connection,
        ConnectionInfo {
            peer_ip: Some("93.184.216.34".to_string()),
            peer_port: Some(443),
            connection_id: Some("#0".to_string()),
        }
    );
    assert_eq!(result.tls.protocol.as_deref(), Some("TLSv1.3"));
    assert_eq!(result.tls.cipher.as_deref(), Some("TLS_AES_256_GCM_SHA384"));
    assert!(result.is_tls());
}

#[test]
fn test_tls_trace_timeline() {
    let result = tls_result();

    let kinds: Vec<MilestoneKind> = result.milestones.iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        [
            MilestoneKind::Connect,
            MilestoneKind::Handshake,
            MilestoneKind::Handshake,
            MilestoneKind::Handshake,
        ]
    );

    let timeline: Vec<(&str, i64)> = result
        .timeline
        .entries()
        .iter()
        .map(|e| (e.stage.as_str(), e.relative_ms))
        .collect();
    assert_eq!(
        timeline,
        [
            ("Client hello (1):", 0),
            ("Server hello (2):", 49),
            ("Finished (20):", 50),
        ]
    );
}

#[test]
fn test_tls_trace_phases() {
    let result = tls_result();
    assert_eq!(result.timing.ssl_ms, 100);
    assert_eq!(result.timing.total_ms(), 500);
}

#[test]
fn test_parse_is_repeatable() {
    assert_eq!(tls_result(), tls_result());
}

#[test]
fn test_json_shape() {
    let json = serde_json::to_value(tls_result()).unwrap();
    assert_eq!(json["response"]["start"]["code"], "200");
    assert_eq!(json["response"]["headers"]["Set-Cookie"][1], "b=2");
    assert_eq!(json["timeline"][1]["stage"], "Server hello (2):");
    assert_eq!(json["milestones"][0]["timestamp"], "10:00:00.050000");
    assert_eq!(json["milestones"][0]["kind"], "connect");
}

#[test]
fn test_plain_http_has_empty_timeline() {
    let trace = "\
10:00:00.010000 * Connected to example.com (93.184.216.34) port 80
10:00:00.010100 > GET / HTTP/1.1
10:00:00.010100 > Host: example.com
10:00:00.010100 >
10:00:00.040000 < HTTP/1.1 301 Moved Permanently
10:00:00.040000 < Location: https://example.com/
10:00:00.040000 <
";
    let result = ProbeResult::parse(
        "http://example.com/",
        "curl http://example.com/",
        "curlout:0:0.001:0.010:0.010:0.010:0.040:0.041",
        trace,
    )
    .unwrap();

    assert!(result.timeline.is_empty());
    assert!(!result.is_tls());
    assert_eq!(result.timing.ssl_ms, 0);
    assert_eq!(result.status_code(), Some(301));
    assert_eq!(result.connection.peer_port, Some(80));
    assert_eq!(result.connection.connection_id, None);
    assert_eq!(result.milestones.len(), 1);
}

#[test]
fn test_short_summary_is_rejected() {
    let err = ProbeResult::parse("t", "c", "curlout:1:2:3:4:5", TLS_TRACE).unwrap_err();
    assert!(matches!(
        err,
        TraceError::Format {
            issue: FormatIssue::MissingFields(ref missing),
            ..
        } if missing == &["time_starttransfer", "time_total"]
    ));
}

#[test]
fn test_handshake_without_connect() {
    let trace = "\
10:00:00.050300 * TLSv1.3 (OUT), TLS handshake, Client hello (1):
10:00:00.050400 } [512 bytes data]
";
    let err = ProbeResult::parse("t", "c", TLS_SUMMARY, trace).unwrap_err();
    assert_eq!(err, TraceError::MissingMilestone { handshakes: 1 });
}
