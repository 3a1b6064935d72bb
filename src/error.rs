//! Structured error types for netdiag
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::time::Duration;

use thiserror::Error;

/// Why a `curlout:` summary line could not be split into phases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatIssue {
    #[error("missing `curlout:` prefix")]
    MissingPrefix,

    #[error("missing field(s) {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("expected 7 fields, found {0}")]
    ExtraFields(usize),

    #[error("field `{field}` is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },
}

/// Failures while turning a curl trace and summary into a `ProbeResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("malformed summary line {line:?}: {issue}")]
    Format { line: String, issue: FormatIssue },

    #[error("trace has {handshakes} TLS handshake milestone(s) but no `connect` milestone")]
    MissingMilestone { handshakes: usize },
}

/// Failures while parsing mtr, ping or whois output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("malformed mtr hop line {line:?}: {reason}")]
    Hop { line: String, reason: String },

    #[error("invalid mtr JSON report: {0}")]
    MtrJson(String),

    #[error("ping output has no {0} line")]
    PingSummary(&'static str),

    #[error("malformed ping line {line:?}")]
    PingLine { line: String },

    #[error("malformed whois line {line:?}")]
    Whois { line: String },
}

#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("cannot split {0:?} into arguments")]
    UnbalancedQuotes(String),

    #[error("command is empty")]
    EmptyCommand,

    #[error("invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for environment variable {name}")]
    Env { name: &'static str, value: String },
}

/// Errors surfaced by a single probe run (invocation + parsing).
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
