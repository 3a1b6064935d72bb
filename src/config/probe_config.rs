use serde::Deserialize;

/// A group of probe targets sharing one polling interval.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// How often the group is probed when running continuously.
    /// Defaults to 60 seconds if not specified.
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,

    /// The targets probed on every round.
    pub targets: Vec<TargetConfig>,
}

/// Which external tool a target is probed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    #[default]
    Curl,
    Mtr,
    Ping,
}

/// A single probe target.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// URL (curl) or host (mtr, ping). URLs are reduced to their host for
    /// mtr and ping.
    pub url: String,

    #[serde(default)]
    pub kind: ProbeKind,

    /// Extra request headers, each passed to curl as `-H <header>`.
    #[serde(default)]
    pub headers: Vec<String>,

    /// Extra curl options appended verbatim.
    #[serde(default)]
    pub extra_options: Option<String>,

    /// The accepted HTTP status codes for curl targets.
    /// Defaults to 200 if not specified.
    #[serde(default = "default_status_codes")]
    pub accepted_status_codes: Vec<u16>,

    /// Packets sent by mtr and ping.
    #[serde(default = "default_count")]
    pub count: u32,

    /// mtr packet size in bytes.
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,

    /// Full mtr command line run instead of the built-in one.
    #[serde(default)]
    pub mtr_command: Option<String>,
}

fn default_status_codes() -> Vec<u16> {
    vec![200]
}

fn default_polling_interval() -> u64 {
    60
}

fn default_count() -> u32 {
    crate::mtr::DEFAULT_COUNT
}

fn default_packet_size() -> u32 {
    crate::mtr::DEFAULT_PACKET_SIZE
}

/// Group name to group, in file order.
pub type Config = indexmap::IndexMap<String, GroupConfig>;
