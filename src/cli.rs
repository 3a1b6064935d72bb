//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "netdiag",
    version,
    about = "Per-phase HTTP latency and per-hop loss from curl, mtr and ping",
    after_help = "\
EXAMPLES:
    netdiag curl https://example.com/                 Phase timings and TLS handshake timeline
    netdiag curl https://example.com/ -H 'Pragma: akamai-x-cache-on'
    netdiag mtr 1.1.1.1 --asn                          Hop loss with origin AS per hop
    netdiag run --config config.yml --once             Probe every configured target once"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Seconds each external tool may run (overrides PROBE_TIMEOUT_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a URL with curl and break down where the time went
    Curl {
        url: String,

        /// Extra request header (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Extra curl options, appended verbatim
        #[arg(long, value_name = "OPTIONS", allow_hyphen_values = true)]
        extra: Option<String>,

        /// Include the raw request, response and info lines
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run mtr towards a host and find where loss starts
    Mtr {
        destination: String,

        #[arg(short, long, default_value_t = crate::mtr::DEFAULT_COUNT)]
        count: u32,

        #[arg(short = 's', long, default_value_t = crate::mtr::DEFAULT_PACKET_SIZE)]
        packet_size: u32,

        /// Look up the origin AS of every hop
        #[arg(long)]
        asn: bool,

        /// Run this mtr command line instead of the built-in one
        #[arg(long = "command", value_name = "COMMAND", allow_hyphen_values = true)]
        mtr_command: Option<String>,
    },

    /// Ping a host and summarise loss and round-trip times
    Ping {
        destination: String,

        #[arg(short, long, default_value_t = crate::mtr::DEFAULT_COUNT)]
        count: u32,
    },

    /// Probe every target in a config file
    Run {
        /// Config file (defaults to CONFIG_FILE, then config.yml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Probe each target once instead of polling
        #[arg(long)]
        once: bool,
    },
}
