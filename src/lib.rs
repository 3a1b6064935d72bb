//! netdiag library crate: parsers for curl, mtr and ping output and the
//! probes that drive them.

pub mod cli;
pub mod config;
pub mod curl;
pub mod error;
pub mod exec;
pub mod mtr;
pub mod ping;
pub mod report;
pub mod runner;
pub mod util;
