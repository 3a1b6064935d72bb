//! curl connection-trace parsing
//!
//! A probe runs `curl -v --trace-time` and yields two blobs: the `-w`
//! summary on stdout and the debug trace on stderr. [`classify`] walks the
//! trace once and feeds [`headers`] and [`milestone`]; [`timing`] splits the
//! summary into phases; [`timeline`] turns the handshake milestones into
//! per-stage durations. [`result::ProbeResult`] holds all of it.

pub mod classify;
pub mod headers;
pub mod invocation;
pub mod milestone;
pub mod probe;
pub mod result;
pub mod timeline;
pub mod timing;

pub mod prelude {
    pub use super::headers::{HeaderMap, RequestHeaders, RequestLine, ResponseHeaders, StatusLine};
    pub use super::invocation::CurlInvocation;
    pub use super::milestone::{ConnectionInfo, Milestone, MilestoneKind, TlsInfo};
    pub use super::probe::probe_url;
    pub use super::result::{ProbeResult, Transcript};
    pub use super::timeline::{ConnectionTimeline, TimelineEntry};
    pub use super::timing::PhaseTiming;
}
