//! Helpers shared by the probes: ASN lookup, distances, address checks.

pub mod asn;
pub mod geo;
pub mod ip;

use url::Url;

use crate::error::InvocationError;

/// Host part of a probe target, which may be a URL or a bare host.
///
/// mtr and ping need a host while configured targets are usually URLs.
pub fn target_host(target: &str) -> Result<String, InvocationError> {
    if !target.contains("://") {
        return Ok(target.trim_end_matches('/').to_string());
    }
    let url = Url::parse(target).map_err(|source| InvocationError::InvalidUrl {
        url: target.to_string(),
        source,
    })?;
    url.host_str()
        .map(|h| h.trim_matches(['[', ']']).to_string())
        .ok_or_else(|| InvocationError::InvalidUrl {
            url: target.to_string(),
            source: url::ParseError::EmptyHost,
        })
}
