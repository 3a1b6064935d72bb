//! Team Cymru bulk whois lookups
//!
//! Usage doc: <https://team-cymru.com/community-services/ip-asn-mapping/>

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::ip::sort_ipv4;
use crate::error::{ExecError, ParseError, ProbeError};

pub const CYMRU_WHOIS: (&str, u16) = ("whois.cymru.com", 43);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsnRecord {
    pub asn: String,
    pub ip: String,
    /// AS name without the trailing country code.
    pub company: String,
}

/// Bulk request with each address once, IPv4 in numeric order.
fn bulk_query<'a>(ips: impl IntoIterator<Item = &'a str>) -> String {
    let unique: BTreeSet<&str> = ips.into_iter().collect();
    let mut unique: Vec<&str> = unique.into_iter().collect();
    sort_ipv4(&mut unique);
    let mut query = String::from("begin\n");
    for ip in unique {
        query.push_str(ip);
        query.push('\n');
    }
    query.push_str("end\n");
    query
}

/// Parses `AS | IP | AS Name` rows keyed by IP.
pub fn parse_response(response: &str) -> Result<BTreeMap<String, AsnRecord>, ParseError> {
    let mut records = BTreeMap::new();
    for line in response.lines() {
        if line.trim().is_empty() || line.starts_with("Bulk") {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let [asn, ip, name, ..] = fields[..] else {
            return Err(ParseError::Whois {
                line: line.to_string(),
            });
        };
        // `CLOUDFLARENET, US` → `CLOUDFLARENET`
        let company = match name.rsplit_once(',') {
            Some((company, _country)) => company.trim_end(),
            None => name,
        };
        records.insert(
            ip.to_string(),
            AsnRecord {
                asn: asn.to_string(),
                ip: ip.to_string(),
                company: company.to_string(),
            },
        );
    }
    Ok(records)
}

/// Looks up the origin AS of every address in one connection.
pub async fn lookup<'a>(
    ips: impl IntoIterator<Item = &'a str>,
    timeout: Duration,
) -> Result<BTreeMap<String, AsnRecord>, ProbeError> {
    let query = bulk_query(ips);
    let exchange = async {
        let mut stream = TcpStream::connect(CYMRU_WHOIS).await?;
        stream.write_all(query.as_bytes()).await?;
        let mut response = String::new();
        stream.read_to_string(&mut response).await?;
        Ok::<_, std::io::Error>(response)
    };

    let response = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| ExecError::Timeout {
            program: CYMRU_WHOIS.0.to_string(),
            after: timeout,
        })?
        .map_err(ExecError::Io)?;

    log::debug!("whois returned {} bytes", response.len());
    Ok(parse_response(&response)?)
}
