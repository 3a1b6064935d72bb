use std::net::{IpAddr, Ipv4Addr};

pub fn is_ip(address: &str) -> bool {
    address.parse::<IpAddr>().is_ok()
}

const PRIVATE_V4: [(Ipv4Addr, u8); 5] = [
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(127, 0, 0, 1), 32),
    // Carrier-grade NAT
    (Ipv4Addr::new(100, 64, 0, 0), 10),
];

fn in_network(ip: Ipv4Addr, network: Ipv4Addr, prefix: u8) -> bool {
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
    u32::from(ip) & mask == u32::from(network) & mask
}

/// Whether `address` is an IPv4 address in a private, loopback or CGNAT range.
pub fn is_private_ip(address: &str) -> bool {
    match address.parse::<Ipv4Addr>() {
        Ok(ip) => PRIVATE_V4
            .iter()
            .any(|(network, prefix)| in_network(ip, *network, *prefix)),
        Err(_) => false,
    }
}

/// Sorts IPv4 addresses numerically; anything unparsable goes last in input order.
pub fn sort_ipv4<S: AsRef<str>>(ips: &mut [S]) {
    ips.sort_by_key(|ip| match ip.as_ref().parse::<Ipv4Addr>() {
        Ok(addr) => (0, u32::from(addr)),
        Err(_) => (1, 0),
    });
}
