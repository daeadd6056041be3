//! Host and port expansion grammar: turns the `-a`/`-p` CLI strings into
//! a deduplicated target list.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use ipnet::Ipv4Net;

use crate::types::Target;

/// Parses `-a`: a single IPv4 literal, a comma-separated list of
/// literals, or a CIDR block (`/` present).
///
/// Unlike a conventional host enumeration, the network and broadcast
/// addresses are included: `A.B.C.D/30` yields all four addresses
/// `.0`-`.3`, not just the two usable host addresses. The operator is
/// scanning numeric targets, not allocating a subnet.
pub fn expand_hosts(spec: &str) -> Result<Vec<Ipv4Addr>> {
    let spec = spec.trim();
    if spec.contains('/') {
        let net: Ipv4Net = spec
            .parse()
            .with_context(|| format!("invalid CIDR block: {}", spec))?;
        let start = u32::from(net.network());
        let end = u32::from(net.broadcast());
        return Ok((start..=end).map(Ipv4Addr::from).collect());
    }

    spec.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| Ipv4Addr::from_str(s).with_context(|| format!("invalid IPv4 address: {}", s)))
        .collect()
}

/// Parses `-p`: `lo-hi`, a comma-separated list, or a single port. `0` or
/// anything above `65535` is configuration-fatal. `lo > hi` yields an
/// empty list rather than an error.
pub fn expand_ports(spec: &str) -> Result<Vec<u16>> {
    let spec = spec.trim();
    if let Some((lo, hi)) = spec.split_once('-') {
        let lo = parse_port(lo.trim())?;
        let hi = parse_port(hi.trim())?;
        // `lo..=hi` is already empty when lo > hi; no special case needed.
        return Ok((lo..=hi).collect());
    }

    spec.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_port)
        .collect()
}

fn parse_port(s: &str) -> Result<u16> {
    let value: u32 = s
        .parse()
        .with_context(|| format!("invalid port: {}", s))?;
    if value == 0 || value > 65535 {
        return Err(anyhow!("port out of range (1-65535): {}", value));
    }
    Ok(value as u16)
}

/// Cross product of hosts x ports, deduplicated.
pub fn build_targets(hosts: &[Ipv4Addr], ports: &[u16]) -> Vec<Target> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for &ip in hosts {
        for &port in ports {
            let target = Target::new(ip, port);
            if seen.insert(target) {
                targets.push(target);
            }
        }
    }
    targets
}
