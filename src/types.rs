use std::fmt;
use std::net::Ipv4Addr;

/// A single `ipv4:port` to probe. Immutable once constructed; the target
/// list is deduplicated before it ever reaches the scanning core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Target {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Target { ip, port }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// A canonical `host:port` string identifying a SOCKS5 endpoint (or, when
/// reused for `ReferenceEndpoints`, a plain TCP endpoint on operator
/// infrastructure). Equality is string equality, per spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyAddress(String);

impl ProxyAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        ProxyAddress(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProxyAddress {
    fn from(s: String) -> Self {
        ProxyAddress(s)
    }
}

impl From<&str> for ProxyAddress {
    fn from(s: &str) -> Self {
        ProxyAddress(s.to_string())
    }
}

/// The two reference endpoints used as ground truth for proxy validation.
#[derive(Debug, Clone)]
pub struct ReferenceEndpoints {
    pub known_open: ProxyAddress,
    pub known_closed: ProxyAddress,
}

/// Outcome of probing a single target. Emitted exactly once per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanResult {
    Open(Target),
    Closed(Target),
}

impl ScanResult {
    pub fn target(&self) -> Target {
        match self {
            ScanResult::Open(t) | ScanResult::Closed(t) => *t,
        }
    }
}

/// Outcome of validating a single proxy. Emitted exactly once per
/// validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProxyVerdict {
    Good(ProxyAddress),
    Bad(ProxyAddress),
}

/// Tally produced once a run has drained every target, plus the
/// found-services list the Coordinator is required to return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub opened: Vec<Target>,
    pub closed: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: ScanResult) {
        match result {
            ScanResult::Open(target) => self.opened.push(target),
            ScanResult::Closed(_) => self.closed += 1,
        }
    }

    pub fn open(&self) -> usize {
        self.opened.len()
    }

    pub fn total(&self) -> usize {
        self.opened.len() + self.closed
    }
}
