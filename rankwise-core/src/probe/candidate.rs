//! ICE candidate parsing and address classification.

use std::cmp::Reverse;
use std::net::IpAddr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefixes (and the `local` marker) that identify a non-routable address.
const LOCAL_PREFIXES: &[&str] = &["10.", "192.168.", "172.", "169.254.", "127.", "fe80:", "::1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressScope {
    Local,
    Public,
}

/// Classify an address token taken from an ICE candidate.
pub fn classify_address(address: &str) -> AddressScope {
    let lower = address.to_ascii_lowercase();
    if lower.contains("local") || LOCAL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        AddressScope::Local
    } else {
        AddressScope::Public
    }
}

/// Addresses exposed through WebRTC, split by scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRtcLeak {
    /// `true` when at least one public address was exposed.
    pub found: bool,
    pub local_ips: Vec<String>,
    pub public_ips: Vec<String>,
}

/// Extracts address tokens from raw candidate strings.
pub struct CandidateParser {
    ipv4: Regex,
    ipv6: Regex,
    mdns: Regex,
}

impl CandidateParser {
    pub fn new() -> Self {
        Self {
            ipv4: Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap(),
            ipv6: Regex::new(
                r"(?:[0-9A-Fa-f]{0,4}:){2,7}(?:\d{1,3}(?:\.\d{1,3}){3}|[0-9A-Fa-f]{0,4})",
            )
            .unwrap(),
            mdns: Regex::new(r"\b[0-9A-Za-z][0-9A-Za-z-]*\.local\b").unwrap(),
        }
    }

    /// Address tokens in `candidate`, in order of appearance.
    ///
    /// IP tokens must parse as a real address; malformed tokens and the
    /// unspecified address (`0.0.0.0`, `::`) are skipped. An IPv4 address
    /// embedded in a longer IPv6 token is not reported separately, and
    /// IPv4-mapped IPv6 addresses are reported in their IPv4 form.
    pub fn extract_addresses(&self, candidate: &str) -> Vec<String> {
        let mut matches: Vec<_> = self
            .ipv6
            .find_iter(candidate)
            .chain(self.ipv4.find_iter(candidate))
            .collect();
        // Longest token first when two start at the same offset.
        matches.sort_by_key(|m| (m.start(), Reverse(m.end())));

        let mut found = Vec::new();
        let mut covered = 0;
        for m in matches {
            if m.start() < covered {
                continue;
            }
            let token = m.as_str();
            match token.parse::<IpAddr>().map(unmap_ipv4) {
                Ok(ip) => {
                    covered = m.end();
                    if !ip.is_unspecified() {
                        found.push(ip.to_string());
                    }
                }
                Err(_) => debug!(token, "Skipping malformed address in ICE candidate"),
            }
        }

        for m in self.mdns.find_iter(candidate) {
            found.push(m.as_str().to_ascii_lowercase());
        }

        found
    }

    /// Classify every address across `candidates`, de-duplicated in
    /// first-seen order.
    pub fn analyze<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> WebRtcLeak {
        let mut leak = WebRtcLeak::default();
        for candidate in candidates {
            for address in self.extract_addresses(candidate) {
                let bucket = match classify_address(&address) {
                    AddressScope::Local => &mut leak.local_ips,
                    AddressScope::Public => &mut leak.public_ips,
                };
                if !bucket.contains(&address) {
                    bucket.push(address);
                }
            }
        }
        leak.found = !leak.public_ips.is_empty();
        leak
    }
}

fn unmap_ipv4(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

impl Default for CandidateParser {
    fn default() -> Self {
        Self::new()
    }
}
