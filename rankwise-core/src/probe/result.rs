//! Leak test results and the overall status rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::WebRtcLeak;
use super::ipinfo::IpInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Secure,
    Warning,
    Exposed,
    Testing,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secure => write!(f, "secure"),
            Self::Warning => write!(f, "warning"),
            Self::Exposed => write!(f, "exposed"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// How ICE gathering ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatheringOutcome {
    Completed,
    /// The deadline fired first; results hold what was gathered until then.
    TimedOut,
    /// No WebRTC stack is available; nothing could leak through it.
    Unsupported,
    Failed,
}

/// DNS leak check. Needs a cooperating resolver endpoint, so it is reported
/// as not performed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsLeak {
    pub tested: bool,
    pub leaking: bool,
    pub resolvers: Vec<String>,
}

impl DnsLeak {
    pub fn not_tested() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakTestResult {
    pub ip_info: Option<IpInfo>,
    pub webrtc_leak: WebRtcLeak,
    pub dns_leak: DnsLeak,
    pub overall_status: OverallStatus,
    pub ice_gathering: GatheringOutcome,
    pub completed_at: DateTime<Utc>,
}

/// Combine the WebRTC and IP lookup findings.
///
/// Any public WebRTC address means `Exposed`. Otherwise a provider name that
/// matches a consumer ISP keyword means no VPN is in front of the caller
/// (`Warning`). Everything else is `Secure`.
pub fn overall_status(
    webrtc: &WebRtcLeak,
    ip_info: Option<&IpInfo>,
    consumer_isp_keywords: &[String],
) -> OverallStatus {
    if webrtc.found {
        return OverallStatus::Exposed;
    }
    let on_consumer_isp = ip_info.is_some_and(|info| {
        let provider = format!("{} {}", info.isp, info.org).to_lowercase();
        consumer_isp_keywords
            .iter()
            .any(|k| !k.is_empty() && provider.contains(&k.to_lowercase()))
    });
    if on_consumer_isp {
        OverallStatus::Warning
    } else {
        OverallStatus::Secure
    }
}
