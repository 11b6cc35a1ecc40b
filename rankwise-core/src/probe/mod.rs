//! WebRTC leak probe.
//!
//! Detects whether the caller's real address is exposed through ICE
//! candidate gathering, alongside an external IP lookup that reveals whether
//! traffic leaves through a consumer ISP.

pub mod candidate;
pub mod ice;
pub mod ipinfo;
pub mod result;
pub mod runner;
pub mod stun;

pub use candidate::{AddressScope, CandidateParser, WebRtcLeak, classify_address};
pub use ice::{IceEvent, IceGatherer, StunGatherer, UnsupportedGatherer};
pub use ipinfo::{HttpIpInfoProvider, IpInfo, IpInfoProvider};
pub use result::{DnsLeak, GatheringOutcome, LeakTestResult, OverallStatus, overall_status};
pub use runner::{LeakProbe, ProbeState, RunOutcome};
