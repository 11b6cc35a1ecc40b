//! Leak test orchestration.
//!
//! A run fans out ICE gathering and the IP lookup concurrently, each under
//! its own deadline, then folds both into a [`ProbeState`]. Runs are
//! numbered; a run only publishes its outcome while it is still the latest,
//! so re-running the test discards whatever an older in-flight run finds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::candidate::{CandidateParser, WebRtcLeak};
use super::ice::{IceEvent, IceGatherer, StunGatherer};
use super::ipinfo::{HttpIpInfoProvider, IpInfoProvider};
use super::result::{DnsLeak, GatheringOutcome, LeakTestResult, overall_status};
use crate::config::ProbeConfig;
use crate::error::ProbeError;

/// Lifecycle of the leak test: `Idle -> Testing -> Complete | Error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeState {
    Idle,
    Testing {
        run: u64,
    },
    Complete {
        run: u64,
        result: Box<LeakTestResult>,
    },
    /// The IP lookup failed. WebRTC findings gathered during the run are
    /// kept in `partial`.
    Error {
        run: u64,
        message: String,
        partial: WebRtcLeak,
    },
}

impl ProbeState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Testing { .. } => "testing",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

/// What happened to a finished run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run was still the latest and its state was published.
    Applied(ProbeState),
    /// A newer run started while this one was in flight; its result was
    /// discarded.
    Superseded { run: u64, latest: u64 },
}

struct IceCollection {
    leak: WebRtcLeak,
    outcome: GatheringOutcome,
}

pub struct LeakProbe {
    gatherer: Arc<dyn IceGatherer>,
    ip_info: Arc<dyn IpInfoProvider>,
    parser: CandidateParser,
    config: ProbeConfig,
    generation: AtomicU64,
    state: watch::Sender<ProbeState>,
}

impl LeakProbe {
    pub fn new(
        gatherer: Arc<dyn IceGatherer>,
        ip_info: Arc<dyn IpInfoProvider>,
        config: ProbeConfig,
    ) -> Self {
        let (state, _) = watch::channel(ProbeState::Idle);
        Self {
            gatherer,
            ip_info,
            parser: CandidateParser::new(),
            config,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Build a probe with the native STUN gatherer and the HTTP IP lookup.
    pub fn from_config(config: ProbeConfig) -> Result<Self, ProbeError> {
        let fetch_timeout = Duration::from_millis(config.fetch_timeout_ms);
        let ip_info = HttpIpInfoProvider::new(&config.ip_info_url, fetch_timeout)?;
        let gatherer = StunGatherer::new(Duration::from_millis(config.ice_timeout_ms));
        Ok(Self::new(Arc::new(gatherer), Arc::new(ip_info), config))
    }

    /// Watch state transitions (e.g. to drive a progress indicator).
    pub fn subscribe(&self) -> watch::Receiver<ProbeState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ProbeState {
        self.state.borrow().clone()
    }

    /// Number of the most recently started run (0 before the first run).
    pub fn latest_run(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Run the leak test. Calling this while a run is in flight supersedes it.
    pub async fn run(&self) -> RunOutcome {
        let mut run = 0;
        self.state.send_modify(|state| {
            run = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = ProbeState::Testing { run };
        });
        info!(run, "Leak test started");

        let fetch_timeout_ms = self.config.fetch_timeout_ms;
        let (ice, lookup) = tokio::join!(
            self.collect_candidates(),
            tokio::time::timeout(
                Duration::from_millis(fetch_timeout_ms),
                self.ip_info.lookup()
            )
        );
        let lookup = lookup.unwrap_or_else(|_| {
            Err(ProbeError::Timeout {
                what: "IP lookup".into(),
                timeout_ms: fetch_timeout_ms,
            })
        });

        let next = match lookup {
            Ok(info) => {
                let status = overall_status(
                    &ice.leak,
                    Some(&info),
                    &self.config.consumer_isp_keywords,
                );
                ProbeState::Complete {
                    run,
                    result: Box::new(LeakTestResult {
                        ip_info: Some(info),
                        webrtc_leak: ice.leak,
                        dns_leak: DnsLeak::not_tested(),
                        overall_status: status,
                        ice_gathering: ice.outcome,
                        completed_at: Utc::now(),
                    }),
                }
            }
            Err(e) => {
                warn!(run, error = %e, "Leak test incomplete: IP lookup failed");
                ProbeState::Error {
                    run,
                    message: e.to_string(),
                    partial: ice.leak,
                }
            }
        };

        let mut applied = false;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) == run {
                *state = next.clone();
                applied = true;
            }
            applied
        });

        if applied {
            info!(run, state = next.label(), "Leak test finished");
            RunOutcome::Applied(next)
        } else {
            let latest = self.latest_run();
            debug!(run, latest, "Discarding superseded leak test result");
            RunOutcome::Superseded { run, latest }
        }
    }

    async fn collect_candidates(&self) -> IceCollection {
        let timeout_ms = self.config.ice_timeout_ms;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let empty = |outcome| IceCollection {
            leak: WebRtcLeak::default(),
            outcome,
        };

        let mut rx = match tokio::time::timeout_at(
            deadline,
            self.gatherer.gather(&self.config.stun_server),
        )
        .await
        {
            Ok(Ok(rx)) => rx,
            Ok(Err(ProbeError::WebRtcUnsupported)) => {
                debug!("WebRTC unavailable, skipping ICE gathering");
                return empty(GatheringOutcome::Unsupported);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "ICE gathering failed");
                return empty(GatheringOutcome::Failed);
            }
            Err(_) => {
                warn!(timeout_ms, "ICE gathering did not start before the deadline");
                return empty(GatheringOutcome::TimedOut);
            }
        };

        let mut candidates = Vec::new();
        let outcome = loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(IceEvent::Candidate(c))) => candidates.push(c),
                Ok(Some(IceEvent::Complete)) | Ok(None) => break GatheringOutcome::Completed,
                Err(_) => {
                    debug!(
                        timeout_ms,
                        gathered = candidates.len(),
                        "ICE gathering deadline reached"
                    );
                    break GatheringOutcome::TimedOut;
                }
            }
        };

        IceCollection {
            leak: self.parser.analyze(candidates.iter().map(String::as_str)),
            outcome,
        }
    }
}
