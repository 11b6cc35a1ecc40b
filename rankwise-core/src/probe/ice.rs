//! ICE candidate gathering.
//!
//! A gatherer streams raw candidate strings over a channel and finishes with
//! [`IceEvent::Complete`] (or by dropping the sender). The probe runner owns
//! the deadline, so a gatherer that never completes cannot stall a run.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::stun;
use crate::error::ProbeError;

/// Channel capacity for candidate events.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IceEvent {
    /// A raw `candidate:` line as produced during ICE gathering.
    Candidate(String),
    /// Gathering finished (the WebRTC "null candidate").
    Complete,
}

/// Source of ICE candidates.
#[async_trait]
pub trait IceGatherer: Send + Sync {
    /// Start gathering against `stun_server` (`host:port`).
    ///
    /// Returns [`ProbeError::WebRtcUnsupported`] when no WebRTC/ICE stack is
    /// available.
    async fn gather(&self, stun_server: &str) -> Result<mpsc::Receiver<IceEvent>, ProbeError>;
}

/// A gatherer for environments without a WebRTC stack.
pub struct UnsupportedGatherer;

#[async_trait]
impl IceGatherer for UnsupportedGatherer {
    async fn gather(&self, _stun_server: &str) -> Result<mpsc::Receiver<IceEvent>, ProbeError> {
        Err(ProbeError::WebRtcUnsupported)
    }
}

/// Native gatherer over UDP.
///
/// Emits a host candidate for the interface used to reach the STUN server
/// and a server-reflexive candidate from a STUN Binding request, which is
/// the same exposure a browser's ICE agent produces.
pub struct StunGatherer {
    response_timeout: Duration,
}

impl StunGatherer {
    pub fn new(response_timeout: Duration) -> Self {
        Self { response_timeout }
    }
}

impl Default for StunGatherer {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

pub fn host_candidate(local: SocketAddr) -> String {
    format!(
        "candidate:1 1 udp 2122260223 {} {} typ host generation 0",
        local.ip(),
        local.port()
    )
}

pub fn srflx_candidate(mapped: SocketAddr, local: SocketAddr) -> String {
    format!(
        "candidate:2 1 udp 1686052607 {} {} typ srflx raddr {} rport {} generation 0",
        mapped.ip(),
        mapped.port(),
        local.ip(),
        local.port()
    )
}

#[async_trait]
impl IceGatherer for StunGatherer {
    async fn gather(&self, stun_server: &str) -> Result<mpsc::Receiver<IceEvent>, ProbeError> {
        let server = tokio::net::lookup_host(stun_server)
            .await
            .map_err(|e| ProbeError::Gathering {
                message: format!("Failed to resolve STUN server {stun_server}: {e}"),
            })?
            .next()
            .ok_or_else(|| ProbeError::Gathering {
                message: format!("STUN server {stun_server} resolved to no addresses"),
            })?;

        let bind_addr = if server.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| ProbeError::Gathering {
                message: format!("Failed to bind UDP socket: {e}"),
            })?;
        socket
            .connect(server)
            .await
            .map_err(|e| ProbeError::Gathering {
                message: format!("Failed to connect UDP socket to {server}: {e}"),
            })?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let response_timeout = self.response_timeout;
        tokio::spawn(async move {
            run_stun_exchange(socket, server, response_timeout, &tx).await;
            let _ = tx.send(IceEvent::Complete).await;
        });
        Ok(rx)
    }
}

async fn run_stun_exchange(
    socket: UdpSocket,
    server: SocketAddr,
    response_timeout: Duration,
    tx: &mpsc::Sender<IceEvent>,
) {
    let local = match socket.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(error = %e, "Could not read local socket address");
            return;
        }
    };
    if !local.ip().is_unspecified() {
        let _ = tx.send(IceEvent::Candidate(host_candidate(local))).await;
    }

    let transaction_id: stun::TransactionId = rand::random();
    if let Err(e) = socket.send(&stun::binding_request(&transaction_id)).await {
        warn!(error = %e, %server, "Failed to send STUN binding request");
        return;
    }

    let mut buf = [0u8; 1024];
    let deadline = tokio::time::Instant::now() + response_timeout;
    loop {
        match tokio::time::timeout_at(deadline, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => match stun::parse_binding_response(&buf[..len], &transaction_id) {
                Ok(mapped) => {
                    debug!(%mapped, "STUN binding succeeded");
                    let _ = tx
                        .send(IceEvent::Candidate(srflx_candidate(mapped, local)))
                        .await;
                    return;
                }
                // Stray datagrams on the port are ignored until the deadline.
                Err(e) => debug!(error = %e, "Ignoring unexpected STUN datagram"),
            },
            Ok(Err(e)) => {
                warn!(error = %e, %server, "STUN receive failed");
                return;
            }
            Err(_) => {
                debug!(%server, "No STUN response before deadline");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_formats() {
        let local: SocketAddr = "192.168.1.5:54321".parse().unwrap();
        let mapped: SocketAddr = "203.0.113.7:61000".parse().unwrap();
        assert_eq!(
            host_candidate(local),
            "candidate:1 1 udp 2122260223 192.168.1.5 54321 typ host generation 0"
        );
        assert_eq!(
            srflx_candidate(mapped, local),
            "candidate:2 1 udp 1686052607 203.0.113.7 61000 typ srflx raddr 192.168.1.5 rport 54321 generation 0"
        );
    }

    #[tokio::test]
    async fn test_unsupported_gatherer() {
        let err = UnsupportedGatherer.gather("stun.example:3478").await.unwrap_err();
        assert!(matches!(err, ProbeError::WebRtcUnsupported));
    }

    #[tokio::test]
    async fn test_stun_gatherer_against_local_server() {
        // A loopback STUN responder that answers every request with an
        // XOR-MAPPED-ADDRESS of 203.0.113.7:40000.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, stun::HEADER_LEN);
            let cookie = stun::MAGIC_COOKIE.to_be_bytes();
            let port = 40000u16 ^ (stun::MAGIC_COOKIE >> 16) as u16;
            let mut resp = vec![0x01, 0x01, 0x00, 0x0c];
            resp.extend_from_slice(&cookie);
            resp.extend_from_slice(&buf[8..20]);
            resp.extend_from_slice(&[0x00, 0x20, 0x00, 0x08, 0x00, 0x01]);
            resp.extend_from_slice(&port.to_be_bytes());
            resp.extend([203u8, 0, 113, 7].iter().zip(cookie.iter()).map(|(a, b)| a ^ b));
            server.send_to(&resp, peer).await.unwrap();
        });

        let gatherer = StunGatherer::new(Duration::from_secs(2));
        let mut rx = gatherer.gather(&server_addr.to_string()).await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = event == IceEvent::Complete;
            events.push(event);
            if done {
                break;
            }
        }

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], IceEvent::Candidate(c) if c.contains("127.0.0.1") && c.contains("typ host")));
        assert!(matches!(&events[1], IceEvent::Candidate(c) if c.contains("203.0.113.7 40000 typ srflx")));
        assert_eq!(events[2], IceEvent::Complete);
    }
}
