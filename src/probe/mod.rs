//! Reachability probes
//!
//! A probe runs one ICMP echo or TCP connect attempt against a [`Target`] and
//! always yields a [`ProbeOutcome`]. Every failure mode (resolution, socket
//! creation, send, receive, timeout) is folded into a failed outcome carrying a
//! readable error string, so callers never have to handle errors themselves.

mod icmp;
mod tcp;

pub use icmp::ping;
pub use tcp::connect;

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::{ProbeOutcome, Protocol, Target};

/// Default per-attempt timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },
    #[error("Failed to create ICMP socket: {0}")]
    Socket(io::Error),
    #[error("Failed to send ICMP packet: {0}")]
    Send(io::Error),
    #[error("Failed to receive ICMP reply: {0}")]
    Receive(io::Error),
    #[error("Failed to receive ICMP reply: timed out after {0:?}")]
    ReplyTimeout(Duration),
    #[error("Failed TCP connection to {address}: {source}")]
    Connect { address: String, source: io::Error },
    #[error("Failed TCP connection to {address}: timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },
    #[error("probe task failed: {0}")]
    Task(String),
}

/// Something that can check one target
///
/// Implementations must not fail: errors are reported through
/// [`ProbeOutcome::failure`].
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, target: &Target) -> ProbeOutcome;
}

/// Prober talking to the real network
#[derive(Debug, Clone)]
pub struct NetworkProber {
    timeout: Duration,
}

impl NetworkProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, target: &Target) -> Result<(), ProbeError> {
        match (target.protocol(), target.port()) {
            (Protocol::Icmp, _) => ping(target.host(), self.timeout).await,
            (Protocol::Tcp, Some(port)) => connect(target.host(), port, self.timeout).await,
            (Protocol::Tcp, None) => Err(ProbeError::Connect {
                address: target.host().to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "missing port"),
            }),
        }
    }
}

impl Default for NetworkProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl Prober for NetworkProber {
    #[instrument(skip(self), fields(target = %target, protocol = %target.protocol()))]
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();

        // Resolution is not covered by the socket timeouts, so bound the whole attempt.
        let result = match tokio::time::timeout(self.timeout, self.attempt(target)).await {
            Ok(result) => result,
            Err(_) => Err(match target.protocol() {
                Protocol::Icmp => ProbeError::ReplyTimeout(self.timeout),
                Protocol::Tcp => ProbeError::ConnectTimeout {
                    address: target.to_string(),
                    timeout: self.timeout,
                },
            }),
        };

        match result {
            Ok(()) => {
                let elapsed = start.elapsed();
                trace!("probe succeeded in {elapsed:?}");
                ProbeOutcome::success(target.clone(), elapsed)
            }
            Err(e) => {
                debug!("probe failed: {e}");
                ProbeOutcome::failure(target.clone(), e)
            }
        }
    }
}

/// Resolve a host to its first IPv4 address.
pub(crate) async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, ProbeError> {
    let resolve_error = |reason: String| ProbeError::Resolve {
        host: host.to_string(),
        reason,
    };

    if host.is_empty() {
        return Err(resolve_error("empty host name".to_string()));
    }

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => return Ok(ip),
        Ok(IpAddr::V6(_)) => return Err(resolve_error("not an IPv4 address".to_string())),
        Err(_) => {}
    }

    tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| resolve_error(e.to_string()))?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| resolve_error("no IPv4 address found".to_string()))
}
