pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod monitor;
pub mod probe;
pub mod store;
pub mod subscription;
pub mod util;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Icmp,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Icmp => write!(f, "ICMP"),
            Protocol::Tcp => write!(f, "TCP"),
        }
    }
}

/// A probed endpoint, identified by (host, protocol, port).
///
/// The port is present exactly for TCP targets, which is why the fields are
/// private and construction goes through [`Target::icmp`] / [`Target::tcp`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "target")]
    host: String,
    protocol: Protocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

impl Target {
    pub fn icmp(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: Protocol::Icmp,
            port: None,
        }
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            protocol: Protocol::Tcp,
            port: Some(port),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Key used by the results mapping: `host` for ICMP, `host-tcp-port` for TCP.
    pub fn key(&self) -> String {
        match self.port {
            Some(port) => format!("{}-tcp-{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) if self.host.contains(':') => write!(f, "[{}]:{}", self.host, port),
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// Result of a single probe attempt
///
/// Serializes to `{target, protocol, port?, success, duration_ms, error?, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    #[serde(flatten)]
    pub target: Target,
    pub success: bool,
    /// Fractional milliseconds, 0 for failed attempts
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    pub fn success(target: Target, elapsed: Duration) -> Self {
        Self {
            target,
            success: true,
            duration_ms: elapsed.as_nanos() as f64 / 1e6,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(target: Target, error: impl ToString) -> Self {
        Self {
            target,
            success: false,
            duration_ms: 0.0,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }
}
