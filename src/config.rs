use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tracing::{trace, warn};

use crate::Target;
use crate::probe::DEFAULT_PROBE_TIMEOUT;
use crate::subscription::DEFAULT_DELIVERY_TIMEOUT;

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(2);

pub const DEFAULT_SUMMARY_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Longest accepted interval, timeout or run duration (100 years)
pub const MAX_DURATION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no targets specified, use --targets for ICMP or --tcp-targets for TCP")]
    NoTargets,
    #[error("invalid duration '{0}', expected e.g. 500ms, 30s, 5m, 1h")]
    InvalidDuration(String),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("{0} exceeds the maximum of 100 years")]
    TooLong(&'static str),
}

/// Everything the monitoring core needs, resolved and validated
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Probed targets, unique and in configuration order
    pub targets: Vec<Target>,
    pub probe_interval: Duration,
    pub summary_interval: Duration,
    pub probe_timeout: Duration,
    /// Total run time; `None` runs until the process stops
    pub run_duration: Option<Duration>,
    /// Capacity of the internal event channel
    pub event_capacity: usize,
    pub delivery_timeout: Duration,
}

impl MonitorConfig {
    /// Build a config with default timings for the given targets
    ///
    /// Duplicate targets are collapsed, keeping the first occurrence. A
    /// target whose key or display name clashes with an earlier, different
    /// target is skipped with a warning.
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut keys = HashSet::new();
        let mut names = HashSet::new();
        let targets: Vec<Target> = targets
            .into_iter()
            .filter(|target| seen.insert(target.clone()))
            .filter(|target| {
                let (key, name) = (target.key(), target.to_string());
                if keys.contains(&key) || names.contains(&name) {
                    warn!(
                        "target {name} ({}) clashes with an earlier target, skipping",
                        target.protocol()
                    );
                    return false;
                }
                keys.insert(key);
                names.insert(name);
                true
            })
            .collect();

        let config = Self {
            targets,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            run_duration: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        };
        config.validate()?;

        trace!("resolved {} targets", config.targets.len());
        Ok(config)
    }

    /// Build a config from the comma-separated ICMP and TCP target lists
    pub fn from_lists(icmp: Option<&str>, tcp: Option<&str>) -> Result<Self, ConfigError> {
        let icmp = icmp.map(parse_icmp_targets).unwrap_or_default();
        let tcp = tcp.map(parse_tcp_targets).unwrap_or_default();

        Self::new(icmp.into_iter().chain(tcp))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.probe_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("probe interval"));
        }
        if self.summary_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("summary interval"));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::ZeroInterval("probe timeout"));
        }
        if self.run_duration.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroInterval("run duration"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroInterval("event capacity"));
        }

        let bounded = [
            ("probe interval", Some(self.probe_interval)),
            ("summary interval", Some(self.summary_interval)),
            ("probe timeout", Some(self.probe_timeout)),
            ("delivery timeout", Some(self.delivery_timeout)),
            ("run duration", self.run_duration),
        ];
        for (name, duration) in bounded {
            if duration.is_some_and(|d| d > MAX_DURATION) {
                return Err(ConfigError::TooLong(name));
            }
        }
        Ok(())
    }
}

/// Parse `8.8.8.8, 1.1.1.1,google.com` into ICMP targets
///
/// Entries carrying a port are skipped with a warning.
pub fn parse_icmp_targets(list: &str) -> Vec<Target> {
    list.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .filter(|host| {
            if host.contains(':') {
                warn!("invalid ICMP target '{host}', skipping. ICMP targets take no port");
                return false;
            }
            true
        })
        .map(Target::icmp)
        .collect()
}

/// Parse `google.com:80,[::1]:22` into TCP targets
///
/// Malformed entries and ports outside 1-65535 are skipped with a warning.
pub fn parse_tcp_targets(list: &str) -> Vec<Target> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let Some((host, port)) = split_host_port(entry) else {
                warn!("invalid TCP target format '{entry}', skipping. Format should be host:port");
                return None;
            };

            match port.parse::<u16>() {
                Ok(port) if port > 0 => Some(Target::tcp(host, port)),
                _ => {
                    warn!(
                        "invalid port number '{port}' for target '{host}', skipping. Port should be 1-65535"
                    );
                    None
                }
            }
        })
        .collect()
}

fn split_host_port(entry: &str) -> Option<(&str, &str)> {
    if let Some(rest) = entry.strip_prefix('[') {
        let (host, port) = rest.split_once("]:")?;
        return (!host.is_empty()).then_some((host, port));
    }

    let (host, port) = entry.rsplit_once(':')?;
    if host.is_empty() || host.contains(':') {
        return None;
    }
    Some((host, port))
}

/// Parse durations like `500ms`, `30s`, `5m`, `2h` or plain seconds
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?P<amount>\d+)\s*(?P<unit>ms|s|m|h)?\s*$").expect("valid duration regex")
    });

    let invalid = || ConfigError::InvalidDuration(value.to_string());

    let captures = pattern.captures(value).ok_or_else(invalid)?;
    let amount: u64 = captures["amount"].parse().map_err(|_| invalid())?;

    let duration = match captures.name("unit").map(|unit| unit.as_str()) {
        Some("ms") => Duration::from_millis(amount),
        Some("m") => Duration::from_secs(amount.checked_mul(60).ok_or_else(invalid)?),
        Some("h") => Duration::from_secs(amount.checked_mul(3600).ok_or_else(invalid)?),
        _ => Duration::from_secs(amount),
    };

    Ok(duration)
}
