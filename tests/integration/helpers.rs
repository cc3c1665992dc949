//! Helper functions for integration tests

use async_trait::async_trait;
use aznetmon::{
    ProbeOutcome, Target,
    config::MonitorConfig,
    probe::Prober,
    store::ResultStore,
    subscription::{DeliveryError, MessageSink},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted behaviour for one target
#[derive(Debug, Clone)]
pub enum Script {
    Up(Duration),
    Down(&'static str),
}

/// Prober answering from a fixed script instead of the network
pub struct ScriptedProber {
    scripts: HashMap<Target, Script>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(scripts: impl IntoIterator<Item = (Target, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(target) {
            Some(Script::Up(latency)) => ProbeOutcome::success(target.clone(), *latency),
            Some(Script::Down(reason)) => ProbeOutcome::failure(target.clone(), *reason),
            None => ProbeOutcome::failure(target.clone(), "unscripted target"),
        }
    }
}

/// Prober that succeeds instantly, but only while its gate is open
pub struct GatedProber {
    gate: tokio::sync::watch::Sender<bool>,
}

impl GatedProber {
    pub fn open() -> Self {
        Self {
            gate: tokio::sync::watch::channel(true).0,
        }
    }

    pub fn set_open(&self, open: bool) {
        self.gate.send_replace(open);
    }
}

#[async_trait]
impl Prober for GatedProber {
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        ProbeOutcome::success(target.clone(), Duration::from_millis(2))
    }
}

/// Config that only probes once on its own, at start
pub fn single_tick_config(targets: impl IntoIterator<Item = Target>) -> MonitorConfig {
    let mut config = MonitorConfig::new(targets).unwrap();
    config.probe_interval = Duration::from_secs(3600);
    config.summary_interval = Duration::from_secs(3600);
    config
}

/// Poll until `target` has at least `total` recorded attempts
pub async fn wait_for_total(store: &ResultStore, target: &Target, total: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if store
                .summary(target)
                .await
                .is_some_and(|summary| summary.total_tests >= total)
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{target} never reached {total} attempts"));
}

/// Sink that accepts `remaining` messages and then fails every write
pub struct FailingSink {
    pub remaining: usize,
}

#[async_trait]
impl MessageSink for FailingSink {
    async fn send(&mut self, _message: &str) -> Result<(), DeliveryError> {
        if self.remaining == 0 {
            return Err(DeliveryError::Write("connection reset".to_string()));
        }
        self.remaining -= 1;
        Ok(())
    }
}
