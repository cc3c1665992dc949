//! Scheduler run-duration tests

use crate::helpers::{Script, ScriptedProber};
use aznetmon::{
    Target, actors::messages::SchedulerState, config::MonitorConfig, monitor::Monitor,
};
use std::sync::Arc;
use std::time::Duration;

fn deadline_config(run_duration: Option<Duration>) -> (MonitorConfig, Arc<ScriptedProber>) {
    let target = Target::icmp("127.0.0.1");
    let prober = Arc::new(ScriptedProber::new([(
        target.clone(),
        Script::Up(Duration::from_millis(1)),
    )]));

    let mut config = MonitorConfig::new([target]).unwrap();
    config.probe_interval = Duration::from_millis(20);
    config.summary_interval = Duration::from_millis(50);
    config.run_duration = run_duration;

    (config, prober)
}

#[tokio::test]
async fn test_scheduler_stops_after_run_duration() {
    let (config, prober) = deadline_config(Some(Duration::from_millis(150)));
    let monitor = Monitor::spawn_with_prober(config, prober.clone());

    tokio::time::timeout(Duration::from_secs(2), monitor.scheduler().stopped())
        .await
        .expect("scheduler did not stop");
    assert_eq!(monitor.scheduler().state(), SchedulerState::Stopped);

    // Let in-flight probes settle, then verify nothing new is launched
    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls = prober.calls();
    assert!(calls >= 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(prober.calls(), calls);
}

#[tokio::test]
async fn test_scheduler_without_duration_keeps_running() {
    let (config, prober) = deadline_config(None);
    let monitor = Monitor::spawn_with_prober(config, prober.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(monitor.scheduler().state(), SchedulerState::Running);
    assert!(prober.calls() >= 2);

    monitor.shutdown().await;
    assert_eq!(monitor.scheduler().state(), SchedulerState::Stopped);
}
