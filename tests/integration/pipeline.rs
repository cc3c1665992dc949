//! End-to-end pipeline tests: scheduler → store → summary
//!
//! These tests drive a real monitor with a scripted prober and check the
//! statistics the store reports afterwards.

use crate::helpers::{Script, ScriptedProber, single_tick_config, wait_for_total};
use aznetmon::{Target, monitor::Monitor};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_failing_icmp_target_after_one_tick() {
    let target = Target::icmp("10.255.255.1");
    let prober = ScriptedProber::new([(target.clone(), Script::Down("timeout"))]);

    let monitor = Monitor::spawn_with_prober(single_tick_config([target.clone()]), Arc::new(prober));
    wait_for_total(monitor.store(), &target, 1).await;

    let summary = monitor.store().summary(&target).await.unwrap();
    assert_eq!(summary.total_tests, 1);
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.packet_loss_percent, 100.0);
    assert_eq!(summary.avg_latency_ms, 0.0);
    assert_eq!(summary.last_error.as_deref(), Some("timeout"));

    let latest = monitor.store().latest(&target).await.unwrap();
    assert!(!latest.success);
    assert_eq!(latest.duration_ms, 0.0);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_healthy_tcp_target_over_three_ticks() {
    let target = Target::tcp("example.com", 443);
    let prober = ScriptedProber::new([(target.clone(), Script::Up(Duration::from_millis(20)))]);

    let monitor = Monitor::spawn_with_prober(single_tick_config([target.clone()]), Arc::new(prober));
    wait_for_total(monitor.store(), &target, 1).await;

    monitor.scheduler().probe_now().await.unwrap();
    monitor.scheduler().probe_now().await.unwrap();

    let summary = monitor.store().summary(&target).await.unwrap();
    assert_eq!(summary.total_tests, 3);
    assert_eq!(summary.successful, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.packet_loss_percent, 0.0);
    assert!((summary.avg_latency_ms - 20.0).abs() < 1e-9);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_mixed_targets_dashboard() {
    let up = Target::icmp("1.1.1.1");
    let down = Target::tcp("192.0.2.1", 22);
    let prober = ScriptedProber::new([
        (up.clone(), Script::Up(Duration::from_millis(12))),
        (down.clone(), Script::Down("connection refused")),
    ]);

    let monitor = Monitor::spawn_with_prober(
        single_tick_config([up.clone(), down.clone()]),
        Arc::new(prober),
    );
    wait_for_total(monitor.store(), &up, 1).await;
    wait_for_total(monitor.store(), &down, 1).await;

    let dashboard = monitor.scheduler().summary_now().await.unwrap();
    assert_eq!(dashboard.total_targets, 2);
    assert_eq!(dashboard.online_targets, 1);
    assert_eq!(dashboard.offline_targets, 1);

    let up_summary = monitor.store().summary(&up).await.unwrap();
    assert_eq!(dashboard.avg_latency_ms, up_summary.avg_latency_ms);

    let names: Vec<&str> = dashboard
        .target_stats
        .iter()
        .map(|stats| stats.target.as_str())
        .collect();
    assert_eq!(names, vec!["1.1.1.1", "192.0.2.1:22"]);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_results_keyed_by_target() {
    let icmp = Target::icmp("9.9.9.9");
    let tcp = Target::tcp("9.9.9.9", 53);
    let prober = ScriptedProber::new([
        (icmp.clone(), Script::Up(Duration::from_millis(3))),
        (tcp.clone(), Script::Up(Duration::from_millis(4))),
    ]);

    let monitor = Monitor::spawn_with_prober(
        single_tick_config([icmp.clone(), tcp.clone()]),
        Arc::new(prober),
    );
    wait_for_total(monitor.store(), &icmp, 1).await;
    wait_for_total(monitor.store(), &tcp, 1).await;

    let results = monitor.store().snapshot().await.results_by_key();
    let keys: Vec<&String> = results.keys().collect();
    assert_eq!(keys, vec!["9.9.9.9", "9.9.9.9-tcp-53"]);

    monitor.shutdown().await;
}
