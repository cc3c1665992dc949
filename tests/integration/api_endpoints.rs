//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - All REST endpoints return correct responses
//! - Unknown targets produce a JSON 404
//! - WebSocket viewers get the snapshot, then live updates
//! - A client data frame ends the subscription

use crate::helpers::{Script, ScriptedProber, single_tick_config, wait_for_total};
use aznetmon::{
    Target,
    api::{ApiConfig, ApiState, spawn_api_server},
    monitor::Monitor,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

// Helper to create a test API server with one up and one down target
async fn spawn_test_api() -> (SocketAddr, Monitor) {
    let up = Target::icmp("203.0.113.10");
    let down = Target::tcp("203.0.113.20", 8443);
    let prober = ScriptedProber::new([
        (up.clone(), Script::Up(Duration::from_millis(15))),
        (down.clone(), Script::Down("connection refused")),
    ]);

    let monitor = Monitor::spawn_with_prober(
        single_tick_config([up.clone(), down.clone()]),
        Arc::new(prober),
    );
    wait_for_total(monitor.store(), &up, 1).await;
    wait_for_total(monitor.store(), &down, 1).await;

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
    };

    let addr = spawn_api_server(config, ApiState::new(monitor.clone()))
        .await
        .unwrap();
    (addr, monitor)
}

async fn get_json(url: String) -> (reqwest::StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _monitor) = spawn_test_api().await;

    let (status, json) = get_json(format!("http://{addr}/api/health")).await;

    assert_eq!(status, 200);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["scheduler"], "running");
    assert_eq!(json["subscribers"], 0);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_results_endpoint() {
    let (addr, _monitor) = spawn_test_api().await;

    let (status, json) = get_json(format!("http://{addr}/api/results")).await;

    assert_eq!(status, 200);
    let up = &json["203.0.113.10"];
    assert_eq!(up["target"], "203.0.113.10");
    assert_eq!(up["protocol"], "ICMP");
    assert_eq!(up["success"], true);
    assert!(up.get("port").is_none());
    assert!(up.get("error").is_none());

    let down = &json["203.0.113.20-tcp-8443"];
    assert_eq!(down["protocol"], "TCP");
    assert_eq!(down["port"], 8443);
    assert_eq!(down["success"], false);
    assert_eq!(down["duration_ms"], 0.0);
    assert_eq!(down["error"], "connection refused");
}

#[tokio::test]
async fn test_summary_endpoint() {
    let (addr, _monitor) = spawn_test_api().await;

    let (status, json) = get_json(format!("http://{addr}/api/summary")).await;

    assert_eq!(status, 200);
    assert_eq!(json["total_targets"], 2);
    assert_eq!(json["online_targets"], 1);
    assert_eq!(json["offline_targets"], 1);
    assert_eq!(json["target_stats"].as_array().unwrap().len(), 2);
    assert_eq!(json["target_stats"][1]["target"], "203.0.113.20:8443");
    assert_eq!(json["target_stats"][1]["packet_loss_percent"], 100.0);
}

#[tokio::test]
async fn test_unknown_target_returns_404() {
    let (addr, _monitor) = spawn_test_api().await;

    let (status, json) = get_json(format!("http://{addr}/api/targets/does-not-exist")).await;

    assert_eq!(status, 404);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_websocket_snapshot_then_live_updates() {
    let (addr, monitor) = spawn_test_api().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

    // Snapshot: one outcome per probed target
    let mut snapshot = Vec::new();
    while snapshot.len() < 2 {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            snapshot.push(serde_json::from_str::<Value>(&text).unwrap());
        }
    }
    let mut targets: Vec<&str> = snapshot
        .iter()
        .map(|msg| msg["target"].as_str().unwrap())
        .collect();
    targets.sort();
    assert_eq!(targets, vec!["203.0.113.10", "203.0.113.20"]);

    // Live summary
    monitor.scheduler().summary_now().await.unwrap();
    let summary = loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            let json: Value = serde_json::from_str(&text).unwrap();
            if json["type"] == "summary" {
                break json;
            }
        }
    };
    assert_eq!(summary["summary"]["total_targets"], 2);

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_client_text_frame_ends_subscription() {
    let (addr, monitor) = spawn_test_api().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while monitor.broadcaster().subscriber_count().await != 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("viewer never subscribed");

    ws.send(Message::Text("hello".to_string())).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while monitor.broadcaster().subscriber_count().await != 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("viewer was not unsubscribed");
}
