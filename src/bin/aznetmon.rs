use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use aznetmon::{
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{MonitorConfig, parse_duration},
    monitor::Monitor,
    util,
};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "ICMP and TCP reachability monitor with a live dashboard")]
struct Args {
    /// Comma-separated ICMP hosts (falls back to ICMP_TARGETS)
    #[arg(long)]
    targets: Option<String>,

    /// Comma-separated TCP host:port pairs (falls back to TCP_TARGETS)
    #[arg(long)]
    tcp_targets: Option<String>,

    /// HTTP port (falls back to PORT, then 8080)
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (falls back to BIND_ADDR, then 0.0.0.0)
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Time between probe rounds
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    interval: Duration,

    /// Time between summary broadcasts
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    summary_interval: Duration,

    /// Per-probe timeout
    #[arg(long, value_parser = parse_duration, default_value = "3s")]
    timeout: Duration,

    /// Stop probing after this long (falls back to RUN_DURATION)
    #[arg(long, value_parser = parse_duration)]
    duration: Option<Duration>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("aznetmon", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn build_config(args: &Args) -> anyhow::Result<MonitorConfig> {
    let icmp = args.targets.clone().or_else(util::get_icmp_targets);
    let tcp = args.tcp_targets.clone().or_else(util::get_tcp_targets);

    let mut config = MonitorConfig::from_lists(icmp.as_deref(), tcp.as_deref())?;
    config.probe_interval = args.interval;
    config.summary_interval = args.summary_interval;
    config.probe_timeout = args.timeout;
    config.run_duration = match args.duration {
        Some(duration) => Some(duration),
        None => util::get_run_duration()
            .map(|value| parse_duration(&value))
            .transpose()?,
    };
    config.validate()?;

    if config.summary_interval < config.probe_interval {
        warn!(
            "summary interval {:?} is shorter than the probe interval {:?}",
            config.summary_interval, config.probe_interval
        );
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = build_config(&args)?;
    let run_duration = config.run_duration;

    let bind_addr = SocketAddr::new(
        args.bind.unwrap_or_else(util::get_addr),
        args.port.unwrap_or_else(util::get_port),
    );

    let monitor = Monitor::spawn(config);

    let addr = spawn_api_server(
        ApiConfig {
            bind_addr,
            enable_cors: true,
        },
        ApiState::new(monitor.clone()),
    )
    .await?;
    info!("dashboard available at http://{addr}/");

    match run_duration {
        Some(duration) => info!("monitoring for {duration:?}"),
        None => info!("monitoring until interrupted"),
    }

    tokio::select! {
        _ = monitor.scheduler().stopped() => {
            info!("run duration elapsed, shutting down");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("failed to listen for ctrl-c: {e}");
            }
            info!("interrupted, shutting down");
            monitor.shutdown().await;
        }
    }

    Ok(())
}
