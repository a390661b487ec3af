use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use heatwatch::{
    actors::{fanout::FanoutHandle, poller::PollerHandle, store::StoreHandle},
    api::{spawn_api_server, ApiConfig, ApiState},
    config::Config,
    registry::PointRegistry,
    upstream::OpenMeteoClient,
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Listening port (overrides HEATWATCH_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Poll interval in seconds (overrides HEATWATCH_POLL_INTERVAL_SECS)
    #[arg(short, long)]
    interval: Option<u64>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("heatwatch", LevelFilter::DEBUG),
        ("hub", LevelFilter::DEBUG),
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval.max(1);
    }
    debug!("effective config: {config:?}");

    let registry = Arc::new(PointRegistry::with_default_points());
    info!(
        "monitoring {} base points ({} with synthetic coverage)",
        registry.base_points().len(),
        registry.all_points().len()
    );

    let provider = Arc::new(OpenMeteoClient::new(config.upstream_url.clone())?);

    let store = StoreHandle::spawn(config.event_capacity);
    let fanout = FanoutHandle::spawn();

    let poller = PollerHandle::spawn(
        registry.clone(),
        provider,
        store.clone(),
        fanout.clone(),
        config.batch_size,
        Duration::from_secs(config.poll_interval_secs),
    );

    let api_state = ApiState::new(
        store.clone(),
        fanout.clone(),
        registry,
        config.poll_interval_secs,
    );
    let api_config = ApiConfig {
        bind_addr: SocketAddr::new(config.addr, config.port),
        enable_cors: true,
    };
    spawn_api_server(api_config, api_state).await?;

    info!("heatwatch hub running, polling every {}s", config.poll_interval_secs);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    poller.shutdown().await?;
    fanout.shutdown().await?;
    store.shutdown().await?;

    Ok(())
}
