use std::net::{IpAddr, Ipv4Addr};

use tracing::trace;

const HEATWATCH_ADDR: &str = "HEATWATCH_ADDR";
const HEATWATCH_PORT: &str = "HEATWATCH_PORT";
const HEATWATCH_POLL_INTERVAL_SECS: &str = "HEATWATCH_POLL_INTERVAL_SECS";
const HEATWATCH_BATCH_SIZE: &str = "HEATWATCH_BATCH_SIZE";
const HEATWATCH_EVENT_CAPACITY: &str = "HEATWATCH_EVENT_CAPACITY";
const HEATWATCH_UPSTREAM_URL: &str = "HEATWATCH_UPSTREAM_URL";

const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
const DEFAULT_BATCH_SIZE: usize = 5;
const DEFAULT_EVENT_CAPACITY: usize = 500;
const DEFAULT_UPSTREAM_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Hub configuration, sourced from the environment.
///
/// Every value has a default so an empty environment still starts a working
/// process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the query surface binds to
    pub addr: IpAddr,

    /// Port the query surface listens on
    pub port: u16,

    /// Seconds between poll cycles
    pub poll_interval_secs: u64,

    /// Maximum base points per upstream request
    pub batch_size: usize,

    /// Maximum events retained in the in-memory store
    pub event_capacity: usize,

    /// Base URL of the upstream forecast API
    pub upstream_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR,
            port: DEFAULT_PORT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults for
    /// anything absent or unparseable.
    pub fn from_env() -> Self {
        let config = Self {
            addr: env_or(HEATWATCH_ADDR, DEFAULT_ADDR),
            port: env_or(HEATWATCH_PORT, DEFAULT_PORT),
            poll_interval_secs: env_or(HEATWATCH_POLL_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS)
                .max(1),
            batch_size: env_or(HEATWATCH_BATCH_SIZE, DEFAULT_BATCH_SIZE).max(1),
            event_capacity: env_or(HEATWATCH_EVENT_CAPACITY, DEFAULT_EVENT_CAPACITY).max(1),
            upstream_url: std::env::var(HEATWATCH_UPSTREAM_URL)
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
        };
        trace!("loaded config: {config:?}");
        config
    }
}

fn env_or<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    std::env::var(name).map_or(default, |value| value.parse().unwrap_or(default))
}
