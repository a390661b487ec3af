//! API shared state containing actor handles

use std::sync::Arc;
use std::time::Instant;

use crate::actors::{fanout::FanoutHandle, store::StoreHandle};
use crate::registry::PointRegistry;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the event store actor for history queries
    pub store: StoreHandle,

    /// Handle to the fanout actor for live subscriptions
    pub fanout: FanoutHandle,

    /// The immutable point catalog
    pub registry: Arc<PointRegistry>,

    /// Process start, for the health endpoint's uptime
    pub started_at: Instant,

    /// Configured poll interval, surfaced by the health endpoint
    pub poll_interval_secs: u64,
}

impl ApiState {
    pub fn new(
        store: StoreHandle,
        fanout: FanoutHandle,
        registry: Arc<PointRegistry>,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            fanout,
            registry,
            started_at: Instant::now(),
            poll_interval_secs,
        }
    }
}
