//! PollerActor - drives the upstream client across all point batches
//!
//! One long-lived loop: ticks at the configured interval (and immediately at
//! startup), fetches every batch sequentially, derives events, expands them
//! to synthetic siblings, appends everything to the store, and forwards
//! qualifying base events to the fanout.
//!
//! A cycle runs to completion inside the actor's select loop, so a new tick
//! cannot start while one is in flight; the ticker is set to
//! `MissedTickBehavior::Delay` so a slow cycle defers the next tick instead
//! of bursting. That is the cycle-in-progress guard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, instrument, trace, warn};

use super::fanout::FanoutHandle;
use super::messages::{CycleStats, PollerCommand};
use super::store::StoreHandle;
use crate::registry::PointRegistry;
use crate::upstream::WeatherProvider;
use crate::HeatEvent;

pub struct PollerActor {
    registry: Arc<PointRegistry>,
    provider: Arc<dyn WeatherProvider>,
    store: StoreHandle,
    fanout: FanoutHandle,

    /// Base points per upstream request
    batch_size: usize,

    interval_duration: Duration,

    command_rx: mpsc::Receiver<PollerCommand>,
}

impl PollerActor {
    pub fn new(
        registry: Arc<PointRegistry>,
        provider: Arc<dyn WeatherProvider>,
        store: StoreHandle,
        fanout: FanoutHandle,
        batch_size: usize,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<PollerCommand>,
    ) -> Self {
        Self {
            registry,
            provider,
            store,
            fanout,
            batch_size: batch_size.max(1),
            interval_duration,
            command_rx,
        }
    }

    #[instrument(skip(self), fields(interval = ?self.interval_duration))]
    pub async fn run(mut self) {
        debug!("starting poller actor");

        // First tick fires immediately, so the initial poll happens at startup.
        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.run_cycle().await;
                    if stats.aborted {
                        error!(
                            "poll cycle aborted after {}/{} batches",
                            stats.batches_ok, stats.batches_total
                        );
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PollerCommand::PollNow { respond_to } => {
                            debug!("received PollNow command");
                            let stats = self.run_cycle().await;
                            let _ = respond_to.send(stats);
                        }

                        PollerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating poll interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs.max(1));
                            ticker = interval(self.interval_duration);
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                            // The fresh ticker fires immediately; that poll
                            // doubles as confirmation of the new interval.
                        }

                        PollerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("poller actor stopped");
    }

    /// One complete poll cycle.
    ///
    /// Batches are fetched strictly sequentially; the first batch failure
    /// aborts the remaining batches for this cycle (the next scheduled cycle
    /// retries everything). Events from batches that already succeeded stay
    /// stored and published.
    #[instrument(skip(self))]
    async fn run_cycle(&mut self) -> CycleStats {
        let bases = self.registry.base_points();
        let mut stats = CycleStats {
            batches_total: bases.len().div_ceil(self.batch_size),
            ..CycleStats::default()
        };

        trace!(
            "polling {} base points in {} batches",
            bases.len(),
            stats.batches_total
        );

        for batch in bases.chunks(self.batch_size) {
            let observations = match self.provider.fetch_batch(batch).await {
                Ok(observations) => observations,
                Err(e) => {
                    error!("batch fetch failed, aborting cycle: {e}");
                    stats.aborted = true;
                    break;
                }
            };
            stats.batches_ok += 1;

            for obs in &observations {
                let Some(point) = batch.iter().find(|p| p.id == obs.point_id) else {
                    warn!("observation for unknown point {}", obs.point_id);
                    continue;
                };

                let base_event = HeatEvent::from_observation(point, obs);

                self.store.append(base_event.clone());
                stats.events_stored += 1;

                // Synthetic siblings densify the map but are stored only;
                // they never reach the push feed.
                for synthetic in self.registry.synthetics_of(&point.id) {
                    self.store.append(base_event.for_synthetic(synthetic));
                    stats.events_stored += 1;
                }

                if base_event.qualifies_for_push() {
                    debug!(
                        "alert: {} temp={}°C hi={}°C risk={} heatwave={}",
                        base_event.display_name,
                        base_event.temp_c,
                        base_event.heat_index_c,
                        base_event.risk_tier,
                        base_event.is_official_heatwave
                    );
                    self.fanout.publish(base_event);
                    stats.events_published += 1;
                }
            }
        }

        debug!(
            "cycle complete: {}/{} batches, {} stored, {} published",
            stats.batches_ok, stats.batches_total, stats.events_stored, stats.events_published
        );

        stats
    }
}

/// Handle for controlling the poller actor.
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,
}

impl PollerHandle {
    /// Spawn the poller actor and return its handle.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        registry: Arc<PointRegistry>,
        provider: Arc<dyn WeatherProvider>,
        store: StoreHandle,
        fanout: FanoutHandle,
        batch_size: usize,
        interval_duration: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(32);

        let actor = PollerActor::new(
            registry,
            provider,
            store,
            fanout,
            batch_size,
            interval_duration,
            rx,
        );
        tokio::spawn(actor.run());

        Self { sender: tx }
    }

    /// Run a poll cycle immediately, bypassing the interval timer.
    pub async fn poll_now(&self) -> Result<CycleStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;
        rx.await.context("failed to receive cycle stats")
    }

    /// Change the polling interval.
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(PollerCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the poller.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PollerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
