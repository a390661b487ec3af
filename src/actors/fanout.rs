//! FanoutActor - live push feed to subscribed clients
//!
//! Owns the set of currently-subscribed connections exclusively. Each
//! subscriber gets its own bounded outbound channel of pre-serialized text
//! frames; publishing writes to every channel with per-subscriber failure
//! isolation. There is no backpressure or queuing beyond the channel bound:
//! writes are fire-and-forget, and a slow or broken subscriber is evicted on
//! the next failed write, not proactively.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, trace, warn};

use super::messages::{FanoutCommand, Subscription};
use crate::HeatEvent;

/// Frames buffered per subscriber before it counts as broken.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

pub struct FanoutActor {
    /// Outbound frame channels by subscriber id
    subscribers: HashMap<u64, mpsc::Sender<String>>,

    /// Next subscriber id; monotonically increasing for the process lifetime
    next_id: u64,

    command_rx: mpsc::Receiver<FanoutCommand>,
}

impl FanoutActor {
    pub fn new(command_rx: mpsc::Receiver<FanoutCommand>) -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 0,
            command_rx,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting fanout actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                FanoutCommand::Subscribe { respond_to } => {
                    let subscription = self.subscribe();
                    let _ = respond_to.send(subscription);
                }

                FanoutCommand::Unsubscribe { id } => {
                    if self.subscribers.remove(&id).is_some() {
                        debug!("subscriber {id} left, total={}", self.subscribers.len());
                    }
                }

                FanoutCommand::Publish { event } => self.publish(&event),

                FanoutCommand::SubscriberCount { respond_to } => {
                    let _ = respond_to.send(self.subscribers.len());
                }

                FanoutCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("fanout actor stopped");
    }

    fn subscribe(&mut self) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);

        // The welcome acknowledgement goes out before any event frame and is
        // distinct from heat_update payloads.
        let welcome = serde_json::json!({
            "type": "welcome",
            "ts": Utc::now().to_rfc3339(),
        })
        .to_string();
        let _ = tx.try_send(welcome);

        self.subscribers.insert(id, tx);
        debug!("subscriber {id} joined, total={}", self.subscribers.len());

        Subscription { id, rx }
    }

    fn publish(&mut self, event: &HeatEvent) {
        if self.subscribers.is_empty() {
            trace!("no subscribers for event {}", event.point_id);
            return;
        }

        let frame = match serde_json::to_value(event) {
            Ok(mut value) => {
                value["type"] = "heat_update".into();
                value.to_string()
            }
            Err(e) => {
                warn!("failed to serialize event for {}: {e}", event.point_id);
                return;
            }
        };

        // A failed write evicts that subscriber only; the publish continues
        // to everyone else.
        let mut broken = Vec::new();
        for (id, tx) in &self.subscribers {
            if tx.try_send(frame.clone()).is_err() {
                broken.push(*id);
            }
        }

        for id in broken {
            warn!("evicting subscriber {id} after failed write");
            self.subscribers.remove(&id);
        }

        trace!(
            "published event for {} to {} subscribers",
            event.point_id,
            self.subscribers.len()
        );
    }
}

/// Handle for the fanout actor.
#[derive(Clone)]
pub struct FanoutHandle {
    sender: mpsc::Sender<FanoutCommand>,
}

impl FanoutHandle {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(FanoutActor::new(rx).run());
        Self { sender: tx }
    }

    /// Register a new live subscriber. The returned channel yields a welcome
    /// frame first, then every published event.
    pub async fn subscribe(&self) -> Result<Subscription> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(FanoutCommand::Subscribe { respond_to: tx })
            .await
            .context("failed to send Subscribe command")?;
        rx.await.context("failed to receive subscription")
    }

    /// Deregister a subscriber promptly on transport close.
    pub async fn unsubscribe(&self, id: u64) -> Result<()> {
        self.sender
            .send(FanoutCommand::Unsubscribe { id })
            .await
            .context("failed to send Unsubscribe command")?;
        Ok(())
    }

    /// Push an event to all live subscribers. Fire-and-forget.
    pub fn publish(&self, event: HeatEvent) {
        if let Err(e) = self.sender.try_send(FanoutCommand::Publish { event }) {
            warn!("fanout publish dropped: {e}");
        }
    }

    /// Number of live subscribers.
    pub async fn subscriber_count(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(FanoutCommand::SubscriberCount { respond_to: tx })
            .await
            .context("failed to send SubscriberCount command")?;
        rx.await.context("failed to receive subscriber count")
    }

    /// Gracefully shut down the fanout actor.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(FanoutCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
