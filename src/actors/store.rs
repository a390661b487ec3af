//! EventStoreActor - bounded in-memory event history
//!
//! Insertion-ordered ring buffer of emitted events, newest first. Fixed
//! capacity; once full, the oldest entries are dropped on append (FIFO by
//! insertion order, not by the event's own timestamp). Nothing is persisted;
//! the buffer resets on process restart.
//!
//! The actor owns the buffer exclusively. Everything else goes through
//! [`StoreHandle`].

use std::collections::VecDeque;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, trace, warn};

use super::messages::StoreCommand;
use crate::HeatEvent;

/// Default `recent` limit when the caller does not specify one.
pub const DEFAULT_RECENT_LIMIT: usize = 100;

pub struct EventStoreActor {
    /// Emitted events, newest at the front
    events: VecDeque<HeatEvent>,

    /// Maximum events retained
    capacity: usize,

    command_rx: mpsc::Receiver<StoreCommand>,
}

impl EventStoreActor {
    pub fn new(capacity: usize, command_rx: mpsc::Receiver<StoreCommand>) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            command_rx,
        }
    }

    #[instrument(skip(self), fields(capacity = self.capacity))]
    pub async fn run(mut self) {
        debug!("starting event store actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                StoreCommand::Append { event } => self.append(event),

                StoreCommand::Recent { limit, respond_to } => {
                    let events = self.events.iter().take(limit).cloned().collect();
                    let _ = respond_to.send(events);
                }

                StoreCommand::FindByPointIdOrName { query, respond_to } => {
                    let found = self.find(&query);
                    let _ = respond_to.send(found);
                }

                StoreCommand::Count { respond_to } => {
                    let _ = respond_to.send(self.events.len());
                }

                StoreCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("event store actor stopped");
    }

    fn append(&mut self, event: HeatEvent) {
        trace!("storing event for {}", event.point_id);

        self.events.push_front(event);
        while self.events.len() > self.capacity {
            self.events.pop_back();
        }
    }

    /// First match scanning newest-first. Ids match exactly, display names
    /// case-insensitively.
    fn find(&self, query: &str) -> Option<HeatEvent> {
        self.events
            .iter()
            .find(|e| e.point_id == query || e.display_name.eq_ignore_ascii_case(query))
            .cloned()
    }
}

/// Handle for the event store actor.
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    /// Spawn a store actor with the given capacity and return its handle.
    pub fn spawn(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(EventStoreActor::new(capacity, rx).run());
        Self { sender: tx }
    }

    /// Append an event. Fire-and-forget; a full command queue drops the
    /// event with a warning rather than blocking the caller.
    pub fn append(&self, event: HeatEvent) {
        if let Err(e) = self.sender.try_send(StoreCommand::Append { event }) {
            warn!("event store append dropped: {e}");
        }
    }

    /// Up to `limit` stored events, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<HeatEvent>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreCommand::Recent {
                limit,
                respond_to: tx,
            })
            .await
            .context("failed to send Recent command")?;
        rx.await.context("failed to receive recent events")
    }

    /// Newest event matching a point id or display name, if any.
    pub async fn find_by_point_id_or_name(&self, query: &str) -> Result<Option<HeatEvent>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreCommand::FindByPointIdOrName {
                query: query.to_string(),
                respond_to: tx,
            })
            .await
            .context("failed to send FindByPointIdOrName command")?;
        rx.await.context("failed to receive lookup result")
    }

    /// Number of events currently stored.
    pub async fn count(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreCommand::Count { respond_to: tx })
            .await
            .context("failed to send Count command")?;
        rx.await.context("failed to receive count")
    }

    /// Gracefully shut down the store actor.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(StoreCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
