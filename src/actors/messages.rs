//! Message types for actor communication
//!
//! Commands are request/response messages sent to a specific actor via its
//! mpsc channel; queries carry a `oneshot` responder.

use tokio::sync::{mpsc, oneshot};

use crate::HeatEvent;

/// Commands understood by the poll orchestrator.
#[derive(Debug)]
pub enum PollerCommand {
    /// Run a full poll cycle immediately, bypassing the interval timer.
    ///
    /// Used by tests and manual refresh operations.
    PollNow {
        respond_to: oneshot::Sender<CycleStats>,
    },

    /// Change the polling interval; takes effect immediately.
    UpdateInterval { interval_secs: u64 },

    /// Gracefully shut down the poller.
    Shutdown,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Batches the cycle was partitioned into
    pub batches_total: usize,

    /// Batches fetched successfully before any abort
    pub batches_ok: usize,

    /// Events appended to the store (base + synthetic)
    pub events_stored: usize,

    /// Base events forwarded to the fanout
    pub events_published: usize,

    /// Whether the cycle aborted early on a batch failure
    pub aborted: bool,
}

/// Commands understood by the event store actor.
#[derive(Debug)]
pub enum StoreCommand {
    /// Append an event; oldest entries are evicted past capacity.
    Append { event: HeatEvent },

    /// Fetch up to `limit` events, newest first.
    Recent {
        limit: usize,
        respond_to: oneshot::Sender<Vec<HeatEvent>>,
    },

    /// Find the newest event whose point id or display name matches.
    FindByPointIdOrName {
        query: String,
        respond_to: oneshot::Sender<Option<HeatEvent>>,
    },

    /// Number of events currently stored.
    Count { respond_to: oneshot::Sender<usize> },

    /// Gracefully shut down the store.
    Shutdown,
}

/// A live subscription to the broadcast feed.
///
/// `rx` yields pre-serialized text frames: a welcome frame first, then one
/// frame per published event.
#[derive(Debug)]
pub struct Subscription {
    /// Opaque subscriber id, unique for the process lifetime
    pub id: u64,

    /// Outbound frames for this subscriber
    pub rx: mpsc::Receiver<String>,
}

/// Commands understood by the broadcast fanout actor.
#[derive(Debug)]
pub enum FanoutCommand {
    /// Register a new subscriber and hand back its frame channel.
    Subscribe {
        respond_to: oneshot::Sender<Subscription>,
    },

    /// Deregister a subscriber (transport closed).
    Unsubscribe { id: u64 },

    /// Push an event to every live subscriber.
    Publish { event: HeatEvent },

    /// Number of live subscribers.
    SubscriberCount { respond_to: oneshot::Sender<usize> },

    /// Gracefully shut down the fanout.
    Shutdown,
}
