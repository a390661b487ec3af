//! Actor-based polling and distribution pipeline
//!
//! Each long-lived component runs as an independent async task owning its
//! state exclusively, controlled through an mpsc command channel and fronted
//! by a cloneable handle.
//!
//! ```text
//!   ┌──────────────┐   fetch    ┌──────────────────┐
//!   │ PollerActor  ├───────────►│ WeatherProvider  │ (upstream HTTP)
//!   └──────┬───────┘            └──────────────────┘
//!          │ append all events / publish qualifying base events
//!     ┌────┴─────────────┐
//!     ▼                  ▼
//! ┌───────────────┐  ┌──────────────┐   per-subscriber mpsc
//! │ EventStore    │  │ FanoutActor  ├─────────────────────► WebSocket
//! │ Actor         │  │              ├─────────────────────► handlers
//! └───────────────┘  └──────────────┘
//!          ▲ recent / find / count          ▲ subscribe / unsubscribe
//!          └──────────── Query Surface ─────┘
//! ```
//!
//! The poller never reaches into store or fanout internals; it only uses
//! their public handles.

pub mod fanout;
pub mod messages;
pub mod poller;
pub mod store;
