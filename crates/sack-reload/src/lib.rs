//! Live-reload notification hub for the sack dev server.
//!
//! This crate connects the file watcher to browsers:
//!
//! - [`SubscriberRegistry`] tracks open WebSocket connections
//! - [`BroadcastLoop`] turns filtered change events into `"reload"` messages
//! - [`notification_router`] exposes the WebSocket endpoint browsers connect to
//! - [`inject_reload_script`] adds the client snippet to every HTML page served
//!
//! # Architecture
//!
//! ```text
//!  sack-watcher                      sack-reload
//! ┌─────────────┐  ChangeEvent  ┌───────────────┐ broadcast ┌────────────────────┐
//! │ Watcher     │ ────────────► │ BroadcastLoop │ ────────► │ SubscriberRegistry │
//! └─────────────┘               └───────────────┘           └─────────┬──────────┘
//!                                                                     │ "reload"
//!  browser  ◄─── HTML + <script> ◄── inject_reload_script             ▼
//!     │                                                     ┌────────────────────┐
//!     └───────────── WebSocket /ws ───────────────────────► │ notification_router│
//!                                                           └────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod broadcast;
pub mod endpoint;
pub mod error;
pub mod middleware;
pub mod registry;

pub use broadcast::{BroadcastLoop, LoopStats};
pub use endpoint::notification_router;
pub use error::ReloadError;
pub use middleware::{HTML_CONTENT_TYPE, RecordedResponse, ReloadScript, inject_reload_script};
pub use registry::{
    BroadcastReport, RELOAD_PAYLOAD, Subscriber, SubscriberId, SubscriberInbox,
    SubscriberRegistry,
};
