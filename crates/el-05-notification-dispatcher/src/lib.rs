//! # el-05-notification-dispatcher
//!
//! Consumes committed loan events from the shared bus and hands one
//! notification per recipient to a `NotificationSink`.
//!
//! ## Guarantees
//!
//! - Envelopes are handled at most once per dedup window, keyed by
//!   `event_id`; the bus itself is at-least-once.
//! - Transient sink failures are retried with doubling delay, up to
//!   `max_delivery_attempts`. Permanent ones are not retried.
//! - A lost notification is logged at `error` and counted. It never
//!   reaches back into the workflow.
//!
//! ## Module Structure
//!
//! ```text
//! domain/   - Notification, NotificationKind, event → recipient routing
//! ports/    - NotificationSink (outbound)
//! adapters/ - LoggingSink, RecordingSink
//! service   - NotificationDispatcher (dispatch + run loop)
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{LoggingSink, RecordingSink};
pub use config::DispatcherConfig;
pub use domain::{notifications_for, Notification, NotificationKind};
pub use ports::{NotificationSink, SinkError};
pub use service::{DispatchOutcome, DispatcherStats, NotificationDispatcher};
