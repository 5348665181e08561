//! Ports for the Notification Dispatcher

pub mod outbound;

pub use outbound::{NotificationSink, SinkError};
