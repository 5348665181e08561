//! Driven Ports (SPI - Outbound)

use crate::domain::Notification;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Transport down or timed out. Worth another attempt.
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The sink refused this message. Retrying will not help.
    #[error("notification rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Where rendered notifications go (mail relay, push gateway, a log).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError>;
}
