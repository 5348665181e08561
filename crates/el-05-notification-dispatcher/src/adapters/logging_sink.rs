//! Sink that writes each notification as a structured log line.

use crate::domain::Notification;
use crate::ports::outbound::{NotificationSink, SinkError};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&notification.payload)
            .map_err(|e| SinkError::Rejected(e.to_string()))?;
        info!(
            target: "notifications",
            event_id = %notification.event_id,
            order = %notification.order,
            recipient = %notification.recipient,
            kind = %notification.kind,
            %payload,
            "notification sent"
        );
        Ok(())
    }
}
