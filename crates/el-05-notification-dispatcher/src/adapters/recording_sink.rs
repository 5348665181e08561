//! In-memory sink that keeps everything it is given.
//!
//! Can be told to fail its next N sends, which is how retry behaviour is
//! exercised.

use crate::domain::{Notification, NotificationKind};
use crate::ports::outbound::{NotificationSink, SinkError};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::entities::PrincipalId;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
    fail_next: AtomicU32,
    reject_all: bool,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose first `count` sends fail as unavailable.
    #[must_use]
    pub fn failing_first(count: u32) -> Self {
        Self {
            fail_next: AtomicU32::new(count),
            ..Self::default()
        }
    }

    /// A sink that refuses every message.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    #[must_use]
    pub fn sent_to(&self, recipient: &PrincipalId) -> Vec<Notification> {
        self.sent
            .lock()
            .iter()
            .filter(|n| &n.recipient == recipient)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.sent.lock().iter().filter(|n| n.kind == kind).count()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        if self.reject_all {
            return Err(SinkError::Rejected("recipient unknown".into()));
        }
        let pending_failure = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending_failure {
            return Err(SinkError::Unavailable("relay offline".into()));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}
