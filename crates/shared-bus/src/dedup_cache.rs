//! # Delivered-Event Cache
//!
//! Remembers envelope ids that a consumer has already handled so that an
//! at-least-once redelivery is processed once.
//!
//! - Ids are kept for a fixed window measured from first sighting
//! - Expired ids are garbage-collected on insert, at most once per interval
//! - Memory is bounded by the event rate times the window

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DedupError {
    /// The envelope was already handled inside the window.
    #[error("Event {event_id} already delivered")]
    AlreadyDelivered { event_id: Uuid },
}

/// Time-bounded set of handled envelope ids.
pub struct DeliveredEventCache {
    /// Event id -> when it was first seen.
    seen: HashMap<Uuid, DateTime<Utc>>,
    window: Duration,
    gc_interval: Duration,
    last_gc: Option<DateTime<Utc>>,
}

impl DeliveredEventCache {
    /// Ten minutes.
    pub const DEFAULT_WINDOW_SECS: i64 = 600;

    pub const DEFAULT_GC_INTERVAL_SECS: i64 = 30;

    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_WINDOW_SECS, Self::DEFAULT_GC_INTERVAL_SECS)
    }

    #[must_use]
    pub fn with_config(window_secs: i64, gc_interval_secs: i64) -> Self {
        Self {
            seen: HashMap::new(),
            window: Duration::seconds(window_secs),
            gc_interval: Duration::seconds(gc_interval_secs),
            last_gc: None,
        }
    }

    /// Record `event_id` as delivered at `now`.
    ///
    /// # Errors
    ///
    /// `DedupError::AlreadyDelivered` if the id was recorded within the window.
    pub fn check_and_record(&mut self, event_id: Uuid, now: DateTime<Utc>) -> Result<(), DedupError> {
        let due = self
            .last_gc
            .map_or(true, |last| now - last >= self.gc_interval);
        if due {
            self.garbage_collect(now);
            self.last_gc = Some(now);
        }

        match self.seen.get(&event_id) {
            Some(first_seen) if now - *first_seen < self.window => {
                Err(DedupError::AlreadyDelivered { event_id })
            }
            _ => {
                self.seen.insert(event_id, now);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn contains(&self, event_id: &Uuid) -> bool {
        self.seen.contains_key(event_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn garbage_collect(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.seen.retain(|_, first_seen| now - *first_seen < window);
    }
}

impl Default for DeliveredEventCache {
    fn default() -> Self {
        Self::new()
    }
}
