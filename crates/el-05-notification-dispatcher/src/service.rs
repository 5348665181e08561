//! Notification Dispatcher service
//!
//! ```text
//! Subscription ──recv──→ dedup(event_id) ──seen──→ drop
//!                              │
//!                              └──new──→ notifications_for(envelope)
//!                                           │
//!                                           └──→ sink.send (retry transient, bounded)
//! ```
//!
//! Nothing here can fail a workflow operation: by the time an envelope
//! arrives its transition is already committed. Failures are logged and
//! counted.

use crate::config::DispatcherConfig;
use crate::domain::{notifications_for, Notification};
use crate::ports::outbound::{NotificationSink, SinkError};
use chrono::Utc;
use parking_lot::Mutex;
use shared_bus::{DeliveredEventCache, EventEnvelope, Subscription};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What happened to one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Already handled inside the dedup window.
    Duplicate,
    Dispatched { delivered: usize, failed: usize },
}

/// Running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub envelopes: u64,
    pub duplicates: u64,
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    envelopes: AtomicU64,
    duplicates: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

pub struct NotificationDispatcher<S: NotificationSink> {
    sink: Arc<S>,
    config: DispatcherConfig,
    delivered: Mutex<DeliveredEventCache>,
    counters: Counters,
}

impl<S: NotificationSink> NotificationDispatcher<S> {
    pub fn new(sink: Arc<S>, config: DispatcherConfig) -> Self {
        let delivered = DeliveredEventCache::with_config(
            config.dedup_window_secs,
            DeliveredEventCache::DEFAULT_GC_INTERVAL_SECS,
        );
        Self {
            sink,
            config,
            delivered: Mutex::new(delivered),
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            envelopes: self.counters.envelopes.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Handle one envelope: suppress repeats, fan out, send.
    pub async fn dispatch(&self, envelope: &EventEnvelope) -> DispatchOutcome {
        self.counters.envelopes.fetch_add(1, Ordering::Relaxed);

        let first_sighting = self
            .delivered
            .lock()
            .check_and_record(envelope.event_id, Utc::now());
        if let Err(e) = first_sighting {
            debug!(error = %e, event = envelope.event.name(), "duplicate envelope dropped");
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::Duplicate;
        }

        let mut delivered = 0;
        let mut failed = 0;
        for notification in notifications_for(envelope) {
            match self.send_with_retry(&notification).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    error!(
                        event_id = %notification.event_id,
                        order = %notification.order,
                        recipient = %notification.recipient,
                        kind = %notification.kind,
                        error = %e,
                        "notification lost"
                    );
                }
            }
        }

        self.counters
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.counters.failed.fetch_add(failed as u64, Ordering::Relaxed);
        DispatchOutcome::Dispatched { delivered, failed }
    }

    async fn send_with_retry(&self, notification: &Notification) -> Result<(), SinkError> {
        let attempts = self.config.max_delivery_attempts.max(1);
        let mut delay = self.config.retry_delay_ms;

        for attempt in 1..=attempts {
            match self.sink.send(notification).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(
                        recipient = %notification.recipient,
                        kind = %notification.kind,
                        attempt,
                        error = %e,
                        "notification send failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
        Err(SinkError::Unavailable("no delivery attempts made".into()))
    }

    /// Consume `subscription` until the bus closes or `shutdown` flips to
    /// `true`.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!("Notification dispatcher started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                next = subscription.recv() => match next {
                    Some(envelope) => {
                        self.dispatch(&envelope).await;
                    }
                    None => {
                        info!("Event bus closed, dispatcher exiting");
                        break;
                    }
                },
            }
        }

        let stats = self.stats();
        info!(
            envelopes = stats.envelopes,
            duplicates = stats.duplicates,
            delivered = stats.delivered,
            failed = stats.failed,
            "Notification dispatcher stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingSink;
    use crate::domain::NotificationKind;
    use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus, LoanEvent};
    use shared_types::entities::{OrderId, PrincipalId};

    fn approved() -> EventEnvelope {
        EventEnvelope::new(LoanEvent::OrderApproved {
            order: OrderId::new(),
            borrower: PrincipalId::from("alice"),
        })
    }

    fn fast_config() -> DispatcherConfig {
        DispatcherConfig {
            retry_delay_ms: 1,
            ..DispatcherConfig::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_envelope_sent_once() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = NotificationDispatcher::new(sink.clone(), fast_config());
        let envelope = approved();

        assert_eq!(
            dispatcher.dispatch(&envelope).await,
            DispatchOutcome::Dispatched {
                delivered: 1,
                failed: 0
            }
        );
        assert_eq!(dispatcher.dispatch(&envelope).await, DispatchOutcome::Duplicate);
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(dispatcher.stats().duplicates, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let sink = Arc::new(RecordingSink::failing_first(2));
        let dispatcher = NotificationDispatcher::new(sink.clone(), fast_config());

        let outcome = dispatcher.dispatch(&approved()).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                delivered: 1,
                failed: 0
            }
        );
        assert_eq!(sink.count_of(NotificationKind::OrderApproved), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_counted_not_raised() {
        let sink = Arc::new(RecordingSink::failing_first(10));
        let dispatcher = NotificationDispatcher::new(sink.clone(), fast_config());

        let outcome = dispatcher.dispatch(&approved()).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                delivered: 0,
                failed: 1
            }
        );
        assert!(sink.sent().is_empty());
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let sink = Arc::new(RecordingSink::rejecting());
        let dispatcher = NotificationDispatcher::new(sink, fast_config());

        let outcome = dispatcher.dispatch(&approved()).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                delivered: 0,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let bus = InMemoryEventBus::new();
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(sink.clone(), fast_config()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            dispatcher
                .clone()
                .run(bus.subscribe(EventFilter::all()), shutdown_rx),
        );

        let envelope = approved();
        bus.publish_envelope(envelope.clone()).await;
        bus.publish_envelope(envelope).await;

        for _ in 0..100 {
            if dispatcher.stats().envelopes == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.sent().len(), 1);
        assert_eq!(dispatcher.stats().duplicates, 1);
    }
}
