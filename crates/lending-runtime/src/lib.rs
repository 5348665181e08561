//! # Lending Runtime
//!
//! Wires the workflow subsystems into one process and owns the lifetime of
//! the background notification task.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment and validate it
//! 2. Install the tracing subscriber
//! 3. Load the roster (or fall back to the demo roster)
//! 4. Build the ledger, directories and services over one event bus
//! 5. Spawn the notification dispatcher
//!
//! ## Shutdown
//!
//! The dispatcher watches a `watch` channel; `shutdown` flips it and waits a
//! bounded time for the task to drain and exit.

pub mod adapters;
pub mod container;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use el_05_notification_dispatcher::{LoggingSink, NotificationSink};
use parking_lot::Mutex;
use shared_bus::{EventFilter, Subscription};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::Roster;
use crate::container::{LendingServices, RuntimeConfig};

pub use container::ConfigError;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime already started")]
    AlreadyStarted,
}

/// The running process: services plus the background dispatcher task.
pub struct LendingRuntime<S: NotificationSink = LoggingSink> {
    services: Arc<LendingServices<S>>,
    /// Taken by `start`. Subscribed at construction so nothing committed
    /// before the task spawns is missed.
    subscription: Mutex<Option<Subscription>>,
    dispatcher_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: NotificationSink + 'static> LendingRuntime<S> {
    pub fn new(config: RuntimeConfig, roster: &Roster, sink: Arc<S>) -> Self {
        info!("Creating lending runtime");
        let services = Arc::new(LendingServices::new(config, roster, sink));
        let subscription = services.event_bus.subscribe(EventFilter::all());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            services,
            subscription: Mutex::new(Some(subscription)),
            dispatcher_task: Mutex::new(None),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Spawn the dispatcher. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `AlreadyStarted` on a second call.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let subscription = self
            .subscription
            .lock()
            .take()
            .ok_or(RuntimeError::AlreadyStarted)?;

        let dispatcher = Arc::clone(&self.services.dispatcher);
        let handle = tokio::spawn(dispatcher.run(subscription, self.shutdown_rx.clone()));
        *self.dispatcher_task.lock() = Some(handle);

        let config = &self.services.config;
        info!(
            lock_attempts = config.ledger.max_lock_attempts,
            bus_capacity = config.bus.capacity,
            dedup_window_secs = config.dispatcher.dedup_window_secs,
            "Lending runtime started"
        );
        Ok(())
    }

    /// Signal the dispatcher and wait for it to exit.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let handle = self.dispatcher_task.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "dispatcher task failed"),
                Err(_) => warn!("dispatcher did not stop within the grace period"),
            }
        }

        info!(orders = self.services.ledger.len(), "Shutdown complete");
    }

    #[must_use]
    pub fn services(&self) -> Arc<LendingServices<S>> {
        Arc::clone(&self.services)
    }
}
