//! Dispatcher configuration.

/// Delivery policy for the dispatcher loop.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// How long a handled envelope id is remembered.
    pub dedup_window_secs: i64,
    /// Attempts per notification before it is logged as lost.
    pub max_delivery_attempts: u32,
    /// Sleep before the first retry; doubles on each further retry.
    pub retry_delay_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: 600,
            max_delivery_attempts: 3,
            retry_delay_ms: 50,
        }
    }
}
