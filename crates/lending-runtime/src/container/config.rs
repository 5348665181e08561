//! # Runtime Configuration
//!
//! Every subsystem's settings in one place. Defaults are usable as-is;
//! environment variables override individual fields.
//!
//! | Variable                 | Field                                  |
//! |--------------------------|----------------------------------------|
//! | `EL_LOCK_ATTEMPTS`       | `ledger.max_lock_attempts`             |
//! | `EL_LOCK_BACKOFF_MS`     | `ledger.initial_backoff_ms`            |
//! | `EL_LOCK_MAX_BACKOFF_MS` | `ledger.max_backoff_ms`                |
//! | `EL_BUS_CAPACITY`        | `bus.capacity`                         |
//! | `EL_DEDUP_WINDOW_SECS`   | `dispatcher.dedup_window_secs`         |
//! | `EL_DELIVERY_ATTEMPTS`   | `dispatcher.max_delivery_attempts`     |
//! | `EL_ROSTER`              | `roster_path`                          |
//! | `EL_LOG_LEVEL`           | `telemetry.log_level` (or `RUST_LOG`)  |
//! | `EL_JSON_LOGS`           | `telemetry.json_logs`                  |

use el_01_order_ledger::LedgerConfig;
use el_05_notification_dispatcher::DispatcherConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub ledger: LedgerConfig,
    pub bus: BusConfig,
    pub dispatcher: DispatcherConfig,
    pub telemetry: TelemetryConfig,
    /// JSON roster of principals, subjects, coordinator and units. The
    /// built-in demo roster is used when unset.
    pub roster_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Events buffered per subscriber before the oldest are overwritten.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `el_01_order_ledger=debug,info`.
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ledger lock attempts must be at least 1")]
    ZeroLockAttempts,

    #[error("initial lock backoff {initial_ms}ms exceeds the maximum {max_ms}ms")]
    BackoffInverted { initial_ms: u64, max_ms: u64 },

    #[error("event bus capacity must be at least 1")]
    ZeroBusCapacity,

    #[error("notification delivery attempts must be at least 1")]
    ZeroDeliveryAttempts,

    #[error("dedup window must be positive, got {0}s")]
    NonPositiveDedupWindow(i64),
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parsed(&lookup, "EL_LOCK_ATTEMPTS") {
            config.ledger.max_lock_attempts = v;
        }
        if let Some(v) = parsed(&lookup, "EL_LOCK_BACKOFF_MS") {
            config.ledger.initial_backoff_ms = v;
        }
        if let Some(v) = parsed(&lookup, "EL_LOCK_MAX_BACKOFF_MS") {
            config.ledger.max_backoff_ms = v;
        }
        if let Some(v) = parsed(&lookup, "EL_BUS_CAPACITY") {
            config.bus.capacity = v;
        }
        if let Some(v) = parsed(&lookup, "EL_DEDUP_WINDOW_SECS") {
            config.dispatcher.dedup_window_secs = v;
        }
        if let Some(v) = parsed(&lookup, "EL_DELIVERY_ATTEMPTS") {
            config.dispatcher.max_delivery_attempts = v;
        }
        if let Some(path) = lookup("EL_ROSTER") {
            config.roster_path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("EL_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            config.telemetry.log_level = level;
        }
        if let Some(v) = lookup("EL_JSON_LOGS") {
            config.telemetry.json_logs = v.eq_ignore_ascii_case("true") || v == "1";
        }

        config
    }

    /// # Errors
    ///
    /// The first setting that would make a subsystem misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.max_lock_attempts == 0 {
            return Err(ConfigError::ZeroLockAttempts);
        }
        if self.ledger.initial_backoff_ms > self.ledger.max_backoff_ms {
            return Err(ConfigError::BackoffInverted {
                initial_ms: self.ledger.initial_backoff_ms,
                max_ms: self.ledger.max_backoff_ms,
            });
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        if self.dispatcher.max_delivery_attempts == 0 {
            return Err(ConfigError::ZeroDeliveryAttempts);
        }
        if self.dispatcher.dedup_window_secs <= 0 {
            return Err(ConfigError::NonPositiveDedupWindow(
                self.dispatcher.dedup_window_secs,
            ));
        }
        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
