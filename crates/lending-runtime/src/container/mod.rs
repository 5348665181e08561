//! # Service Container
//!
//! Configuration and the wired set of workflow services.

pub mod config;
pub mod services;

pub use config::{BusConfig, ConfigError, RuntimeConfig, TelemetryConfig};
pub use services::{
    Authorization, Dispatcher, Fulfillment, LendingServices, Reporting,
};
