//! # Lending Runtime
//!
//! Process entry point: configuration, telemetry, roster, services, and the
//! notification task, then wait for Ctrl+C.

use std::sync::Arc;

use anyhow::{Context, Result};
use el_05_notification_dispatcher::LoggingSink;
use lending_runtime::adapters::Roster;
use lending_runtime::container::RuntimeConfig;
use lending_runtime::telemetry::init_telemetry;
use lending_runtime::LendingRuntime;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    init_telemetry(&config.telemetry)?;
    config.validate().context("invalid configuration")?;

    let roster = match &config.roster_path {
        Some(path) => Roster::load(path)
            .with_context(|| format!("failed to load roster {}", path.display()))?,
        None => {
            warn!("EL_ROSTER not set, using the built-in demo roster");
            Roster::demo()
        }
    };

    let runtime = LendingRuntime::new(config, &roster, Arc::new(LoggingSink));
    runtime.start()?;

    info!("Lending runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
