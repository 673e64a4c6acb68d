//! # calswitchd: calswitch daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the `.ics` calendar source and the virtual devices
//! - Construct the reconciliation engine, injecting adapters via port traits
//! - Log every audit record as it is made
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown: stop the engine on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing_subscriber::EnvFilter;

use calswitch_adapter_http_axum::router;
use calswitch_adapter_http_axum::state::AppState;
use calswitch_adapter_ics::IcsCalendarSource;
use calswitch_adapter_virtual::VirtualDevices;
use calswitch_app::audit_bus::InProcessAuditBus;
use calswitch_app::engine::ReconciliationEngine;
use calswitch_app::timer::TokioTimer;
use calswitch_domain::audit::{AUDIT_SOURCE, AuditRecord};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Adapters
    let calendars = IcsCalendarSource::new(&config.calendars.directory);
    let devices = Arc::new(
        config
            .devices
            .iter()
            .map(config::DeviceConfig::to_device)
            .collect::<VirtualDevices>(),
    );
    tracing::info!(
        directory = %calendars.directory().display(),
        devices = devices.len(),
        "adapters ready"
    );

    // Audit bus
    let audit = Arc::new(InProcessAuditBus::new(256));
    spawn_audit_logger(audit.subscribe());

    // Engine
    let engine = Arc::new(ReconciliationEngine::new(
        config.engine_config(),
        calendars,
        Arc::clone(&devices),
        TokioTimer,
        Arc::clone(&devices),
        audit,
    )?);
    engine.start().await?;

    // HTTP
    let app = router::build(AppState::new(Arc::clone(&engine)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "calswitchd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    engine.stop().await;
    tracing::info!("calswitchd stopped");
    Ok(())
}

/// Log every audit record at `info`, the way a logbook would show it.
fn spawn_audit_logger(receiver: broadcast::Receiver<AuditRecord>) {
    tokio::spawn(async move {
        let mut records = BroadcastStream::new(receiver);
        while let Some(item) = records.next().await {
            match item {
                Ok(record) => tracing::info!(
                    source = AUDIT_SOURCE,
                    target_id = %record.target_id,
                    recorded_at = %record.recorded_at,
                    "{}",
                    record.message()
                ),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "audit logger lagged behind");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
