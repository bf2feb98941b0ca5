// Copyright (c) 2025 - Cowboy AI, Inc.
//! Catalogue Monitor
//!
//! Follows the lifecycle events a catalogue engine publishes through its
//! NATS outbox handler and logs each one with its correlation chain.
//!
//! Run with: cargo run --bin catalogue-monitor [subject]
//!
//! The subject defaults to `catalogue.>`; narrower ones such as
//! `catalogue.service.>` work too. `NATS_URL` must be set (see
//! `catalogue_lifecycle::config`).

use anyhow::{Context, Result};
use catalogue_lifecycle::{
    config::CatalogueConfig, nats::NatsClient, subjects::SubjectBuilder, telemetry,
};
use futures::StreamExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    info!("🚀 Starting catalogue monitor");

    let config = CatalogueConfig::from_env().context("Invalid configuration")?;
    let nats = config
        .nats
        .context("NATS_URL not set; the monitor has nothing to follow")?;
    let subject = std::env::args().nth(1).unwrap_or_else(SubjectBuilder::build_all);

    info!("🔌 Connecting to NATS at {}", nats.url);
    let client = NatsClient::connect(&nats.to_nats_config())
        .await
        .context("Failed to connect to NATS")?;
    info!("✅ Connected to NATS");

    let mut events = Box::pin(
        client
            .lifecycle_events(&subject)
            .await
            .context("Failed to subscribe")?,
    );
    info!("👂 Following {}", subject);

    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            next = events.next() => match next {
                Some(Ok(event)) => {
                    seen += 1;
                    info!(
                        event_id = %event.event_id,
                        event_type = event.event_type_name(),
                        kind = event.resource_kind.as_str(),
                        resource_id = %event.resource_id,
                        catalogue_id = %event.catalogue_id,
                        actor_id = %event.actor_id,
                        correlation_id = %event.correlation_id,
                        causation_id = ?event.causation_id,
                        "Lifecycle event"
                    );
                }
                Some(Err(e)) => warn!("Skipping undecodable message: {}", e),
                None => {
                    warn!("Subscription closed by the server");
                    break;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for shutdown signal")?;
                info!("🛑 Shutdown requested");
                break;
            }
        }
    }

    info!(events = seen, "👋 Catalogue monitor stopped");
    Ok(())
}
