//! NATS transport for lifecycle events
//!
//! [`NatsEventPublisher`] is an outbox handler: every event it is handed is
//! published as JSON on `catalogue.{kind}.{operation}`. A publish failure
//! is returned to the dispatcher, which retries it like any other handler.

use async_nats::{Client, ConnectOptions, Subscriber};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::dispatch::EventHandler;
use crate::errors::{CatalogueError, CatalogueResult};
use crate::events::LifecycleEvent;

/// Configuration for NATS connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "catalogue-lifecycle".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl NatsConfig {
    /// Config for a comma-separated server list
    pub fn for_servers(servers: &str) -> Self {
        Self {
            servers: servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            ..Self::default()
        }
    }
}

/// NATS client wrapper
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect with the given configuration
    pub async fn connect(config: &NatsConfig) -> CatalogueResult<Self> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout)
            .request_timeout(Some(config.request_timeout));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| CatalogueError::Nats(e.to_string()))?;

        info!(servers = ?config.servers, "Connected to NATS");
        Ok(Self { client })
    }

    /// Publish a JSON message to a subject
    pub async fn publish<T>(&self, subject: &str, message: &T) -> CatalogueResult<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| CatalogueError::Nats(e.to_string()))?;

        debug!(subject, "Published message");
        Ok(())
    }

    pub async fn subscribe(&self, subject: &str) -> CatalogueResult<Subscriber> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| CatalogueError::Nats(e.to_string()))?;

        info!(subject, "Subscribed");
        Ok(subscriber)
    }

    /// Lifecycle events arriving on `subject` (wildcards allowed)
    ///
    /// Messages that are not valid events yield a `Serialization` error
    /// instead of ending the stream.
    pub async fn lifecycle_events(
        &self,
        subject: &str,
    ) -> CatalogueResult<impl Stream<Item = CatalogueResult<LifecycleEvent>>> {
        let subscriber = self.subscribe(subject).await?;
        Ok(subscriber.map(|message| decode_lifecycle_event(&message.payload)))
    }

    /// Flush buffered publishes
    pub async fn flush(&self) -> CatalogueResult<()> {
        self.client
            .flush()
            .await
            .map_err(|e| CatalogueError::Nats(e.to_string()))
    }
}

/// Decode one published lifecycle event
pub fn decode_lifecycle_event(payload: &[u8]) -> CatalogueResult<LifecycleEvent> {
    Ok(serde_json::from_slice(payload)?)
}

/// Outbox handler that forwards events to NATS
pub struct NatsEventPublisher {
    client: NatsClient,
}

impl NatsEventPublisher {
    pub const NAME: &'static str = "nats";

    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl EventHandler for NatsEventPublisher {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, event: &LifecycleEvent) -> CatalogueResult<()> {
        self.client.publish(&event.subject(), event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bundle, ResourceState, Service};
    use crate::events::LifecycleChange;
    use crate::identity::{Actor, InternalCapability};
    use chrono::Utc;

    #[test]
    fn test_config_for_servers() {
        let config = NatsConfig::for_servers("nats://a:4222, nats://b:4222,");
        assert_eq!(config.servers, vec!["nats://a:4222", "nats://b:4222"]);
        assert_eq!(config.name, "catalogue-lifecycle");
    }

    #[test]
    fn test_decode_published_event() {
        let actor: Actor = InternalCapability::issue("test").into();
        let bundle = Bundle::new(
            Service {
                id: "acme.compute".to_string(),
                name: "Compute".to_string(),
                resource_organisation: "acme".to_string(),
                version: None,
                description: None,
                webpage: None,
            },
            "eosc",
            ResourceState::Approved,
            true,
            &actor,
            Utc::now(),
        );
        let event = LifecycleEvent::for_bundle(&bundle, &actor, Utc::now(), LifecycleChange::ResourceSuspended { suspended: true });

        let decoded = decode_lifecycle_event(&serde_json::to_vec(&event).unwrap()).unwrap();
        assert_eq!(decoded.subject(), "catalogue.service.suspended");
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_decode_rejects_foreign_payload() {
        let err = decode_lifecycle_event(br#"{"kind":"heartbeat"}"#).unwrap_err();
        assert!(matches!(err, CatalogueError::Serialization(_)));
    }
}
