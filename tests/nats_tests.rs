// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS round trip for published lifecycle events

use catalogue_lifecycle::dispatch::EventHandler;
use catalogue_lifecycle::domain::{Bundle, ResourceKind, ResourceState, Service};
use catalogue_lifecycle::events::{LifecycleChange, LifecycleEvent};
use catalogue_lifecycle::identity::{Actor, InternalCapability};
use catalogue_lifecycle::nats::{NatsClient, NatsConfig, NatsEventPublisher};
use catalogue_lifecycle::subjects::SubjectBuilder;
use chrono::Utc;
use futures::StreamExt;
use std::time::Duration;

fn suspended_service() -> LifecycleEvent {
    let actor: Actor = InternalCapability::issue("nats-test").into();
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
    LifecycleEvent::for_bundle(&bundle, &actor, Utc::now(), LifecycleChange::ResourceSuspended { suspended: true })
}

#[tokio::test]
#[ignore = "requires NATS server"]
async fn test_published_event_reaches_subscriber() {
    let client = NatsClient::connect(&NatsConfig::default()).await.unwrap();
    let mut events = Box::pin(
        client
            .lifecycle_events(&SubjectBuilder::new(ResourceKind::Service).build())
            .await
            .unwrap(),
    );

    let event = suspended_service();
    let publisher = NatsEventPublisher::new(client.clone());
    publisher.handle(&event).await.unwrap();
    client.flush().await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .expect("no event within 5s")
        .expect("subscription closed")
        .unwrap();
    assert_eq!(received, event);
}
