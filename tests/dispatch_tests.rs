// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for outbox delivery: retries, dead letters and ordering

mod fixtures;

use chrono::Duration;
use fixtures::*;
use pretty_assertions::assert_eq;

use catalogue_lifecycle::audit::ActionType;
use catalogue_lifecycle::config::RetryConfig;
use catalogue_lifecycle::dispatch::{NotificationHandler, Outbox, OutboxStatus};
use catalogue_lifecycle::domain::TemplateStatus;

fn retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 1_000,
        max_delay_ms: 60_000,
        multiplier: 2.0,
    }
}

async fn onboard(catalogue: &TestCatalogue) {
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    catalogue
        .engine
        .services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_notification_is_retried_with_backoff() {
    let catalogue = TestCatalogue::with_retry(retry(5));
    catalogue.notifier.fail_next(2);
    onboard(&catalogue).await;

    let first = catalogue.engine.drain_events().await.unwrap();
    assert_eq!((first.delivered, first.retried), (1, 1));
    assert!(catalogue.engine.drain_events().await.unwrap().is_idle());

    // Attempt 2 after the initial delay, which then doubles
    catalogue.clock.advance(Duration::seconds(1));
    assert_eq!(catalogue.engine.drain_events().await.unwrap().retried, 1);
    catalogue.clock.advance(Duration::seconds(1));
    assert!(catalogue.engine.drain_events().await.unwrap().is_idle());
    catalogue.clock.advance(Duration::seconds(1));
    assert_eq!(catalogue.engine.drain_events().await.unwrap().delivered, 1);

    let sent = catalogue.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["ops@acme.org".to_string()]);
    assert_eq!(sent[0].subject, "[eosc] service 'acme.compute' onboarded");
}

#[tokio::test]
async fn test_exhausted_delivery_is_dead_lettered() {
    let catalogue = TestCatalogue::with_retry(retry(3));
    catalogue.notifier.fail_next(10);
    onboard(&catalogue).await;

    catalogue.engine.drain_events().await.unwrap();
    catalogue.clock.advance(Duration::seconds(1));
    catalogue.engine.drain_events().await.unwrap();
    catalogue.clock.advance(Duration::seconds(2));
    let last = catalogue.engine.drain_events().await.unwrap();
    assert_eq!(last.dead_lettered, 1);

    let dead = catalogue
        .engine
        .outbox
        .with_status(OutboxStatus::DeadLettered)
        .await
        .unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].handler, NotificationHandler::NAME);
    assert_eq!(dead[0].attempts, 3);
    assert_eq!(dead[0].last_error.as_deref(), Some("Notification error: mail relay unavailable"));
    // Acknowledged mirror deliveries are gone; only the dead letter remains
    assert_eq!(catalogue.engine.outbox.len().await, 1);

    // Dead letters stay put
    catalogue.clock.advance(Duration::minutes(10));
    assert!(catalogue.engine.drain_events().await.unwrap().is_idle());
    assert!(catalogue.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_outbox_shrinks_back_after_drain() {
    let catalogue = TestCatalogue::with_retry(retry(5));
    catalogue.notifier.fail_next(1);
    onboard(&catalogue).await;
    assert!(!catalogue.engine.outbox.is_empty().await);

    catalogue.engine.drain_events().await.unwrap();
    let pending = catalogue.engine.outbox.with_status(OutboxStatus::Pending).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(catalogue.engine.outbox.len().await, pending.len());

    catalogue.clock.advance(Duration::seconds(1));
    catalogue.engine.drain_events().await.unwrap();
    assert!(catalogue.engine.outbox.is_empty().await);
}

#[tokio::test]
async fn test_events_of_one_resource_arrive_in_order() {
    let catalogue = TestCatalogue::with_retry(retry(5));
    catalogue.notifier.fail_next(1);
    onboard(&catalogue).await;
    catalogue.tick();
    catalogue
        .engine
        .services
        .audit(
            "acme.compute",
            CATALOGUE,
            Some("links verified".to_string()),
            ActionType::Valid,
            &admin(),
        )
        .await
        .unwrap();

    // The audit notification waits behind the failed onboarding one
    let first = catalogue.engine.drain_events().await.unwrap();
    assert_eq!(first.retried, 1);
    assert!(catalogue.notifier.sent().await.is_empty());

    catalogue.clock.advance(Duration::seconds(1));
    let second = catalogue.engine.drain_events().await.unwrap();
    assert_eq!(second.delivered, 2);

    let subjects: Vec<String> = catalogue
        .notifier
        .sent()
        .await
        .into_iter()
        .map(|n| n.subject)
        .collect();
    assert_eq!(
        subjects,
        vec![
            "[eosc] service 'acme.compute' onboarded".to_string(),
            "[eosc] service 'acme.compute' audited".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_background_dispatcher_delivers_and_stops() {
    let catalogue = TestCatalogue::new();
    let dispatcher = catalogue.engine.spawn_dispatcher();
    onboard(&catalogue).await;

    let delivered = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while catalogue.notifier.sent().await.is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(delivered.is_ok());

    dispatcher.shutdown().await.unwrap();
}
