// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for public mirror maintenance
//!
//! Mirrors are only written by the dispatcher, so every test drains the
//! outbox before looking at the store.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;

use catalogue_lifecycle::domain::{ResourceKind, TemplateStatus};
use catalogue_lifecycle::mirror::mirror_id;
use catalogue_lifecycle::ports::ResourceStore;

async fn has_mirror(catalogue: &TestCatalogue, primary_id: &str) -> bool {
    catalogue
        .engine
        .stores
        .services
        .get(&mirror_id(CATALOGUE, primary_id), CATALOGUE)
        .await
        .unwrap()
        .is_some()
}

#[tokio::test]
async fn test_only_live_resources_are_mirrored() {
    let catalogue = TestCatalogue::new();
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    catalogue.seed_provider("initech", TemplateStatus::NoTemplate, true).await;
    catalogue
        .engine
        .services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
    catalogue
        .engine
        .services
        .add(service("initech.compute", "initech"), CATALOGUE, &admin())
        .await
        .unwrap();

    catalogue.engine.drain_events().await.unwrap();

    assert!(has_mirror(&catalogue, "acme.compute").await);
    assert!(!has_mirror(&catalogue, "initech.compute").await);

    let mirror = catalogue
        .engine
        .stores
        .services
        .get("eosc.acme.compute", CATALOGUE)
        .await
        .unwrap()
        .unwrap();
    assert!(mirror.is_public_mirror());
    assert_eq!(mirror.payload.name, "Service acme.compute");
}

#[tokio::test]
async fn test_suspension_withdraws_and_restores_mirror() {
    let catalogue = TestCatalogue::new();
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    let services = &catalogue.engine.services;
    services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();
    assert!(has_mirror(&catalogue, "acme.compute").await);

    services
        .suspend("acme.compute", CATALOGUE, true, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();
    assert!(!has_mirror(&catalogue, "acme.compute").await);

    catalogue.tick();
    services
        .suspend("acme.compute", CATALOGUE, false, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();
    assert!(has_mirror(&catalogue, "acme.compute").await);
}

#[tokio::test]
async fn test_resync_is_idempotent_and_repairs_drift() {
    let catalogue = TestCatalogue::new();
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    catalogue
        .engine
        .services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();

    // Seeded providers never produced events, so the first pass mirrors them
    let first = catalogue.engine.resync_mirrors(CATALOGUE).await;
    assert_eq!(first[&ResourceKind::Provider].created, 1);
    assert!(!first[&ResourceKind::Service].repaired());

    let second = catalogue.engine.resync_mirrors(CATALOGUE).await;
    assert!(second.values().all(|report| !report.repaired()));

    catalogue
        .engine
        .stores
        .services
        .delete("eosc.acme.compute", CATALOGUE)
        .await
        .unwrap();
    let repaired = catalogue.engine.resync_mirrors(CATALOGUE).await;
    assert_eq!(repaired[&ResourceKind::Service].created, 1);
    assert!(has_mirror(&catalogue, "acme.compute").await);
}

#[tokio::test]
async fn test_move_swaps_mirror() {
    let catalogue = TestCatalogue::new();
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    catalogue.seed_provider("globex", TemplateStatus::Approved, true).await;
    catalogue
        .engine
        .services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();

    let outcome = catalogue
        .engine
        .services
        .change_provider("acme.compute", CATALOGUE, "globex", None, &admin())
        .await
        .unwrap();
    assert_eq!(outcome.bundle.id, "globex.compute");
    catalogue.engine.drain_events().await.unwrap();

    assert!(!has_mirror(&catalogue, "acme.compute").await);
    assert!(has_mirror(&catalogue, "globex.compute").await);
}

#[tokio::test]
async fn test_primary_holding_a_mirror_key_survives_sync() {
    let catalogue = TestCatalogue::new();
    catalogue.seed_provider("eosc", TemplateStatus::Approved, true).await;
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    let services = &catalogue.engine.services;
    services
        .add(service("eosc.acme.compute", "eosc"), CATALOGUE, &admin())
        .await
        .unwrap();
    services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();

    catalogue.engine.drain_events().await.unwrap();

    let held = catalogue.service("eosc.acme.compute").await.unwrap();
    assert!(!held.is_public_mirror());
    assert_eq!(held.payload.resource_organisation, "eosc");
    assert_eq!(held.payload.name, "Service eosc.acme.compute");
    // The other primary's own mirror is unaffected
    assert!(has_mirror(&catalogue, "eosc.acme.compute").await);

    // Withdrawing acme.compute must not delete the primary either
    catalogue.tick();
    services
        .suspend("acme.compute", CATALOGUE, true, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();
    assert!(catalogue.service("eosc.acme.compute").await.is_some());

    let report = catalogue.engine.resync_mirrors(CATALOGUE).await;
    assert_eq!(report[&ResourceKind::Service].conflicts, 1);
}

#[tokio::test]
async fn test_service_activation_mirrors_interoperability_link() {
    let catalogue = TestCatalogue::new();
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    let services = &catalogue.engine.services;
    services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
    catalogue
        .seed_interoperability_link("acme.compute.rir", "acme.compute", false)
        .await;
    catalogue.engine.drain_events().await.unwrap();

    catalogue.tick();
    services
        .publish("acme.compute", CATALOGUE, false, &admin())
        .await
        .unwrap();
    catalogue.tick();
    services
        .publish("acme.compute", CATALOGUE, true, &admin())
        .await
        .unwrap();
    catalogue.engine.drain_events().await.unwrap();

    let mirror = catalogue
        .engine
        .stores
        .resource_interoperability_records
        .get(&mirror_id(CATALOGUE, "acme.compute.rir"), CATALOGUE)
        .await
        .unwrap()
        .unwrap();
    assert!(mirror.is_public_mirror());
    assert_eq!(mirror.payload.resource_id, "acme.compute");
}
