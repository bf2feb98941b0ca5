// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for ownership moves and their reconciliation

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;

use catalogue_lifecycle::audit::{ActionType, LogType};
use catalogue_lifecycle::domain::TemplateStatus;
use catalogue_lifecycle::events::LifecycleChange;
use catalogue_lifecycle::lifecycle::{MoveStep, ReconcileReport};

async fn two_providers(catalogue: &TestCatalogue) {
    catalogue.seed_provider("acme", TemplateStatus::Approved, true).await;
    catalogue.seed_provider("globex", TemplateStatus::Approved, true).await;
    catalogue
        .engine
        .services
        .add(service("acme.compute", "acme"), CATALOGUE, &admin())
        .await
        .unwrap();
    catalogue.tick();
}

#[tokio::test]
async fn test_move_rekeys_and_rewrites_references() {
    let catalogue = TestCatalogue::new();
    two_providers(&catalogue).await;

    let outcome = catalogue
        .engine
        .services
        .change_provider(
            "acme.compute",
            CATALOGUE,
            "globex",
            Some("merger".to_string()),
            &admin(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.bundle.id, "globex.compute");
    assert_eq!(outcome.bundle.payload.resource_organisation, "globex");
    let last = outcome.bundle.audit.last().unwrap();
    assert_eq!((last.log_type, last.action_type), (LogType::Move, ActionType::Moved));
    assert_eq!(last.comment.as_deref(), Some("merger"));

    assert!(catalogue.service("acme.compute").await.is_none());
    assert!(catalogue.service("globex.compute").await.is_some());
    assert_eq!(
        catalogue.migration.calls().await,
        vec![(
            "acme.compute".to_string(),
            "globex.compute".to_string(),
            CATALOGUE.to_string()
        )]
    );
    assert!(catalogue
        .engine
        .moves
        .all()
        .await
        .iter()
        .all(|intent| intent.step == MoveStep::Completed));
}

#[tokio::test]
async fn test_failed_migration_is_finished_by_reconciliation() {
    let catalogue = TestCatalogue::new();
    two_providers(&catalogue).await;
    catalogue.migration.set_failing(true);

    let outcome = catalogue
        .engine
        .services
        .change_provider("acme.compute", CATALOGUE, "globex", None, &admin())
        .await
        .unwrap();
    assert!(matches!(
        outcome.events[0].change,
        LifecycleChange::ResourceMoved { ref previous_id, .. } if previous_id == "acme.compute"
    ));

    let intents = catalogue.engine.moves.all().await;
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].step, MoveStep::OriginalRemoved);
    assert!(intents[0].last_error.is_some());

    // Still failing: the intent stays open
    let report = catalogue.engine.reconcile_moves().await.unwrap();
    assert_eq!(report.completed, 0);
    assert_eq!(report.still_pending, 1);

    catalogue.migration.set_failing(false);
    catalogue.tick();
    let report = catalogue.engine.reconcile_moves().await.unwrap();
    assert_eq!(
        report,
        ReconcileReport {
            completed: 1,
            abandoned: 0,
            still_pending: 0,
        }
    );
    assert_eq!(catalogue.migration.calls().await.len(), 1);

    // Nothing left to do
    assert_eq!(
        catalogue.engine.reconcile_moves().await.unwrap(),
        ReconcileReport::default()
    );
}

#[tokio::test]
async fn test_move_to_unknown_provider_is_refused() {
    let catalogue = TestCatalogue::new();
    two_providers(&catalogue).await;

    let err = catalogue
        .engine
        .services
        .change_provider("acme.compute", CATALOGUE, "nobody", None, &admin())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(catalogue.service("acme.compute").await.is_some());
    assert!(catalogue.engine.moves.all().await.is_empty());
}
