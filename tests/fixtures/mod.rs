// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for catalogue-lifecycle
//!
//! Deterministic catalogue setups for the integration tests.
//!
//! # Design Principles
//! - Time only moves through [`TestCatalogue::tick`] / the manual clock
//! - Providers and sub-profiles are seeded straight into the stores
//! - Resources under test go through the lifecycle managers

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use catalogue_lifecycle::adapters::memory::{ManualClock, RecordingMigration, RecordingNotifier};
use catalogue_lifecycle::config::{CatalogueConfig, RetryConfig};
use catalogue_lifecycle::domain::{
    Bundle, Datasource, Helpdesk, Monitoring, Provider, ResourceInteroperabilityRecord, ResourceState,
    Service, TemplateStatus, TrainingResource,
};
use catalogue_lifecycle::engine::CatalogueEngine;
use catalogue_lifecycle::identity::{Actor, InternalCapability, Role, UserIdentity};
use catalogue_lifecycle::ports::{Clock, ResourceStore};

pub const CATALOGUE: &str = "eosc";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn admin() -> Actor {
    UserIdentity::new("admin-1", "Ada Admin", "ada@catalogue.org", vec![Role::Admin]).into()
}

pub fn provider_admin() -> Actor {
    UserIdentity::new("pa-1", "Pat Provider", "pat@acme.org", vec![Role::ProviderAdmin]).into()
}

pub fn system() -> Actor {
    InternalCapability::issue("fixtures").into()
}

pub fn provider(id: &str, template_status: TemplateStatus) -> Provider {
    Provider {
        id: id.to_string(),
        name: id.to_uppercase(),
        abbreviation: id.to_string(),
        contacts: vec![format!("ops@{id}.org")],
        template_status,
    }
}

pub fn service(id: &str, owner: &str) -> Service {
    Service {
        id: id.to_string(),
        name: format!("Service {id}"),
        resource_organisation: owner.to_string(),
        version: None,
        description: None,
        webpage: None,
    }
}

pub fn datasource(id: &str, service_id: &str, owner: &str) -> Datasource {
    Datasource {
        id: id.to_string(),
        service_id: service_id.to_string(),
        resource_organisation: owner.to_string(),
        version: None,
        jurisdiction: None,
    }
}

pub fn training(id: &str, owner: &str) -> TrainingResource {
    TrainingResource {
        id: id.to_string(),
        title: format!("Training {id}"),
        resource_organisation: owner.to_string(),
        version: None,
        url: None,
    }
}

pub fn helpdesk(id: &str, service_id: &str) -> Helpdesk {
    Helpdesk {
        id: id.to_string(),
        service_id: service_id.to_string(),
        support_emails: vec!["help@acme.org".to_string()],
    }
}

pub fn monitoring(id: &str, service_id: &str) -> Monitoring {
    Monitoring {
        id: id.to_string(),
        service_id: service_id.to_string(),
        monitored_by: None,
    }
}

pub fn interoperability_link(id: &str, resource_id: &str) -> ResourceInteroperabilityRecord {
    ResourceInteroperabilityRecord {
        id: id.to_string(),
        resource_id: resource_id.to_string(),
        interoperability_record_ids: vec!["eosc.guideline.pid".to_string()],
    }
}

/// Engine over in-memory stores with recording collaborators and a manual clock
pub struct TestCatalogue {
    pub engine: CatalogueEngine,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub migration: Arc<RecordingMigration>,
}

impl TestCatalogue {
    pub fn new() -> Self {
        Self::with_retry(RetryConfig::default())
    }

    pub fn with_retry(retry: RetryConfig) -> Self {
        let clock = Arc::new(ManualClock::new(fixed_timestamp()));
        let notifier = Arc::new(RecordingNotifier::new());
        let migration = Arc::new(RecordingMigration::new());
        let config = CatalogueConfig {
            retry,
            ..CatalogueConfig::default()
        };
        let engine = CatalogueEngine::builder(config)
            .with_clock(clock.clone())
            .with_notifier(notifier.clone())
            .with_migration(migration.clone())
            .build();
        Self {
            engine,
            clock,
            notifier,
            migration,
        }
    }

    /// Move the clock forward one second
    pub fn tick(&self) {
        self.clock.advance(Duration::seconds(1));
    }

    /// Approved provider, active unless told otherwise
    pub async fn seed_provider(&self, id: &str, template: TemplateStatus, active: bool) -> Bundle<Provider> {
        let bundle = Bundle::new(
            provider(id, template),
            CATALOGUE,
            ResourceState::Approved,
            active,
            &admin(),
            self.clock.now(),
        );
        self.engine.stores.providers.add(bundle).await.expect("seed provider")
    }

    pub async fn seed_helpdesk(&self, id: &str, service_id: &str) -> Bundle<Helpdesk> {
        let bundle = Bundle::new(
            helpdesk(id, service_id),
            CATALOGUE,
            ResourceState::Approved,
            true,
            &admin(),
            self.clock.now(),
        );
        self.engine.stores.helpdesks.add(bundle).await.expect("seed helpdesk")
    }

    pub async fn seed_monitoring(&self, id: &str, service_id: &str) -> Bundle<Monitoring> {
        let bundle = Bundle::new(
            monitoring(id, service_id),
            CATALOGUE,
            ResourceState::Approved,
            true,
            &admin(),
            self.clock.now(),
        );
        self.engine.stores.monitorings.add(bundle).await.expect("seed monitoring")
    }

    pub async fn seed_interoperability_link(
        &self,
        id: &str,
        resource_id: &str,
        active: bool,
    ) -> Bundle<ResourceInteroperabilityRecord> {
        let bundle = Bundle::new(
            interoperability_link(id, resource_id),
            CATALOGUE,
            ResourceState::Approved,
            active,
            &admin(),
            self.clock.now(),
        );
        self.engine
            .stores
            .resource_interoperability_records
            .add(bundle)
            .await
            .expect("seed interoperability link")
    }

    pub async fn service(&self, id: &str) -> Option<Bundle<Service>> {
        self.engine.stores.services.get(id, CATALOGUE).await.expect("store read")
    }

    pub async fn provider(&self, id: &str) -> Bundle<Provider> {
        self.engine
            .stores
            .providers
            .get(id, CATALOGUE)
            .await
            .expect("store read")
            .expect("provider seeded")
    }
}
