// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Suspension Cascade
//!
//! Suspending a provider suspends every resource it owns; each resource's own
//! cascade then reaches its sub-profiles. Unsuspending reverses both levels.
//!
//! ```text
//! Provider ──▶ Service(s) ──▶ Datasource / Helpdesk / Monitoring / links
//!          ──▶ TrainingResource(s)
//!          ──▶ InteroperabilityRecord(s)
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{SiblingOutcome, SiblingStatus};
use crate::audit::{ActionType, AuditEntry, LogType};
use crate::dispatch::EventSink;
use crate::domain::invariants::ensure_suspension_toggles;
use crate::domain::{Bundle, Provider, ResourceKind};
use crate::errors::{CatalogueError, CatalogueResult};
use crate::events::{LifecycleChange, LifecycleEvent};
use crate::identity::Actor;
use crate::ports::{Clock, ResourceStore, SystemClock};
use crate::state_machine::StateInvariant;

/// A resource kind whose bundles follow their owner's suspension
#[async_trait]
pub trait OwnedResourceSuspension: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Set `suspended` on every primary bundle of `owner_id` whose flag differs
    ///
    /// Returned events are chained onto `parent`.
    async fn suspend_for_owner(
        &self,
        parent: &LifecycleEvent,
        owner_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<Vec<LifecycleEvent>>;
}

/// Outcome of a provider-level suspension
#[derive(Debug, Clone)]
pub struct ProviderSuspensionReport {
    pub provider: Bundle<Provider>,
    pub event: LifecycleEvent,
    pub outcomes: Vec<SiblingOutcome>,
}

impl ProviderSuspensionReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, SiblingStatus::Failed { .. }))
    }
}

/// Applies provider suspension to the provider and all owned resource kinds
pub struct ProviderSuspensionCoordinator {
    providers: Arc<dyn ResourceStore<Provider>>,
    owned: Vec<Arc<dyn OwnedResourceSuspension>>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl ProviderSuspensionCoordinator {
    pub fn new(providers: Arc<dyn ResourceStore<Provider>>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            providers,
            owned: Vec::new(),
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_owned(mut self, owned: Arc<dyn OwnedResourceSuspension>) -> Self {
        self.owned.push(owned);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Suspend or unsuspend a provider and everything it owns
    ///
    /// # Errors
    ///
    /// - `NotFound` if the provider does not exist
    /// - `Validation` if the provider flag already has the requested value
    ///
    /// Failures on owned resources are reported per kind and never undo the
    /// provider write.
    pub async fn suspend_provider(
        &self,
        provider_id: &str,
        catalogue_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<ProviderSuspensionReport> {
        let mut provider = self
            .providers
            .get(provider_id, catalogue_id)
            .await?
            .filter(|p| !p.is_public_mirror())
            .ok_or_else(|| CatalogueError::not_found(ResourceKind::Provider, provider_id, catalogue_id))?;
        ensure_suspension_toggles(provider.suspended, suspended, provider_id)?;

        let now = self.clock.now();
        provider.suspended = suspended;
        provider.record(AuditEntry::new(
            LogType::Activation,
            ActionType::suspension(suspended),
            actor,
            now,
            None,
        ));
        provider.check_invariants().map_err(CatalogueError::Validation)?;
        let provider = self.providers.update(provider).await?;

        let event = LifecycleEvent::for_bundle(
            &provider,
            actor,
            now,
            LifecycleChange::ResourceSuspended { suspended },
        );
        if let Err(err) = self.sink.publish(std::slice::from_ref(&event)).await {
            warn!(provider_id = %provider_id, error = %err, "Failed to enqueue provider event");
        }

        let mut outcomes = Vec::with_capacity(self.owned.len());
        for owned in &self.owned {
            let outcome = match owned.suspend_for_owner(&event, provider_id, suspended, actor).await {
                Ok(events) => {
                    let ids: Vec<String> = events
                        .iter()
                        .filter(|e| e.causation_id == Some(event.event_id))
                        .map(|e| e.resource_id.clone())
                        .collect();
                    let status = if ids.is_empty() {
                        SiblingStatus::Absent
                    } else {
                        SiblingStatus::Applied { ids }
                    };
                    SiblingOutcome {
                        kind: owned.kind(),
                        status,
                        events,
                    }
                }
                Err(err) => {
                    warn!(
                        kind = owned.kind().as_str(),
                        provider_id = %provider_id,
                        error = %err,
                        "Provider suspension did not reach owned resources"
                    );
                    SiblingOutcome {
                        kind: owned.kind(),
                        status: SiblingStatus::Failed {
                            applied: Vec::new(),
                            error: err.to_string(),
                        },
                        events: Vec::new(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        info!(
            provider_id = %provider_id,
            catalogue_id = %catalogue_id,
            suspended,
            "Provider suspension applied"
        );
        Ok(ProviderSuspensionReport {
            provider,
            event,
            outcomes,
        })
    }
}
