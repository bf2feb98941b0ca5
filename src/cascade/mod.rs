// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cascade Coordinator
//!
//! Propagates an activation or suspension change from a parent resource to
//! its sub-profiles (datasource, helpdesk, monitoring, interoperability
//! links). Every sub-profile kind is reached through a [`SubProfileCascade`];
//! each kind's outcome is recorded in a [`CascadeReport`] and a failure in
//! one kind never stops the others or the parent operation.
//!
//! Only sub-profiles that exist when the cascade runs are touched. One added
//! later keeps its own flags.

pub mod provider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::audit::{ActionType, AuditEntry, LogType};
use crate::domain::{Payload, ResourceKind, ResourceState};
use crate::events::{LifecycleChange, LifecycleEvent};
use crate::identity::Actor;
use crate::ports::{ResourceFilter, ResourceStore};

pub use provider::{OwnedResourceSuspension, ProviderSuspensionCoordinator, ProviderSuspensionReport};

/// Flags to push down to sub-profiles; `None` leaves a flag alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeTarget {
    pub active: Option<bool>,
    pub suspended: Option<bool>,
}

impl CascadeTarget {
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            suspended: None,
        }
    }

    pub fn suspended(suspended: bool) -> Self {
        Self {
            active: None,
            suspended: Some(suspended),
        }
    }
}

/// Result of the cascade for one sub-profile kind
#[derive(Debug, Clone, PartialEq)]
pub enum SiblingStatus {
    /// Every matching sub-profile was written (ids that actually changed)
    Applied { ids: Vec<String> },
    /// No sub-profile of this kind exists for the parent
    Absent,
    /// Lookup or at least one write failed; `applied` lists the writes that succeeded
    Failed { applied: Vec<String>, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiblingOutcome {
    pub kind: ResourceKind,
    pub status: SiblingStatus,
    /// Events for the sub-profiles that changed
    pub events: Vec<LifecycleEvent>,
}

impl SiblingOutcome {
    fn failed(kind: ResourceKind, error: String) -> Self {
        Self {
            kind,
            status: SiblingStatus::Failed {
                applied: Vec::new(),
                error,
            },
            events: Vec::new(),
        }
    }
}

/// Per-kind outcomes of one cascade run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeReport {
    pub outcomes: Vec<SiblingOutcome>,
}

impl CascadeReport {
    pub fn outcome(&self, kind: ResourceKind) -> Option<&SiblingOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, SiblingStatus::Failed { .. }))
    }

    /// Events of every sub-profile that changed
    pub fn events(&self) -> impl Iterator<Item = &LifecycleEvent> {
        self.outcomes.iter().flat_map(|o| o.events.iter())
    }

    /// Ids changed across all kinds
    pub fn applied_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .flat_map(|o| match &o.status {
                SiblingStatus::Applied { ids } | SiblingStatus::Failed { applied: ids, .. } => {
                    ids.iter().map(String::as_str).collect::<Vec<_>>()
                }
                SiblingStatus::Absent => Vec::new(),
            })
            .collect()
    }
}

/// Cascade for one sub-profile kind
#[async_trait]
pub trait SubProfileCascade: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Push `target` onto every existing sub-profile of `parent`
    async fn apply(
        &self,
        parent: &LifecycleEvent,
        target: CascadeTarget,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> SiblingOutcome;

    /// Delete every sub-profile of `parent`
    async fn remove(&self, parent: &LifecycleEvent, actor: &Actor, at: DateTime<Utc>) -> SiblingOutcome;
}

/// [`SubProfileCascade`] backed by a resource store
pub struct StoreCascade<P: Payload> {
    store: Arc<dyn ResourceStore<P>>,
}

impl<P: Payload> StoreCascade<P> {
    pub fn new(store: Arc<dyn ResourceStore<P>>) -> Self {
        Self { store }
    }

    fn children_of(parent: &LifecycleEvent) -> ResourceFilter {
        ResourceFilter::new()
            .in_catalogue(parent.catalogue_id.clone())
            .child_of(parent.resource_id.clone())
            .primaries()
    }
}

#[async_trait]
impl<P: Payload> SubProfileCascade for StoreCascade<P> {
    fn kind(&self) -> ResourceKind {
        P::KIND
    }

    async fn apply(
        &self,
        parent: &LifecycleEvent,
        target: CascadeTarget,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> SiblingOutcome {
        let children = match self.store.query(&Self::children_of(parent)).await {
            Ok(page) => page.results,
            Err(err) => return SiblingOutcome::failed(P::KIND, err.to_string()),
        };
        if children.is_empty() {
            return SiblingOutcome {
                kind: P::KIND,
                status: SiblingStatus::Absent,
                events: Vec::new(),
            };
        }

        let mut applied = Vec::new();
        let mut events = Vec::new();
        let mut errors = Vec::new();

        for mut child in children {
            let mut changes = Vec::new();

            if let Some(active) = target.active {
                // Pending or rejected sub-profiles are never switched on by their parent
                let eligible = !active || child.status == ResourceState::Approved;
                if child.active != active && eligible {
                    child.active = active;
                    child.record(AuditEntry::new(
                        LogType::Activation,
                        ActionType::activation(active),
                        actor,
                        at,
                        Some(format!("cascaded from {} '{}'", parent.resource_kind, parent.resource_id)),
                    ));
                    changes.push(LifecycleChange::ResourcePublished { active });
                }
            }
            if let Some(suspended) = target.suspended {
                if child.suspended != suspended {
                    child.suspended = suspended;
                    child.record(AuditEntry::new(
                        LogType::Activation,
                        ActionType::suspension(suspended),
                        actor,
                        at,
                        Some(format!("cascaded from {} '{}'", parent.resource_kind, parent.resource_id)),
                    ));
                    changes.push(LifecycleChange::ResourceSuspended { suspended });
                }
            }

            if changes.is_empty() {
                continue;
            }

            let id = child.id.clone();
            match self.store.update(child.clone()).await {
                Ok(_) => {
                    debug!(kind = P::KIND.as_str(), resource_id = %id, "Cascade applied");
                    events.extend(changes.into_iter().map(|change| {
                        LifecycleEvent::for_bundle(&child, actor, at, change).caused_by(parent)
                    }));
                    applied.push(id);
                }
                Err(err) => {
                    warn!(
                        kind = P::KIND.as_str(),
                        resource_id = %id,
                        parent_id = %parent.resource_id,
                        error = %err,
                        "Cascade write failed"
                    );
                    errors.push(format!("{id}: {err}"));
                }
            }
        }

        let status = if errors.is_empty() {
            SiblingStatus::Applied { ids: applied }
        } else {
            SiblingStatus::Failed {
                applied,
                error: errors.join("; "),
            }
        };
        SiblingOutcome {
            kind: P::KIND,
            status,
            events,
        }
    }

    async fn remove(&self, parent: &LifecycleEvent, actor: &Actor, at: DateTime<Utc>) -> SiblingOutcome {
        let children = match self.store.query(&Self::children_of(parent)).await {
            Ok(page) => page.results,
            Err(err) => return SiblingOutcome::failed(P::KIND, err.to_string()),
        };
        if children.is_empty() {
            return SiblingOutcome {
                kind: P::KIND,
                status: SiblingStatus::Absent,
                events: Vec::new(),
            };
        }

        let mut removed = Vec::new();
        let mut events = Vec::new();
        let mut errors = Vec::new();
        for child in children {
            match self.store.delete(&child.id, &child.catalogue_id).await {
                Ok(()) => {
                    events.push(
                        LifecycleEvent::for_bundle(&child, actor, at, LifecycleChange::ResourceDeleted)
                            .caused_by(parent),
                    );
                    removed.push(child.id);
                }
                Err(err) => {
                    warn!(
                        kind = P::KIND.as_str(),
                        resource_id = %child.id,
                        parent_id = %parent.resource_id,
                        error = %err,
                        "Cascade delete failed"
                    );
                    errors.push(format!("{}: {err}", child.id));
                }
            }
        }

        let status = if errors.is_empty() {
            SiblingStatus::Applied { ids: removed }
        } else {
            SiblingStatus::Failed {
                applied: removed,
                error: errors.join("; "),
            }
        };
        SiblingOutcome {
            kind: P::KIND,
            status,
            events,
        }
    }
}

/// Fans a parent change out to every registered sub-profile kind
#[derive(Clone, Default)]
pub struct CascadeCoordinator {
    cascades: Vec<Arc<dyn SubProfileCascade>>,
}

impl CascadeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cascade(mut self, cascade: Arc<dyn SubProfileCascade>) -> Self {
        self.cascades.push(cascade);
        self
    }

    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.cascades.iter().map(|c| c.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cascades.is_empty()
    }

    /// Apply `target` to all sub-profiles of the resource `parent` describes
    pub async fn apply(
        &self,
        parent: &LifecycleEvent,
        target: CascadeTarget,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> CascadeReport {
        let mut report = CascadeReport::default();
        for cascade in &self.cascades {
            report.outcomes.push(cascade.apply(parent, target, actor, at).await);
        }
        log_failures(parent, &report);
        report
    }

    /// Delete all sub-profiles of the resource `parent` describes
    pub async fn remove_dependents(
        &self,
        parent: &LifecycleEvent,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> CascadeReport {
        let mut report = CascadeReport::default();
        for cascade in &self.cascades {
            report.outcomes.push(cascade.remove(parent, actor, at).await);
        }
        log_failures(parent, &report);
        report
    }
}

fn log_failures(parent: &LifecycleEvent, report: &CascadeReport) {
    for outcome in &report.outcomes {
        if let SiblingStatus::Failed { error, .. } = &outcome.status {
            warn!(
                kind = outcome.kind.as_str(),
                parent_id = %parent.resource_id,
                catalogue_id = %parent.catalogue_id,
                error = %error,
                "Sub-profile cascade incomplete"
            );
        }
    }
}
