// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lifecycle Manager
//!
//! One manager per payload kind. All operations are keyed by
//! `(id, catalogue_id)`; public-mirror copies are never valid targets.
//!
//! # Transaction Semantics
//!
//! There is no cross-bundle transaction. Each operation:
//! 1. Loads the bundle (and its owner provider where rules need it)
//! 2. Validates preconditions and, for `verify`, the state machine
//! 3. Writes the bundle with its new audit entry
//! 4. Runs cascades; sibling failures are reported, not raised
//! 5. Hands events to the sink; sink failures are logged, not raised
//!
//! Writes after step 3 (owner template updates, move steps) can fail on
//! their own and are surfaced or journaled as documented per operation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::moves::{reconcile_step, MoveIntent, MoveJournal, MoveStep, ReconcileAction, ReconcileReport};
use super::LifecycleOutcome;
use crate::adapters::memory::InMemoryMoveJournal;
use crate::audit::{ActionType, AuditEntry, LogType};
use crate::cascade::{CascadeCoordinator, CascadeTarget, OwnedResourceSuspension};
use crate::dispatch::EventSink;
use crate::domain::invariants::{
    ensure_activation_eligible, ensure_audit_verdict, ensure_catalogue_change_allowed,
    ensure_deletable, ensure_movable, ensure_not_public_mirror, ensure_owner_onboarded,
    ensure_owner_unchanged, ensure_suspension_toggles, ensure_unsuspension_allowed,
    ensure_version_not_cleared,
};
use crate::domain::{Bundle, Provider, Relocatable, ResourceKind, ResourceState, TemplateStatus};
use crate::errors::{CatalogueError, CatalogueResult};
use crate::events::{LifecycleChange, LifecycleEvent};
use crate::identity::{Actor, InternalCapability};
use crate::ports::{
    Clock, MigrationCollaborator, ResourceFilter, ResourceStore, StateRegistry, SystemClock,
    VocabularyGateway,
};
use crate::state_machine::{StateInvariant, StateMachine, VerifyCommand};

/// Key a moved resource gets under its new owner
///
/// The local suffix is what follows `"{old_owner}."`; ids without that prefix
/// keep the part after their last dot.
///
/// ```rust
/// use catalogue_lifecycle::lifecycle::manager::moved_id;
///
/// assert_eq!(moved_id("acme.compute", Some("acme"), "globex"), "globex.compute");
/// assert_eq!(moved_id("legacy.x.compute", Some("acme"), "globex"), "globex.compute");
/// ```
pub fn moved_id(id: &str, old_owner: Option<&str>, new_owner: &str) -> String {
    let suffix = old_owner
        .and_then(|owner| id.strip_prefix(owner))
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or_else(|| id.rsplit('.').next().unwrap_or(id));
    format!("{new_owner}.{suffix}")
}

/// Lifecycle operations for one relocatable payload kind
pub struct LifecycleManager<P: Relocatable> {
    resources: Arc<dyn ResourceStore<P>>,
    providers: Arc<dyn ResourceStore<Provider>>,
    vocabulary: Arc<dyn VocabularyGateway>,
    registry: StateRegistry,
    cascade: CascadeCoordinator,
    migration: Option<Arc<dyn MigrationCollaborator>>,
    moves: Arc<dyn MoveJournal>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl<P: Relocatable> LifecycleManager<P> {
    /// Manager with no cascades, no migration collaborator, an in-memory
    /// move journal and the system clock
    pub fn new(
        resources: Arc<dyn ResourceStore<P>>,
        providers: Arc<dyn ResourceStore<Provider>>,
        vocabulary: Arc<dyn VocabularyGateway>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            resources,
            providers,
            vocabulary,
            registry: StateRegistry::new(),
            cascade: CascadeCoordinator::new(),
            migration: None,
            moves: Arc::new(InMemoryMoveJournal::new()),
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_cascade(mut self, cascade: CascadeCoordinator) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn with_migration(mut self, migration: Arc<dyn MigrationCollaborator>) -> Self {
        self.migration = Some(migration);
        self
    }

    pub fn with_move_journal(mut self, moves: Arc<dyn MoveJournal>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        P::KIND
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Bundle at `(id, catalogue_id)`
    pub async fn get(&self, id: &str, catalogue_id: &str) -> CatalogueResult<Bundle<P>> {
        self.resources
            .get(id, catalogue_id)
            .await?
            .ok_or_else(|| CatalogueError::not_found(P::KIND, id, catalogue_id))
    }

    /// Audit entries, newest first
    pub async fn audit_history(&self, id: &str, catalogue_id: &str) -> CatalogueResult<Vec<AuditEntry>> {
        Ok(self.get(id, catalogue_id).await?.audit.history_newest_first())
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Onboard a new resource
    ///
    /// Approved and active right away when the owner's template is approved,
    /// pending and inactive otherwise. An empty payload id is replaced by
    /// `"{owner}.{uuid}"`.
    ///
    /// # Errors
    ///
    /// - `Validation` if the owner is missing or not approved, or a template
    ///   kind is submitted while the owner already has one awaiting approval
    /// - `Conflict` if the id is taken
    pub async fn add(&self, mut payload: P, catalogue_id: &str, actor: &Actor) -> CatalogueResult<LifecycleOutcome<P>> {
        let owner_id = payload
            .owner_id()
            .map(str::to_string)
            .ok_or_else(|| CatalogueError::Validation(format!("{} payload names no owner", P::KIND)))?;

        let mut provider = self
            .providers
            .get(&owner_id, catalogue_id)
            .await?
            .filter(|p| !p.is_public_mirror())
            .ok_or_else(|| {
                CatalogueError::Validation(format!(
                    "provider '{owner_id}' does not exist in catalogue '{catalogue_id}'"
                ))
            })?;
        ensure_owner_onboarded(&provider)?;

        let template = provider.payload.template_status;
        let template_kind = P::KIND.is_template_kind();
        if template_kind && template == TemplateStatus::Pending {
            let pending = self
                .resources
                .query(
                    &ResourceFilter::new()
                        .in_catalogue(catalogue_id)
                        .owned_by(owner_id.clone())
                        .with_status(ResourceState::Pending)
                        .primaries()
                        .page(0, 1),
                )
                .await?;
            if pending.total > 0 {
                return Err(CatalogueError::Validation(format!(
                    "provider '{owner_id}' already has a {} awaiting template approval",
                    P::KIND
                )));
            }
        }

        if payload.id().is_empty() {
            payload.set_id(format!("{owner_id}.{}", Uuid::now_v7().simple()));
        }

        let now = self.clock.now();
        let approved = template == TemplateStatus::Approved;
        let status = if approved {
            ResourceState::Approved
        } else {
            ResourceState::Pending
        };

        let mut bundle = Bundle::new(payload, catalogue_id, status, approved, actor, now);
        bundle.record(AuditEntry::new(LogType::Onboard, ActionType::Registered, actor, now, None));
        if approved {
            bundle.record(AuditEntry::new(LogType::Onboard, ActionType::Approved, actor, now, None));
        }
        Self::checked(&bundle)?;
        let bundle = self.resources.add(bundle).await?;

        if template_kind && !approved && template != TemplateStatus::Pending {
            provider.payload.template_status = TemplateStatus::Pending;
            provider.touch(actor, now);
            self.providers.update(provider).await?;
            debug!(provider_id = %owner_id, "Provider template now pending");
        }

        info!(
            kind = P::KIND.as_str(),
            resource_id = %bundle.id,
            catalogue_id = %catalogue_id,
            status = %status,
            "Resource onboarded"
        );
        let events = vec![LifecycleEvent::for_bundle(
            &bundle,
            actor,
            now,
            LifecycleChange::ResourceOnboarded {
                status,
                active: approved,
            },
        )];
        self.emit(&events).await;
        Ok(LifecycleOutcome::new(bundle, events))
    }

    /// Replace the payload of an existing resource
    ///
    /// A bundle not found in `catalogue_id` is looked up across catalogues;
    /// a privileged actor then relocates it into `catalogue_id`. Relocation
    /// adds the new copy before removing the old one; if the removal fails
    /// the new copy is removed again and the error returned, with no events.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no primary with this id exists
    /// - `Validation` for mirrors, non-privileged catalogue changes, removed
    ///   versions and owner changes
    pub async fn update(
        &self,
        payload: P,
        catalogue_id: &str,
        comment: Option<String>,
        actor: &Actor,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        let id = payload.id().to_string();
        let existing = match self.resources.get(&id, catalogue_id).await? {
            Some(bundle) => bundle,
            None => self
                .resources
                .query(&ResourceFilter::new().with_id(id.clone()).primaries())
                .await?
                .results
                .into_iter()
                .next()
                .ok_or_else(|| CatalogueError::not_found(P::KIND, &id, catalogue_id))?,
        };

        ensure_not_public_mirror(&existing)?;
        ensure_catalogue_change_allowed(&existing.catalogue_id, catalogue_id, actor)?;
        ensure_version_not_cleared(existing.payload.version(), payload.version())?;
        ensure_owner_unchanged(existing.owner_id(), payload.owner_id())?;

        let relocated = existing.catalogue_id != catalogue_id;
        if !relocated && existing.payload == payload {
            debug!(kind = P::KIND.as_str(), resource_id = %id, "Update carries no change");
            return Ok(LifecycleOutcome::unchanged(existing));
        }

        let version_changed = existing.payload.version() != payload.version();
        let previous_catalogue = existing.catalogue_id.clone();
        let now = self.clock.now();

        let mut bundle = existing;
        bundle.payload = payload;
        bundle.catalogue_id = catalogue_id.to_string();
        let action = if version_changed {
            ActionType::UpdatedVersion
        } else {
            ActionType::Updated
        };
        bundle.record(AuditEntry::new(LogType::Update, action, actor, now, comment.clone()));
        Self::checked(&bundle)?;

        let bundle = if relocated {
            let added = self.resources.add(bundle).await?;
            if let Err(err) = self.resources.delete(&id, &previous_catalogue).await {
                // Take the new copy back out so the id stays in one catalogue
                if let Err(rollback) = self.resources.delete(&id, catalogue_id).await {
                    error!(
                        kind = P::KIND.as_str(),
                        resource_id = %id,
                        from = %previous_catalogue,
                        to = %catalogue_id,
                        error = %rollback,
                        "Relocation rollback failed, resource exists in both catalogues"
                    );
                }
                return Err(err);
            }
            info!(
                kind = P::KIND.as_str(),
                resource_id = %id,
                from = %previous_catalogue,
                to = %catalogue_id,
                "Resource relocated"
            );
            added
        } else {
            self.resources.update(bundle).await?
        };

        let updated = LifecycleEvent::for_bundle(
            &bundle,
            actor,
            now,
            LifecycleChange::ResourceUpdated {
                version_changed,
                comment,
                after_invalid_audit: bundle.audit.updated_after_invalid_audit(),
            },
        );
        let mut events = Vec::with_capacity(2);
        if relocated {
            let mut removed =
                LifecycleEvent::for_bundle(&bundle, actor, now, LifecycleChange::ResourceDeleted)
                    .caused_by(&updated);
            removed.catalogue_id = previous_catalogue;
            events.push(updated);
            events.push(removed);
        } else {
            events.push(updated);
        }

        self.emit(&events).await;
        Ok(LifecycleOutcome::new(bundle, events))
    }

    /// Set the onboarding status from a vocabulary term
    ///
    /// Approval applies `active`; rejection and return to pending force
    /// `active = false`. For template kinds the owner's template status
    /// follows, written after the resource.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bundle is absent
    /// - `Validation` for unknown or foreign terms and invalid transitions
    /// - owner template write errors, after the resource was already saved
    pub async fn verify(
        &self,
        id: &str,
        catalogue_id: &str,
        status_term: &str,
        active: bool,
        actor: &Actor,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        let mut bundle = self.load_primary(id, catalogue_id).await?;
        let target = self
            .registry
            .resolve(self.vocabulary.as_ref(), P::KIND, status_term)
            .await?;
        let (next, output) = bundle.status.transition(&VerifyCommand::toward(target))?;
        for warning in &output.warnings {
            if output.is_critical {
                warn!(kind = P::KIND.as_str(), resource_id = %id, %warning, "Critical verification");
            } else {
                debug!(kind = P::KIND.as_str(), resource_id = %id, %warning, "Verification note");
            }
        }

        let now = self.clock.now();
        let was_active = bundle.active;
        bundle.status = next;
        match next {
            ResourceState::Approved => {
                bundle.active = active;
                bundle.record(AuditEntry::new(LogType::Onboard, ActionType::Approved, actor, now, None));
            }
            ResourceState::Rejected => {
                bundle.active = false;
                bundle.record(AuditEntry::new(LogType::Onboard, ActionType::Rejected, actor, now, None));
            }
            ResourceState::Pending => {
                bundle.active = false;
                bundle.touch(actor, now);
            }
        }
        Self::checked(&bundle)?;
        let bundle = self.resources.update(bundle).await?;

        let event = LifecycleEvent::for_bundle(
            &bundle,
            actor,
            now,
            LifecycleChange::ResourceVerified {
                status: next,
                active: bundle.active,
            },
        );
        let now_active = bundle.active;
        let mut outcome = LifecycleOutcome::new(bundle, vec![event.clone()]);
        if was_active != now_active && !self.cascade.is_empty() {
            let report = self
                .cascade
                .apply(&event, CascadeTarget::active(now_active), actor, now)
                .await;
            outcome = outcome.with_cascade(report);
        }
        self.emit(&outcome.events).await;

        info!(
            kind = P::KIND.as_str(),
            resource_id = %id,
            catalogue_id = %catalogue_id,
            status = %next,
            active = now_active,
            "Resource verified"
        );

        if P::KIND.is_template_kind() {
            self.sync_owner_template(&outcome.bundle, next, actor).await?;
        }
        Ok(outcome)
    }

    /// Activate or deactivate a resource and its sub-profiles
    ///
    /// # Errors
    ///
    /// `Conflict` when activating a resource that is not approved, is
    /// suspended, or whose owner is not approved and active.
    pub async fn publish(
        &self,
        id: &str,
        catalogue_id: &str,
        active: bool,
        actor: &Actor,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        let mut bundle = self.load_primary(id, catalogue_id).await?;
        if active {
            let owner = self.owner_of(&bundle).await?;
            ensure_activation_eligible(&bundle, owner.as_ref())?;
        }

        let now = self.clock.now();
        bundle.active = active;
        bundle.record(AuditEntry::new(
            LogType::Activation,
            ActionType::activation(active),
            actor,
            now,
            None,
        ));
        Self::checked(&bundle)?;
        let bundle = self.resources.update(bundle).await?;

        let event = LifecycleEvent::for_bundle(
            &bundle,
            actor,
            now,
            LifecycleChange::ResourcePublished { active },
        );
        let report = self
            .cascade
            .apply(&event, CascadeTarget::active(active), actor, now)
            .await;
        let outcome = LifecycleOutcome::new(bundle, vec![event]).with_cascade(report);
        self.emit(&outcome.events).await;

        info!(
            kind = P::KIND.as_str(),
            resource_id = %id,
            catalogue_id = %catalogue_id,
            active,
            "Resource activation changed"
        );
        Ok(outcome)
    }

    /// Suspend or unsuspend a resource and its sub-profiles
    ///
    /// # Errors
    ///
    /// - `Validation` if the flag already has the requested value
    /// - `Conflict` when unsuspending while the owner provider is suspended
    pub async fn suspend(
        &self,
        id: &str,
        catalogue_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        let bundle = self.load_primary(id, catalogue_id).await?;
        ensure_suspension_toggles(bundle.suspended, suspended, id)?;
        let owner = self.owner_of(&bundle).await?;
        ensure_unsuspension_allowed(owner.as_ref(), suspended)?;

        self.apply_suspension(bundle, suspended, actor, None).await
    }

    /// Record an explicit audit verdict
    ///
    /// # Errors
    ///
    /// `Validation` unless `action` is VALID, INVALID or APPROVED.
    pub async fn audit(
        &self,
        id: &str,
        catalogue_id: &str,
        comment: Option<String>,
        action: ActionType,
        actor: &Actor,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        ensure_audit_verdict(action)?;
        let mut bundle = self.load_primary(id, catalogue_id).await?;

        let now = self.clock.now();
        bundle.record(AuditEntry::new(LogType::Audit, action, actor, now, comment.clone()));
        Self::checked(&bundle)?;
        let bundle = self.resources.update(bundle).await?;

        let events = vec![LifecycleEvent::for_bundle(
            &bundle,
            actor,
            now,
            LifecycleChange::ResourceAudited { action, comment },
        )];
        self.emit(&events).await;
        info!(kind = P::KIND.as_str(), resource_id = %id, action = %action, "Resource audited");
        Ok(LifecycleOutcome::new(bundle, events))
    }

    /// Move an approved resource to another provider of the same catalogue
    ///
    /// The resource is re-keyed `"{new_owner}.{suffix}"`. Steps are journaled;
    /// see [`super::moves`].
    ///
    /// # Errors
    ///
    /// - `Validation` if the resource is not approved, already belongs to
    ///   `new_owner_id`, or the new owner lives in another catalogue
    /// - `NotFound` if the new owner exists nowhere
    /// - `Conflict` if the new id is taken
    /// - `MoveIncomplete` if the old id could not be removed after the new
    ///   copy was written; [`Self::reconcile_moves`] finishes the move
    pub async fn change_provider(
        &self,
        id: &str,
        catalogue_id: &str,
        new_owner_id: &str,
        comment: Option<String>,
        actor: &Actor,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        let bundle = self.load_primary(id, catalogue_id).await?;
        ensure_movable(&bundle)?;

        let old_owner = bundle.owner_id().map(str::to_string);
        if old_owner.as_deref() == Some(new_owner_id) {
            return Err(CatalogueError::Validation(format!(
                "'{id}' is already owned by '{new_owner_id}'"
            )));
        }
        self.ensure_provider_in_catalogue(new_owner_id, catalogue_id).await?;

        let new_id = moved_id(id, old_owner.as_deref(), new_owner_id);
        if self.resources.get(&new_id, catalogue_id).await?.is_some() {
            return Err(CatalogueError::Conflict(format!(
                "{} '{new_id}' already exists in catalogue '{catalogue_id}'",
                P::KIND
            )));
        }

        let now = self.clock.now();
        let mut moved = bundle;
        moved.rekey(new_id.clone());
        moved.payload.set_owner_id(new_owner_id.to_string());
        moved.record(AuditEntry::new(LogType::Move, ActionType::Moved, actor, now, comment.clone()));
        Self::checked(&moved)?;

        let mut intent = MoveIntent::new(
            P::KIND,
            id,
            new_id.clone(),
            catalogue_id,
            old_owner.clone(),
            new_owner_id,
            comment.clone(),
            now,
        );
        self.moves.record(&intent).await?;

        let moved = match self.resources.add(moved).await {
            Ok(moved) => moved,
            Err(err) => {
                intent.abandon(err.to_string(), self.clock.now());
                self.journal(&intent).await;
                return Err(err);
            }
        };
        intent.advance(MoveStep::Added, self.clock.now());
        self.journal(&intent).await;

        if let Err(err) = self.resources.delete(id, catalogue_id).await {
            intent.fail(err.to_string(), self.clock.now());
            self.journal(&intent).await;
            warn!(
                intent_id = %intent.intent_id,
                old_id = %id,
                new_id = %new_id,
                error = %err,
                "Ownership move stopped after adding the new copy"
            );
            return Err(CatalogueError::MoveIncomplete {
                intent_id: intent.intent_id,
                reason: format!("'{id}' could not be removed: {err}"),
            });
        }
        intent.advance(MoveStep::OriginalRemoved, self.clock.now());
        intent.announced = true;
        self.finish_move(&mut intent).await;
        self.journal(&intent).await;

        let events = vec![LifecycleEvent::for_bundle(
            &moved,
            actor,
            now,
            LifecycleChange::ResourceMoved {
                previous_id: id.to_string(),
                previous_owner_id: old_owner,
                comment,
            },
        )];
        self.emit(&events).await;

        info!(
            kind = P::KIND.as_str(),
            old_id = %id,
            new_id = %new_id,
            catalogue_id = %catalogue_id,
            step = ?intent.step,
            "Resource changed provider"
        );
        Ok(LifecycleOutcome::new(moved, events))
    }

    /// Drive every unfinished move of this kind to completion or abandonment
    pub async fn reconcile_moves(&self, capability: &InternalCapability) -> CatalogueResult<ReconcileReport> {
        let actor = Actor::System(capability.clone());
        let mut report = ReconcileReport::default();

        for mut intent in self.moves.unfinished(P::KIND).await? {
            match self.reconcile_one(&mut intent, &actor).await {
                Ok(MoveStep::Completed) => report.completed += 1,
                Ok(MoveStep::Abandoned) => report.abandoned += 1,
                Ok(_) => report.still_pending += 1,
                Err(err) => {
                    warn!(intent_id = %intent.intent_id, error = %err, "Move reconciliation failed");
                    intent.fail(err.to_string(), self.clock.now());
                    self.journal(&intent).await;
                    report.still_pending += 1;
                }
            }
        }

        if report != ReconcileReport::default() {
            info!(kind = P::KIND.as_str(), ?report, "Move reconciliation pass complete");
        }
        Ok(report)
    }

    /// Delete a resource that is not live, with its sub-profiles
    ///
    /// # Errors
    ///
    /// - `Validation` for mirrors
    /// - `Conflict` while the resource is approved and active
    pub async fn delete(&self, id: &str, catalogue_id: &str, actor: &Actor) -> CatalogueResult<LifecycleOutcome<P>> {
        let bundle = self.load_primary(id, catalogue_id).await?;
        ensure_deletable(&bundle)?;

        self.resources.delete(id, catalogue_id).await?;

        let now = self.clock.now();
        let event = LifecycleEvent::for_bundle(&bundle, actor, now, LifecycleChange::ResourceDeleted);
        let report = self.cascade.remove_dependents(&event, actor, now).await;
        let outcome = LifecycleOutcome::new(bundle, vec![event]).with_cascade(report);
        self.emit(&outcome.events).await;

        info!(kind = P::KIND.as_str(), resource_id = %id, catalogue_id = %catalogue_id, "Resource deleted");
        Ok(outcome)
    }

    /// Set `suspended` on every primary of `owner_id` whose flag differs
    ///
    /// Per-resource failures are logged and skipped.
    pub async fn suspend_owned(
        &self,
        owner_id: &str,
        catalogue_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<Vec<LifecycleOutcome<P>>> {
        self.suspend_owned_from(None, owner_id, catalogue_id, suspended, actor)
            .await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_primary(&self, id: &str, catalogue_id: &str) -> CatalogueResult<Bundle<P>> {
        let bundle = self.get(id, catalogue_id).await?;
        ensure_not_public_mirror(&bundle)?;
        Ok(bundle)
    }

    async fn owner_of(&self, bundle: &Bundle<P>) -> CatalogueResult<Option<Bundle<Provider>>> {
        match bundle.owner_id() {
            Some(owner) => self.providers.get(owner, &bundle.catalogue_id).await,
            None => Ok(None),
        }
    }

    fn checked(bundle: &Bundle<P>) -> CatalogueResult<()> {
        bundle.check_invariants().map_err(|violation| {
            CatalogueError::Validation(format!("{} '{}': {violation}", P::KIND, bundle.id))
        })
    }

    async fn emit(&self, events: &[LifecycleEvent]) {
        if events.is_empty() {
            return;
        }
        if let Err(err) = self.sink.publish(events).await {
            warn!(
                kind = P::KIND.as_str(),
                events = events.len(),
                error = %err,
                "Failed to enqueue lifecycle events"
            );
        }
    }

    async fn journal(&self, intent: &MoveIntent) {
        if let Err(err) = self.moves.update(intent).await {
            warn!(intent_id = %intent.intent_id, error = %err, "Failed to journal move step");
        }
    }

    async fn apply_suspension(
        &self,
        mut bundle: Bundle<P>,
        suspended: bool,
        actor: &Actor,
        parent: Option<&LifecycleEvent>,
    ) -> CatalogueResult<LifecycleOutcome<P>> {
        let now = self.clock.now();
        bundle.suspended = suspended;
        bundle.record(AuditEntry::new(
            LogType::Activation,
            ActionType::suspension(suspended),
            actor,
            now,
            None,
        ));
        Self::checked(&bundle)?;
        let bundle = self.resources.update(bundle).await?;

        let mut event = LifecycleEvent::for_bundle(
            &bundle,
            actor,
            now,
            LifecycleChange::ResourceSuspended { suspended },
        );
        if let Some(parent) = parent {
            event = event.caused_by(parent);
        }
        let report = self
            .cascade
            .apply(&event, CascadeTarget::suspended(suspended), actor, now)
            .await;
        let outcome = LifecycleOutcome::new(bundle, vec![event]).with_cascade(report);
        self.emit(&outcome.events).await;

        info!(
            kind = P::KIND.as_str(),
            resource_id = %outcome.bundle.id,
            catalogue_id = %outcome.bundle.catalogue_id,
            suspended,
            "Resource suspension changed"
        );
        Ok(outcome)
    }

    async fn suspend_owned_from(
        &self,
        parent: Option<&LifecycleEvent>,
        owner_id: &str,
        catalogue_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<Vec<LifecycleOutcome<P>>> {
        let owned = self
            .resources
            .query(
                &ResourceFilter::new()
                    .in_catalogue(catalogue_id)
                    .owned_by(owner_id)
                    .suspended(!suspended)
                    .primaries(),
            )
            .await?;

        let mut outcomes = Vec::with_capacity(owned.results.len());
        for bundle in owned.results {
            let id = bundle.id.clone();
            match self.apply_suspension(bundle, suspended, actor, parent).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!(
                    kind = P::KIND.as_str(),
                    resource_id = %id,
                    owner_id = %owner_id,
                    error = %err,
                    "Owner suspension not applied"
                ),
            }
        }
        Ok(outcomes)
    }

    async fn sync_owner_template(
        &self,
        bundle: &Bundle<P>,
        state: ResourceState,
        actor: &Actor,
    ) -> CatalogueResult<()> {
        let Some(owner_id) = bundle.owner_id() else {
            return Ok(());
        };
        let mut provider = self
            .providers
            .get(owner_id, &bundle.catalogue_id)
            .await?
            .ok_or_else(|| CatalogueError::not_found(ResourceKind::Provider, owner_id, &bundle.catalogue_id))?;

        let template = TemplateStatus::after_verification(state);
        if provider.payload.template_status == template {
            return Ok(());
        }
        provider.payload.template_status = template;
        provider.touch(actor, self.clock.now());
        self.providers.update(provider).await?;
        debug!(provider_id = %owner_id, template = %template, "Provider template status updated");
        Ok(())
    }

    async fn ensure_provider_in_catalogue(&self, provider_id: &str, catalogue_id: &str) -> CatalogueResult<()> {
        let local = self
            .providers
            .get(provider_id, catalogue_id)
            .await?
            .filter(|p| !p.is_public_mirror());
        if local.is_some() {
            return Ok(());
        }

        let elsewhere = self
            .providers
            .query(&ResourceFilter::new().with_id(provider_id).primaries().page(0, 1))
            .await?;
        if elsewhere.total > 0 {
            Err(CatalogueError::Validation(format!(
                "provider '{provider_id}' belongs to another catalogue than '{catalogue_id}'"
            )))
        } else {
            Err(CatalogueError::not_found(ResourceKind::Provider, provider_id, catalogue_id))
        }
    }

    /// Rewrite references and complete the intent; false leaves it at `OriginalRemoved`
    async fn finish_move(&self, intent: &mut MoveIntent) -> bool {
        if let Some(migration) = &self.migration {
            if let Err(err) = migration
                .rewrite_references(&intent.old_id, &intent.new_id, &intent.catalogue_id)
                .await
            {
                warn!(
                    intent_id = %intent.intent_id,
                    old_id = %intent.old_id,
                    new_id = %intent.new_id,
                    error = %err,
                    "Reference migration failed; move left for reconciliation"
                );
                intent.fail(err.to_string(), self.clock.now());
                return false;
            }
        }
        intent.advance(MoveStep::Completed, self.clock.now());
        true
    }

    async fn reconcile_one(&self, intent: &mut MoveIntent, actor: &Actor) -> CatalogueResult<MoveStep> {
        // At most: delete original, then rewrite references
        for _ in 0..3 {
            let old_exists = self.resources.get(&intent.old_id, &intent.catalogue_id).await?.is_some();
            let new_exists = self.resources.get(&intent.new_id, &intent.catalogue_id).await?.is_some();

            match reconcile_step(intent, old_exists, new_exists) {
                ReconcileAction::Nothing => break,
                ReconcileAction::Abandon => {
                    intent.abandon("moved copy not found", self.clock.now());
                    self.journal(intent).await;
                    info!(intent_id = %intent.intent_id, old_id = %intent.old_id, "Move abandoned");
                    break;
                }
                ReconcileAction::DeleteOriginal => {
                    self.resources.delete(&intent.old_id, &intent.catalogue_id).await?;
                    intent.advance(MoveStep::OriginalRemoved, self.clock.now());
                    self.journal(intent).await;
                }
                ReconcileAction::RewriteReferences => {
                    if intent.step != MoveStep::OriginalRemoved {
                        intent.advance(MoveStep::OriginalRemoved, self.clock.now());
                    }
                    let completed = self.finish_move(intent).await;
                    if completed && !intent.announced {
                        if let Some(moved) = self.resources.get(&intent.new_id, &intent.catalogue_id).await? {
                            let events = vec![LifecycleEvent::for_bundle(
                                &moved,
                                actor,
                                self.clock.now(),
                                LifecycleChange::ResourceMoved {
                                    previous_id: intent.old_id.clone(),
                                    previous_owner_id: intent.old_owner.clone(),
                                    comment: intent.comment.clone(),
                                },
                            )];
                            self.emit(&events).await;
                        }
                        intent.announced = true;
                    }
                    self.journal(intent).await;
                    if completed {
                        info!(intent_id = %intent.intent_id, new_id = %intent.new_id, "Move completed");
                    }
                    break;
                }
            }
        }
        Ok(intent.step)
    }
}

#[async_trait]
impl<P: Relocatable> OwnedResourceSuspension for LifecycleManager<P> {
    fn kind(&self) -> ResourceKind {
        P::KIND
    }

    async fn suspend_for_owner(
        &self,
        parent: &LifecycleEvent,
        owner_id: &str,
        suspended: bool,
        actor: &Actor,
    ) -> CatalogueResult<Vec<LifecycleEvent>> {
        let outcomes = self
            .suspend_owned_from(Some(parent), owner_id, &parent.catalogue_id, suspended, actor)
            .await?;
        Ok(outcomes.into_iter().flat_map(|outcome| outcome.events).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        CollectingSink, InMemoryResourceStore, ManualClock, RecordingMigration, StaticVocabulary,
    };
    use crate::domain::Service;
    use crate::identity::{Role, UserIdentity};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const CAT: &str = "eosc";

    struct Harness {
        providers: Arc<InMemoryResourceStore<Provider>>,
        services: Arc<InMemoryResourceStore<Service>>,
        sink: Arc<CollectingSink>,
        migration: Arc<RecordingMigration>,
        clock: Arc<ManualClock>,
        manager: LifecycleManager<Service>,
    }

    fn admin() -> Actor {
        UserIdentity::new("admin-1", "Ada", "ada@example.org", vec![Role::Admin]).into()
    }

    fn provider_admin() -> Actor {
        UserIdentity::new("pa-1", "Pat", "pat@acme.org", vec![Role::ProviderAdmin]).into()
    }

    fn service(id: &str, owner: &str) -> Service {
        Service {
            id: id.to_string(),
            name: "Compute".to_string(),
            resource_organisation: owner.to_string(),
            version: None,
            description: None,
            webpage: None,
        }
    }

    fn provider(id: &str, template_status: TemplateStatus) -> Provider {
        Provider {
            id: id.to_string(),
            name: id.to_uppercase(),
            abbreviation: id.to_string(),
            contacts: vec![format!("ops@{id}.org")],
            template_status,
        }
    }

    async fn harness(template: TemplateStatus) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let providers = Arc::new(InMemoryResourceStore::new());
        for (id, template) in [("acme", template), ("globex", TemplateStatus::Approved)] {
            providers
                .add(Bundle::new(provider(id, template), CAT, ResourceState::Approved, true, &admin(), clock.now()))
                .await
                .unwrap();
        }
        let services = Arc::new(InMemoryResourceStore::new());
        let sink = Arc::new(CollectingSink::new());
        let migration = Arc::new(RecordingMigration::new());
        let manager = LifecycleManager::new(
            services.clone(),
            providers.clone(),
            Arc::new(StaticVocabulary::with_catalogue_defaults()),
            sink.clone(),
        )
        .with_clock(clock.clone())
        .with_migration(migration.clone());

        Harness {
            providers,
            services,
            sink,
            migration,
            clock,
            manager,
        }
    }

    #[test_case("acme.compute", Some("acme"), "globex", "globex.compute" ; "owner prefix")]
    #[test_case("acme.eu.compute", Some("acme"), "globex", "globex.eu.compute" ; "dotted suffix")]
    #[test_case("legacy-compute", Some("acme"), "globex", "globex.legacy-compute" ; "no dot")]
    #[test_case("other.compute", None, "globex", "globex.compute" ; "no old owner")]
    fn test_moved_id(id: &str, old_owner: Option<&str>, new_owner: &str, expected: &str) {
        assert_eq!(moved_id(id, old_owner, new_owner), expected);
    }

    #[tokio::test]
    async fn test_add_with_approved_template_goes_live() {
        let h = harness(TemplateStatus::Approved).await;
        let outcome = h.manager.add(service("acme.compute", "acme"), CAT, &provider_admin()).await.unwrap();

        assert_eq!(outcome.bundle.status, ResourceState::Approved);
        assert!(outcome.bundle.active);
        let actions: Vec<_> = outcome.bundle.audit.entries().iter().map(|e| e.action_type).collect();
        assert_eq!(actions, vec![ActionType::Registered, ActionType::Approved]);
        assert_eq!(h.sink.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_generates_id_under_owner() {
        let h = harness(TemplateStatus::Approved).await;
        let outcome = h.manager.add(service("", "acme"), CAT, &provider_admin()).await.unwrap();
        assert!(outcome.bundle.id.starts_with("acme."));
        assert_eq!(outcome.bundle.payload.id, outcome.bundle.id);
    }

    #[tokio::test]
    async fn test_template_gate() {
        let h = harness(TemplateStatus::NoTemplate).await;
        let first = h.manager.add(service("acme.one", "acme"), CAT, &provider_admin()).await.unwrap();
        assert_eq!(first.bundle.status, ResourceState::Pending);
        assert!(!first.bundle.active);

        let owner = h.providers.get("acme", CAT).await.unwrap().unwrap();
        assert_eq!(owner.payload.template_status, TemplateStatus::Pending);

        let err = h
            .manager
            .add(service("acme.two", "acme"), CAT, &provider_admin())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(h.services.get("acme.two", CAT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_requires_known_owner() {
        let h = harness(TemplateStatus::Approved).await;
        let err = h.manager.add(service("nobody.x", "nobody"), CAT, &admin()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_update_rules() {
        let h = harness(TemplateStatus::Approved).await;
        let mut payload = service("acme.compute", "acme");
        payload.version = Some("1.0".to_string());
        h.manager.add(payload.clone(), CAT, &admin()).await.unwrap();
        h.sink.take().await;

        let unchanged = h.manager.update(payload.clone(), CAT, None, &admin()).await.unwrap();
        assert!(unchanged.events.is_empty());
        assert_eq!(unchanged.bundle.audit.len(), 2);

        let mut cleared = payload.clone();
        cleared.version = None;
        assert!(h.manager.update(cleared, CAT, None, &admin()).await.unwrap_err().is_validation());

        let mut stolen = payload.clone();
        stolen.resource_organisation = "globex".to_string();
        assert!(h.manager.update(stolen, CAT, None, &admin()).await.unwrap_err().is_validation());

        h.clock.advance(Duration::seconds(1));
        let mut bumped = payload;
        bumped.version = Some("2.0".to_string());
        let outcome = h.manager.update(bumped, CAT, Some("new release".to_string()), &admin()).await.unwrap();
        let last = outcome.bundle.audit.last().unwrap();
        assert_eq!((last.log_type, last.action_type), (LogType::Update, ActionType::UpdatedVersion));
        assert_eq!(outcome.bundle.status, ResourceState::Approved);
        assert!(outcome.bundle.active);
    }

    #[tokio::test]
    async fn test_catalogue_change_needs_privilege() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let err = h
            .manager
            .update(service("acme.compute", "acme"), "beyond", None, &provider_admin())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let outcome = h
            .manager
            .update(service("acme.compute", "acme"), "beyond", None, &admin())
            .await
            .unwrap();
        assert_eq!(outcome.bundle.catalogue_id, "beyond");
        assert!(h.services.get("acme.compute", CAT).await.unwrap().is_none());
        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.events[1].catalogue_id, CAT);
    }

    #[tokio::test]
    async fn test_failed_relocation_leaves_single_copy() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();
        let before = h.services.get("acme.compute", CAT).await.unwrap();
        let emitted = h.sink.events().await.len();
        h.services.fail_writes_in("acme.compute", CAT).await;

        let err = h
            .manager
            .update(service("acme.compute", "acme"), "beyond", None, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::Store(_)));

        assert!(h.services.get("acme.compute", "beyond").await.unwrap().is_none());
        assert_eq!(h.services.get("acme.compute", CAT).await.unwrap(), before);
        assert_eq!(h.services.len().await, 1);
        assert_eq!(h.sink.events().await.len(), emitted);
    }

    #[tokio::test]
    async fn test_verify_unknown_term_leaves_bundle_untouched() {
        let h = harness(TemplateStatus::NoTemplate).await;
        let added = h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let err = h
            .manager
            .verify("acme.compute", CAT, "approved-ish", true, &admin())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(h.manager.get("acme.compute", CAT).await.unwrap(), added.bundle);
    }

    #[tokio::test]
    async fn test_verify_updates_owner_template() {
        let h = harness(TemplateStatus::NoTemplate).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let outcome = h
            .manager
            .verify("acme.compute", CAT, "rejected resource", true, &admin())
            .await
            .unwrap();
        assert_eq!(outcome.bundle.status, ResourceState::Rejected);
        assert!(!outcome.bundle.active);

        let owner = h.providers.get("acme", CAT).await.unwrap().unwrap();
        assert_eq!(owner.payload.template_status, TemplateStatus::Rejected);

        // Rejected cannot jump straight to approved
        let err = h
            .manager
            .verify("acme.compute", CAT, "approved resource", true, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::Transition(_)));
    }

    #[tokio::test]
    async fn test_publish_requires_approval() {
        let h = harness(TemplateStatus::NoTemplate).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let err = h.manager.publish("acme.compute", CAT, true, &admin()).await.unwrap_err();
        assert!(err.is_conflict());

        // Deactivation is always allowed
        let outcome = h.manager.publish("acme.compute", CAT, false, &admin()).await.unwrap();
        assert_eq!(outcome.bundle.audit.last().map(|e| e.action_type), Some(ActionType::Deactivated));
    }

    #[tokio::test]
    async fn test_suspension_rules() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let err = h.manager.suspend("acme.compute", CAT, false, &admin()).await.unwrap_err();
        assert!(err.is_validation());

        h.manager.suspend("acme.compute", CAT, true, &admin()).await.unwrap();

        let mut owner = h.providers.get("acme", CAT).await.unwrap().unwrap();
        owner.suspended = true;
        h.providers.update(owner).await.unwrap();

        let err = h.manager.suspend("acme.compute", CAT, false, &admin()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_audit_accepts_verdicts_only() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let err = h
            .manager
            .audit("acme.compute", CAT, None, ActionType::Moved, &admin())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        h.clock.advance(Duration::seconds(1));
        h.manager
            .audit("acme.compute", CAT, Some("broken link".to_string()), ActionType::Invalid, &admin())
            .await
            .unwrap();
        h.clock.advance(Duration::seconds(1));
        let outcome = h
            .manager
            .update(
                Service {
                    webpage: Some("https://acme.org/compute".to_string()),
                    ..service("acme.compute", "acme")
                },
                CAT,
                None,
                &provider_admin(),
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome.events[0].change,
            LifecycleChange::ResourceUpdated { after_invalid_audit: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_change_provider() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let outcome = h
            .manager
            .change_provider("acme.compute", CAT, "globex", Some("acquired".to_string()), &admin())
            .await
            .unwrap();

        assert_eq!(outcome.bundle.id, "globex.compute");
        assert_eq!(outcome.bundle.payload.resource_organisation, "globex");
        assert_eq!(outcome.bundle.audit.last().map(|e| e.log_type), Some(LogType::Move));
        assert!(h.services.get("acme.compute", CAT).await.unwrap().is_none());
        assert_eq!(
            h.migration.calls().await,
            vec![("acme.compute".to_string(), "globex.compute".to_string(), CAT.to_string())]
        );
        assert_eq!(
            outcome.events[0].affected_resource_ids(),
            vec!["acme.compute", "globex.compute"]
        );
    }

    #[tokio::test]
    async fn test_change_provider_preconditions() {
        let h = harness(TemplateStatus::NoTemplate).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        let err = h
            .manager
            .change_provider("acme.compute", CAT, "globex", None, &admin())
            .await
            .unwrap_err();
        assert!(err.is_validation(), "pending resources cannot move");

        h.manager
            .verify("acme.compute", CAT, "approved resource", true, &admin())
            .await
            .unwrap();
        let err = h
            .manager
            .change_provider("acme.compute", CAT, "nobody", None, &admin())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = h
            .manager
            .change_provider("acme.compute", CAT, "acme", None, &admin())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_interrupted_move_is_reconciled() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();
        h.services.fail_writes_for("acme.compute").await;

        let err = h
            .manager
            .change_provider("acme.compute", CAT, "globex", None, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::MoveIncomplete { .. }));
        assert!(h.services.get("globex.compute", CAT).await.unwrap().is_some());

        h.services.restore_writes_for("acme.compute").await;
        h.sink.take().await;
        let report = h
            .manager
            .reconcile_moves(&InternalCapability::issue("reconciler"))
            .await
            .unwrap();

        assert_eq!(report, ReconcileReport { completed: 1, abandoned: 0, still_pending: 0 });
        assert!(h.services.get("acme.compute", CAT).await.unwrap().is_none());
        let events = h.sink.events().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].change, LifecycleChange::ResourceMoved { .. }));
    }

    #[tokio::test]
    async fn test_delete_refuses_live_resource() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();

        assert!(h.manager.delete("acme.compute", CAT, &admin()).await.unwrap_err().is_conflict());

        h.manager.publish("acme.compute", CAT, false, &admin()).await.unwrap();
        h.manager.delete("acme.compute", CAT, &admin()).await.unwrap();
        assert!(h.manager.get("acme.compute", CAT).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_fail_operation() {
        let h = harness(TemplateStatus::Approved).await;
        h.sink.set_failing(true);
        let outcome = h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();
        assert_eq!(outcome.events.len(), 1);
    }

    #[tokio::test]
    async fn test_audit_history_newest_first() {
        let h = harness(TemplateStatus::Approved).await;
        h.manager.add(service("acme.compute", "acme"), CAT, &admin()).await.unwrap();
        h.clock.advance(Duration::seconds(1));
        h.manager.suspend("acme.compute", CAT, true, &admin()).await.unwrap();

        let history = h.manager.audit_history("acme.compute", CAT).await.unwrap();
        assert_eq!(history[0].action_type, ActionType::Suspended);
        assert_eq!(history.last().map(|e| e.action_type), Some(ActionType::Registered));
    }
}
