// Copyright (c) 2025 - Cowboy AI, Inc.
//! Built-in event handlers
//!
//! - [`MirrorSyncHandler`]: refreshes public mirrors of every affected id
//! - [`NotificationHandler`]: tells provider contacts about onboarding,
//!   verification, audits, moves and fixes after a failed audit

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::EventHandler;
use crate::domain::{Provider, ResourceKind};
use crate::errors::CatalogueResult;
use crate::events::{LifecycleChange, LifecycleEvent};
use crate::mirror::MirrorSync;
use crate::ports::{Notification, Notifier, ResourceStore};

/// Routes events to the synchronizer of their kind
#[derive(Default)]
pub struct MirrorSyncHandler {
    synchronizers: HashMap<ResourceKind, Arc<dyn MirrorSync>>,
}

impl MirrorSyncHandler {
    pub const NAME: &'static str = "mirror-sync";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_synchronizer(mut self, synchronizer: Arc<dyn MirrorSync>) -> Self {
        self.synchronizers.insert(synchronizer.kind(), synchronizer);
        self
    }

    pub fn synchronizers(&self) -> impl Iterator<Item = &Arc<dyn MirrorSync>> {
        self.synchronizers.values()
    }
}

#[async_trait]
impl EventHandler for MirrorSyncHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_in(&self, event: &LifecycleEvent) -> bool {
        self.synchronizers.contains_key(&event.resource_kind)
    }

    async fn handle(&self, event: &LifecycleEvent) -> CatalogueResult<()> {
        let Some(synchronizer) = self.synchronizers.get(&event.resource_kind) else {
            return Ok(());
        };
        for id in event.affected_resource_ids() {
            synchronizer.sync(id, &event.catalogue_id).await?;
        }
        Ok(())
    }
}

/// Builds notifications for provider contacts
pub struct NotificationHandler {
    providers: Arc<dyn ResourceStore<Provider>>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationHandler {
    pub const NAME: &'static str = "notifications";

    pub fn new(providers: Arc<dyn ResourceStore<Provider>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { providers, notifier }
    }

    async fn contacts_of(&self, provider_id: &str, catalogue_id: &str) -> CatalogueResult<Vec<String>> {
        Ok(self
            .providers
            .get(provider_id, catalogue_id)
            .await?
            .map(|provider| provider.payload.contacts)
            .unwrap_or_default())
    }

    fn message(event: &LifecycleEvent) -> Option<(String, String)> {
        let what = format!("{} '{}'", event.resource_kind, event.resource_id);
        match &event.change {
            LifecycleChange::ResourceOnboarded { status, .. } => Some((
                format!("[{}] {what} onboarded", event.catalogue_id),
                format!("{what} was submitted and is {status}."),
            )),
            LifecycleChange::ResourceVerified { status, active } => Some((
                format!("[{}] {what} {status}", event.catalogue_id),
                format!("{what} was verified as {status} (active: {active})."),
            )),
            LifecycleChange::ResourceAudited { action, comment } => Some((
                format!("[{}] {what} audited", event.catalogue_id),
                format!(
                    "{what} was audited as {action}.{}",
                    comment.as_ref().map(|c| format!(" Comment: {c}")).unwrap_or_default()
                ),
            )),
            LifecycleChange::ResourceUpdated {
                after_invalid_audit: true,
                ..
            } => Some((
                format!("[{}] {what} updated after audit", event.catalogue_id),
                format!("{what} was updated after an invalid audit and awaits re-audit."),
            )),
            LifecycleChange::ResourceMoved { previous_id, .. } => Some((
                format!("[{}] {what} changed provider", event.catalogue_id),
                format!("{} '{previous_id}' is now {what}.", event.resource_kind),
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl EventHandler for NotificationHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interested_in(&self, event: &LifecycleEvent) -> bool {
        // Cascaded sub-profile changes are covered by the parent's notification
        event.causation_id.is_none() && Self::message(event).is_some()
    }

    async fn handle(&self, event: &LifecycleEvent) -> CatalogueResult<()> {
        let Some((subject, body)) = Self::message(event) else {
            return Ok(());
        };

        let mut owners: Vec<&str> = event.owner_id.iter().map(String::as_str).collect();
        if let LifecycleChange::ResourceMoved {
            previous_owner_id: Some(previous),
            ..
        } = &event.change
        {
            owners.push(previous.as_str());
        }

        let mut recipients = Vec::new();
        for owner in owners {
            for contact in self.contacts_of(owner, &event.catalogue_id).await? {
                if !recipients.contains(&contact) {
                    recipients.push(contact);
                }
            }
        }

        if recipients.is_empty() {
            debug!(
                event_id = %event.event_id,
                resource_id = %event.resource_id,
                "No contacts to notify"
            );
            return Ok(());
        }

        self.notifier
            .notify(Notification::new(recipients, subject, body))
            .await
    }
}
