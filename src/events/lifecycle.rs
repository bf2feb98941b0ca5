// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lifecycle Events
//!
//! One envelope type, [`LifecycleEvent`], for every resource kind. The
//! kind-specific part is the [`LifecycleChange`], tagged by `type` on the
//! wire so NATS consumers can dispatch without knowing the payload schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::ActionType;
use crate::domain::{Bundle, Payload, ResourceKind, ResourceState};
use crate::identity::Actor;
use crate::subjects::{Operation, SubjectBuilder};

/// What happened to the resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleChange {
    /// Bundle created by `add`
    ResourceOnboarded { status: ResourceState, active: bool },

    /// Payload replaced by `update`
    ResourceUpdated {
        version_changed: bool,
        comment: Option<String>,
        /// Latest audit was INVALID and this update came after it
        after_invalid_audit: bool,
    },

    /// Status set by `verify`
    ResourceVerified { status: ResourceState, active: bool },

    /// Visibility changed by `publish` or a cascade
    ResourcePublished { active: bool },

    /// Suspension flag changed by `suspend` or a cascade
    ResourceSuspended { suspended: bool },

    /// Explicit audit verdict
    ResourceAudited {
        action: ActionType,
        comment: Option<String>,
    },

    /// Ownership moved; `resource_id` on the envelope is the new id
    ResourceMoved {
        previous_id: String,
        previous_owner_id: Option<String>,
        comment: Option<String>,
    },

    /// Bundle removed
    ResourceDeleted,
}

impl LifecycleChange {
    /// Subject operation for this change
    pub fn operation(&self) -> Operation {
        match self {
            Self::ResourceOnboarded { .. } => Operation::Onboarded,
            Self::ResourceUpdated { .. } => Operation::Updated,
            Self::ResourceVerified { .. } => Operation::Verified,
            Self::ResourcePublished { active: true } => Operation::Activated,
            Self::ResourcePublished { active: false } => Operation::Deactivated,
            Self::ResourceSuspended { suspended: true } => Operation::Suspended,
            Self::ResourceSuspended { suspended: false } => Operation::Unsuspended,
            Self::ResourceAudited { .. } => Operation::Audited,
            Self::ResourceMoved { .. } => Operation::Moved,
            Self::ResourceDeleted => Operation::Deleted,
        }
    }

    /// Get human-readable event type name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            Self::ResourceOnboarded { .. } => "ResourceOnboarded",
            Self::ResourceUpdated { .. } => "ResourceUpdated",
            Self::ResourceVerified { .. } => "ResourceVerified",
            Self::ResourcePublished { .. } => "ResourcePublished",
            Self::ResourceSuspended { .. } => "ResourceSuspended",
            Self::ResourceAudited { .. } => "ResourceAudited",
            Self::ResourceMoved { .. } => "ResourceMoved",
            Self::ResourceDeleted => "ResourceDeleted",
        }
    }
}

/// Domain event emitted by a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Unique event identifier (UUID v7 for time-ordering)
    pub event_id: Uuid,

    /// When the change happened
    pub occurred_at: DateTime<Utc>,

    /// Groups every event of one caller request, cascades included
    pub correlation_id: Uuid,

    /// Direct parent event, set for cascaded sub-profile events
    pub causation_id: Option<Uuid>,

    pub actor_id: String,
    pub resource_kind: ResourceKind,
    pub resource_id: String,
    pub catalogue_id: String,
    pub owner_id: Option<String>,
    pub change: LifecycleChange,
}

impl LifecycleEvent {
    /// Event about `bundle`, starting a new correlation
    pub fn for_bundle<P: Payload>(
        bundle: &Bundle<P>,
        actor: &Actor,
        occurred_at: DateTime<Utc>,
        change: LifecycleChange,
    ) -> Self {
        let event_id = Uuid::now_v7();
        Self {
            event_id,
            occurred_at,
            correlation_id: event_id,
            causation_id: None,
            actor_id: actor.id(),
            resource_kind: P::KIND,
            resource_id: bundle.id.clone(),
            catalogue_id: bundle.catalogue_id.clone(),
            owner_id: bundle.owner_id().map(str::to_string),
            change,
        }
    }

    /// Chain this event onto `parent`
    pub fn caused_by(mut self, parent: &LifecycleEvent) -> Self {
        self.correlation_id = parent.correlation_id;
        self.causation_id = Some(parent.event_id);
        self
    }

    /// Join an existing correlation without a direct cause
    pub fn correlated_with(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Resource ids whose derived state may need refreshing
    ///
    /// A move touches both the old and the new id.
    pub fn affected_resource_ids(&self) -> Vec<&str> {
        match &self.change {
            LifecycleChange::ResourceMoved { previous_id, .. } => {
                vec![previous_id.as_str(), self.resource_id.as_str()]
            }
            _ => vec![self.resource_id.as_str()],
        }
    }

    /// NATS subject for this event
    pub fn subject(&self) -> String {
        SubjectBuilder::new(self.resource_kind)
            .operation(self.change.operation())
            .build()
    }

    pub fn event_type_name(&self) -> &'static str {
        self.change.event_type_name()
    }
}
