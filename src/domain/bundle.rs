// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bundle Envelope
//!
//! A [`Bundle`] wraps a catalogue payload with everything the lifecycle engine
//! manages: primary status, the `active`/`suspended` overlays, registration
//! metadata and the audit trail.
//!
//! # Persisted Shape
//!
//! ```text
//! Bundle {
//!     id, catalogue_id, payload, status, active, suspended,
//!     metadata { registered_by, registered_at, modified_by, modified_at, published },
//!     logging_info[], latest_onboarding_info, latest_update_info, latest_audit_info
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Payload, ResourceKind, ResourceState};
use crate::audit::{AuditEntry, AuditTrail};
use crate::identity::Actor;
use crate::state_machine::StateInvariant;

/// Registration and modification facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub registered_by: String,
    pub registered_at: DateTime<Utc>,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
    /// This bundle IS a public-mirror copy
    #[serde(default)]
    pub published: bool,
}

impl Metadata {
    pub fn registered(actor: &Actor, at: DateTime<Utc>) -> Self {
        let who = actor.id();
        Self {
            registered_by: who.clone(),
            registered_at: at,
            modified_by: who,
            modified_at: at,
            published: false,
        }
    }
}

/// Lifecycle envelope around a payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Payload"))]
pub struct Bundle<P> {
    pub id: String,
    pub catalogue_id: String,
    pub payload: P,
    pub status: ResourceState,
    pub active: bool,
    pub suspended: bool,
    pub metadata: Metadata,
    #[serde(flatten)]
    pub audit: AuditTrail,
}

impl<P: Payload> Bundle<P> {
    /// Create a primary (non-mirror) bundle with an empty trail
    pub fn new(
        payload: P,
        catalogue_id: impl Into<String>,
        status: ResourceState,
        active: bool,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: payload.id().to_string(),
            catalogue_id: catalogue_id.into(),
            payload,
            status,
            active,
            suspended: false,
            metadata: Metadata::registered(actor, at),
            audit: AuditTrail::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        P::KIND
    }

    /// Status as its vocabulary identifier ("approved resource")
    pub fn status_term(&self) -> String {
        self.status.term_id(P::KIND)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.payload.owner_id()
    }

    /// Whether this bundle is a public-mirror copy
    pub fn is_public_mirror(&self) -> bool {
        self.metadata.published
    }

    /// Change the bundle key, keeping the payload id in step
    pub fn rekey(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.payload.set_id(id.clone());
        self.id = id;
    }

    /// Append an audit entry and stamp the modification metadata
    pub fn record(&mut self, entry: AuditEntry) {
        self.metadata.modified_by = entry.actor_id.clone();
        if entry.timestamp > self.metadata.modified_at {
            self.metadata.modified_at = entry.timestamp;
        }
        self.audit.append(entry);
    }

    /// Stamp modification metadata without an audit entry
    pub fn touch(&mut self, actor: &Actor, at: DateTime<Utc>) {
        self.metadata.modified_by = actor.id();
        if at > self.metadata.modified_at {
            self.metadata.modified_at = at;
        }
    }
}

impl<P: Payload> StateInvariant for Bundle<P> {
    fn check_invariants(&self) -> Result<(), String> {
        if self.id != self.payload.id() {
            return Err(format!(
                "bundle id '{}' differs from payload id '{}'",
                self.id,
                self.payload.id()
            ));
        }
        if self.status == ResourceState::Rejected && self.active {
            return Err("rejected bundle cannot be active".to_string());
        }
        if self.metadata.published
            && !(self.status == ResourceState::Approved && self.active && !self.suspended)
        {
            return Err("public mirror of a bundle that should not be public".to_string());
        }
        self.audit.check_invariants()
    }
}
