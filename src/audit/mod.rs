// Copyright (c) 2025 - Cowboy AI, Inc.
//! Audit Log
//!
//! Every lifecycle transition appends an [`AuditEntry`] to the bundle's
//! [`AuditTrail`]. The trail is the system of record for "what happened and
//! when", so it maintains two invariants itself rather than trusting callers:
//!
//! 1. Entries are sorted ascending by timestamp after every append (stable,
//!    so entries sharing a timestamp keep their append order).
//! 2. `latest_onboarding_info`, `latest_update_info` and `latest_audit_info`
//!    always equal the max-timestamp entry of their [`LogType`].
//!
//! Deserializing a trail re-derives both, so a stored bundle with stale cache
//! fields heals on load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::Actor;

/// Category of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Onboard,
    Update,
    Audit,
    Move,
    Activation,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboard => "onboard",
            Self::Update => "update",
            Self::Audit => "audit",
            Self::Move => "move",
            Self::Activation => "activation",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened within a [`LogType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Registered,
    Approved,
    Rejected,
    Updated,
    UpdatedVersion,
    Valid,
    Invalid,
    Activated,
    Deactivated,
    Suspended,
    Unsuspended,
    Moved,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Updated => "updated",
            Self::UpdatedVersion => "updated_version",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::Suspended => "suspended",
            Self::Unsuspended => "unsuspended",
            Self::Moved => "moved",
        }
    }

    /// Action types an explicit audit may record
    pub fn is_audit_verdict(&self) -> bool {
        matches!(self, Self::Valid | Self::Invalid | Self::Approved)
    }

    pub fn activation(active: bool) -> Self {
        if active {
            Self::Activated
        } else {
            Self::Deactivated
        }
    }

    pub fn suspension(suspended: bool) -> Self {
        if suspended {
            Self::Suspended
        } else {
            Self::Unsuspended
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable record in a bundle's lifecycle history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub log_type: LogType,
    pub action_type: ActionType,
    pub actor_id: String,
    pub actor_role: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AuditEntry {
    /// Create an entry attributed to `actor`
    pub fn new(
        log_type: LogType,
        action_type: ActionType,
        actor: &Actor,
        timestamp: DateTime<Utc>,
        comment: Option<String>,
    ) -> Self {
        Self {
            log_type,
            action_type,
            actor_id: actor.id(),
            actor_role: actor.role_label().to_string(),
            timestamp,
            comment,
        }
    }
}

/// Ordered, append-only audit history with derived "latest" projections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredAuditTrail")]
pub struct AuditTrail {
    logging_info: Vec<AuditEntry>,
    latest_onboarding_info: Option<AuditEntry>,
    latest_update_info: Option<AuditEntry>,
    latest_audit_info: Option<AuditEntry>,
}

/// Persisted form; caches are recomputed rather than trusted
#[derive(Deserialize)]
struct StoredAuditTrail {
    #[serde(default)]
    logging_info: Vec<AuditEntry>,
}

impl From<StoredAuditTrail> for AuditTrail {
    fn from(stored: StoredAuditTrail) -> Self {
        AuditTrail::from_entries(stored.logging_info)
    }
}

impl AuditTrail {
    /// Empty trail
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trail from arbitrary entries, sorting and deriving caches
    pub fn from_entries(entries: Vec<AuditEntry>) -> Self {
        let mut trail = Self {
            logging_info: entries,
            ..Self::default()
        };
        trail.normalize();
        trail
    }

    /// Append an entry and restore ordering and caches
    pub fn append(&mut self, entry: AuditEntry) {
        self.logging_info.push(entry);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.logging_info.sort_by_key(|entry| entry.timestamp);
        self.latest_onboarding_info = self.latest_of(LogType::Onboard).cloned();
        self.latest_update_info = self.latest_of(LogType::Update).cloned();
        self.latest_audit_info = self.latest_of(LogType::Audit).cloned();
    }

    /// Entries in ascending timestamp order
    pub fn entries(&self) -> &[AuditEntry] {
        &self.logging_info
    }

    pub fn len(&self) -> usize {
        self.logging_info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logging_info.is_empty()
    }

    /// Max-timestamp entry of a type (the later one wins on ties)
    pub fn latest_of(&self, log_type: LogType) -> Option<&AuditEntry> {
        self.logging_info
            .iter()
            .filter(|entry| entry.log_type == log_type)
            .max_by_key(|entry| entry.timestamp)
    }

    pub fn latest_onboarding_info(&self) -> Option<&AuditEntry> {
        self.latest_onboarding_info.as_ref()
    }

    pub fn latest_update_info(&self) -> Option<&AuditEntry> {
        self.latest_update_info.as_ref()
    }

    pub fn latest_audit_info(&self) -> Option<&AuditEntry> {
        self.latest_audit_info.as_ref()
    }

    /// Most recent entry of any type
    pub fn last(&self) -> Option<&AuditEntry> {
        self.logging_info.last()
    }

    /// History as consumers display it: newest first
    pub fn history_newest_first(&self) -> Vec<AuditEntry> {
        self.logging_info.iter().rev().cloned().collect()
    }

    /// Resource was updated after its latest audit marked it invalid
    pub fn updated_after_invalid_audit(&self) -> bool {
        match (&self.latest_audit_info, &self.latest_update_info) {
            (Some(audit), Some(update)) => {
                audit.action_type == ActionType::Invalid && update.timestamp > audit.timestamp
            }
            _ => false,
        }
    }

    /// Check ordering and cache invariants
    pub fn check_invariants(&self) -> Result<(), String> {
        if self
            .logging_info
            .windows(2)
            .any(|pair| pair[0].timestamp > pair[1].timestamp)
        {
            return Err("logging info is not sorted by timestamp".to_string());
        }
        let expected = [
            (LogType::Onboard, &self.latest_onboarding_info),
            (LogType::Update, &self.latest_update_info),
            (LogType::Audit, &self.latest_audit_info),
        ];
        for (log_type, cached) in expected {
            if self.latest_of(log_type) != cached.as_ref() {
                return Err(format!("latest {log_type} cache is stale"));
            }
        }
        Ok(())
    }
}
