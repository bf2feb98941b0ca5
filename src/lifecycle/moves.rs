// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ownership-Move Saga
//!
//! Moving a resource to another provider rewrites its key, so it is a
//! sequence of independent store writes. Every step is journaled as a
//! [`MoveIntent`] so a move interrupted between steps can be finished (or
//! abandoned) by [`reconcile_step`]-driven reconciliation.
//!
//! ```text
//! Recorded ──add new id──▶ Added ──delete old id──▶ OriginalRemoved ──rewrite refs──▶ Completed
//!    │
//!    └──new copy never landed──▶ Abandoned
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ResourceKind;
use crate::errors::CatalogueResult;

/// Saga progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStep {
    Recorded,
    Added,
    OriginalRemoved,
    Completed,
    Abandoned,
}

impl MoveStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// Journal record of one ownership move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub intent_id: Uuid,
    pub kind: ResourceKind,
    pub old_id: String,
    pub new_id: String,
    pub catalogue_id: String,
    pub old_owner: Option<String>,
    pub new_owner: String,
    pub comment: Option<String>,
    pub step: MoveStep,
    /// `ResourceMoved` has been emitted for this move
    pub announced: bool,
    pub recorded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl MoveIntent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: ResourceKind,
        old_id: impl Into<String>,
        new_id: impl Into<String>,
        catalogue_id: impl Into<String>,
        old_owner: Option<String>,
        new_owner: impl Into<String>,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            intent_id: Uuid::now_v7(),
            kind,
            old_id: old_id.into(),
            new_id: new_id.into(),
            catalogue_id: catalogue_id.into(),
            old_owner,
            new_owner: new_owner.into(),
            comment,
            step: MoveStep::Recorded,
            announced: false,
            recorded_at: at,
            updated_at: at,
            last_error: None,
        }
    }

    pub fn advance(&mut self, step: MoveStep, at: DateTime<Utc>) {
        self.step = step;
        self.updated_at = at;
        self.last_error = None;
    }

    /// Note a failed step without changing progress
    pub fn fail(&mut self, error: impl Into<String>, at: DateTime<Utc>) {
        self.last_error = Some(error.into());
        self.updated_at = at;
    }

    pub fn abandon(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.step = MoveStep::Abandoned;
        self.last_error = Some(reason.into());
        self.updated_at = at;
    }
}

/// What reconciliation must do next for an unfinished intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Both copies exist: remove the old one
    DeleteOriginal,
    /// Only the new copy exists: fix references, then complete
    RewriteReferences,
    /// The new copy is missing: the move never took effect
    Abandon,
    /// Intent already finished
    Nothing,
}

/// Decide the next reconciliation step from the intent and actual store state
pub fn reconcile_step(intent: &MoveIntent, old_exists: bool, new_exists: bool) -> ReconcileAction {
    if intent.step.is_terminal() {
        return ReconcileAction::Nothing;
    }
    match (new_exists, old_exists) {
        (false, _) => ReconcileAction::Abandon,
        (true, true) => ReconcileAction::DeleteOriginal,
        (true, false) => ReconcileAction::RewriteReferences,
    }
}

/// Totals of a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub completed: usize,
    pub abandoned: usize,
    /// Intents that hit an error again and stay open
    pub still_pending: usize,
}

/// Persistent store of move intents
#[async_trait]
pub trait MoveJournal: Send + Sync {
    async fn record(&self, intent: &MoveIntent) -> CatalogueResult<()>;

    async fn update(&self, intent: &MoveIntent) -> CatalogueResult<()>;

    async fn get(&self, intent_id: Uuid) -> CatalogueResult<Option<MoveIntent>>;

    /// Intents of `kind` that are neither completed nor abandoned, oldest first
    async fn unfinished(&self, kind: ResourceKind) -> CatalogueResult<Vec<MoveIntent>>;
}
