// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Lifecycle
//!
//! [`LifecycleManager`] owns every mutation of a primary bundle: onboarding,
//! updates, verification, activation, suspension, audits, ownership moves and
//! deletion. Each operation validates, writes the bundle with its new audit
//! entry and returns a [`LifecycleOutcome`] carrying the events it produced.
//!
//! # Operation Flow
//!
//! ```text
//! caller ──▶ validate (vocabulary, store state, FSM)
//!        ──▶ mutate bundle + append audit entry
//!        ──▶ ResourceStore write
//!        ──▶ cascade to sub-profiles (publish / suspend / verify / delete)
//!        ──▶ EventSink::publish (outbox; failures logged, never surfaced)
//!        ◀── LifecycleOutcome { bundle, events, cascade }
//! ```

pub mod manager;
pub mod moves;

use crate::cascade::CascadeReport;
use crate::domain::Bundle;
use crate::events::LifecycleEvent;

pub use manager::LifecycleManager;
pub use moves::{reconcile_step, MoveIntent, MoveJournal, MoveStep, ReconcileAction, ReconcileReport};

/// Result of a successful lifecycle operation
#[derive(Debug, Clone)]
pub struct LifecycleOutcome<P> {
    /// Bundle as persisted
    pub bundle: Bundle<P>,
    /// Events emitted by the operation, cascaded ones included
    pub events: Vec<LifecycleEvent>,
    /// Present for operations that cascade to sub-profiles
    pub cascade: Option<CascadeReport>,
}

impl<P> LifecycleOutcome<P> {
    pub fn new(bundle: Bundle<P>, events: Vec<LifecycleEvent>) -> Self {
        Self {
            bundle,
            events,
            cascade: None,
        }
    }

    /// Outcome for a request that changed nothing
    pub fn unchanged(bundle: Bundle<P>) -> Self {
        Self::new(bundle, Vec::new())
    }

    pub fn with_cascade(mut self, report: CascadeReport) -> Self {
        self.events.extend(report.events().cloned());
        self.cascade = Some(report);
        self
    }
}
