// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Verification State Machine
//!
//! Formal FSM for the primary onboarding state of every bundle. Uses the
//! generic StateMachine trait from parent module.
//!
//! # States
//!
//! - Pending: submitted, awaiting verification
//! - Approved: accepted
//! - Rejected: refused
//!
//! # Inputs (Verify Commands)
//!
//! - Approve: Pending → Approved, Approved → Approved
//! - Reject: Pending | Approved | Rejected → Rejected
//! - ReturnToPending: Rejected → Pending, Pending → Pending
//!
//! Approved → Pending and Rejected → Approved are invalid. `suspended` and
//! `published` are overlays on the bundle and never appear here.

use super::{StateMachine, TransitionError, TransitionResult};
use crate::domain::ResourceState;

/// Verification command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyCommand {
    /// Accept the resource
    Approve,

    /// Refuse the resource
    Reject,

    /// Send the resource back for resubmission
    ReturnToPending,
}

impl VerifyCommand {
    /// Command that moves a bundle into `target`
    pub fn toward(target: ResourceState) -> Self {
        match target {
            ResourceState::Pending => Self::ReturnToPending,
            ResourceState::Approved => Self::Approve,
            ResourceState::Rejected => Self::Reject,
        }
    }
}

/// Transition output with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutput {
    /// Warnings generated during transition
    pub warnings: Vec<String>,

    /// Whether this transition withdraws a previously accepted resource
    pub is_critical: bool,
}

impl TransitionOutput {
    /// Create output with no warnings
    pub fn ok() -> Self {
        Self {
            warnings: Vec::new(),
            is_critical: false,
        }
    }

    /// Create output with warnings
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            is_critical: false,
        }
    }

    /// Create output for critical transition
    pub fn critical(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            is_critical: true,
        }
    }
}

impl StateMachine for ResourceState {
    type Input = VerifyCommand;
    type Output = TransitionOutput;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use ResourceState::*;
        use VerifyCommand::*;

        match (self, input) {
            (Pending, Approve) => Ok((Approved, TransitionOutput::ok())),
            (Pending, Reject) => Ok((Rejected, TransitionOutput::ok())),
            (Pending, ReturnToPending) => Ok((Pending, TransitionOutput::ok())),

            (Approved, Approve) => Ok((
                Approved,
                TransitionOutput::with_warnings(vec!["Re-verifying an approved resource".to_string()]),
            )),
            (Approved, Reject) => Ok((
                Rejected,
                TransitionOutput::critical(vec!["Rejecting an approved resource".to_string()]),
            )),
            (Approved, ReturnToPending) => Err(TransitionError::InvalidTransition {
                from: Approved.to_string(),
                to: Pending.to_string(),
            }),

            (Rejected, Reject) => Ok((Rejected, TransitionOutput::ok())),
            (Rejected, ReturnToPending) => Ok((Pending, TransitionOutput::ok())),
            (Rejected, Approve) => Err(TransitionError::InvalidTransition {
                from: Rejected.to_string(),
                to: Approved.to_string(),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        use ResourceState::*;
        use VerifyCommand::*;

        match self {
            Pending => vec![Approve, Reject, ReturnToPending],
            Approved => vec![Approve, Reject],
            Rejected => vec![Reject, ReturnToPending],
        }
    }
}
