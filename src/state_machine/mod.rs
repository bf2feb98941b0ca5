// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Generic state machine types for modeling catalogue lifecycles. All state
//! machines are pure functional: transitions are deterministic functions with
//! no side effects, and the lifecycle manager applies the resulting state.
//!
//! # State Machine Type
//!
//! Mealy machine, output depends on both current state and input:
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! # Example
//!
//! ```rust
//! use catalogue_lifecycle::domain::ResourceState;
//! use catalogue_lifecycle::state_machine::{StateMachine, VerifyCommand};
//!
//! let (next, _) = ResourceState::Pending.transition(&VerifyCommand::Approve).unwrap();
//! assert_eq!(next, ResourceState::Approved);
//! assert!(!ResourceState::Approved.can_transition(&VerifyCommand::ReturnToPending));
//! ```

pub mod resource_lifecycle;

pub use resource_lifecycle::{TransitionOutput, VerifyCommand};

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Why a verification was refused by the state machine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The lifecycle has no edge between the two states
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Pure lifecycle transition function
///
/// Implemented by onboarding states; the verify command is the input and a
/// [`TransitionOutput`] describes what the manager should log.
pub trait StateMachine: Sized + Clone {
    type Input;
    type Output;

    /// Next state for `input`, or why there is none
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// Inputs accepted from this state
    fn valid_inputs(&self) -> Vec<Self::Input>;
}

/// Consistency rules a value must satisfy before it is persisted
///
/// Lifecycle writers check a mutated bundle before persisting it; a
/// violation becomes a `Validation` error and nothing is written.
pub trait StateInvariant {
    fn check_invariants(&self) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceState;

    #[test]
    fn test_invalid_transition_message() {
        let err = ResourceState::Rejected
            .transition(&VerifyCommand::Approve)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition from rejected to approved");
    }

    #[test]
    fn test_can_transition_matches_transition() {
        assert!(ResourceState::Pending.can_transition(&VerifyCommand::Reject));
        assert!(!ResourceState::Rejected.can_transition(&VerifyCommand::Approve));
    }
}
