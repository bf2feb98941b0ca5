// Copyright (c) 2025 - Cowboy AI, Inc.

//! NATS subject hierarchy for catalogue lifecycle events
//!
//! # Subject Pattern
//!
//! All lifecycle events follow the hierarchical pattern:
//!
//! ```text
//! catalogue.{kind}.{operation}
//! ```
//!
//! This allows for:
//! - Precise subscriptions (`catalogue.service.suspended`)
//! - Kind-level wildcards (`catalogue.datasource.>`)
//! - Global subscriptions (`catalogue.>`)
//!
//! # Examples
//!
//! ```rust
//! use catalogue_lifecycle::domain::ResourceKind;
//! use catalogue_lifecycle::subjects::{Operation, SubjectBuilder};
//!
//! let subject = SubjectBuilder::new(ResourceKind::Service)
//!     .operation(Operation::Suspended)
//!     .build();
//! assert_eq!(subject, "catalogue.service.suspended");
//!
//! let wildcard = SubjectBuilder::new(ResourceKind::Datasource).build();
//! assert_eq!(wildcard, "catalogue.datasource.>");
//! ```

use std::fmt;

use crate::domain::ResourceKind;

/// Root namespace for all catalogue subjects
pub const CATALOGUE_ROOT: &str = "catalogue";

/// Lifecycle operations (event types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A resource was added to the catalogue
    Onboarded,
    /// A resource payload was changed
    Updated,
    /// A resource was approved, rejected or sent back to pending
    Verified,
    /// A resource was made visible
    Activated,
    /// A resource was hidden
    Deactivated,
    /// A resource was temporarily withdrawn
    Suspended,
    /// A suspension was lifted
    Unsuspended,
    /// An explicit audit verdict was recorded
    Audited,
    /// A resource changed owner
    Moved,
    /// A resource was removed
    Deleted,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Onboarded => write!(f, "onboarded"),
            Operation::Updated => write!(f, "updated"),
            Operation::Verified => write!(f, "verified"),
            Operation::Activated => write!(f, "activated"),
            Operation::Deactivated => write!(f, "deactivated"),
            Operation::Suspended => write!(f, "suspended"),
            Operation::Unsuspended => write!(f, "unsuspended"),
            Operation::Audited => write!(f, "audited"),
            Operation::Moved => write!(f, "moved"),
            Operation::Deleted => write!(f, "deleted"),
        }
    }
}

/// Builder for catalogue NATS subjects
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    kind: ResourceKind,
    operation: Option<Operation>,
}

impl SubjectBuilder {
    /// Start a subject for one resource kind
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            operation: None,
        }
    }

    /// Set the operation
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Build the subject string
    ///
    /// Without an operation this is the kind-level wildcard
    /// `catalogue.{kind}.>`.
    pub fn build(self) -> String {
        match self.operation {
            Some(operation) => format!("{}.{}.{}", CATALOGUE_ROOT, self.kind, operation),
            None => format!("{}.{}.>", CATALOGUE_ROOT, self.kind),
        }
    }

    /// Build a subscription for all catalogue events
    ///
    /// Returns: `catalogue.>`
    pub fn build_all() -> String {
        format!("{}.>", CATALOGUE_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_builder() {
        let subject = SubjectBuilder::new(ResourceKind::TrainingResource)
            .operation(Operation::Onboarded)
            .build();

        assert_eq!(subject, "catalogue.training_resource.onboarded");
    }

    #[test]
    fn test_wildcard_subject() {
        assert_eq!(
            SubjectBuilder::new(ResourceKind::Helpdesk).build(),
            "catalogue.helpdesk.>"
        );
        assert_eq!(SubjectBuilder::build_all(), "catalogue.>");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Unsuspended.to_string(), "unsuspended");
        assert_eq!(Operation::Moved.to_string(), "moved");
    }
}
