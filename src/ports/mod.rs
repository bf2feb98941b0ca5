// Copyright (c) 2025 - Cowboy AI, Inc.
//! Collaborator Ports
//!
//! Traits for everything the lifecycle engine consumes but does not own:
//! vocabulary lookup, bundle persistence, notification delivery, reference
//! migration and time. Production adapters live outside this crate; the
//! in-memory adapters in [`crate::adapters::memory`] back the tests and the
//! default engine wiring.
//!
//! ```text
//! LifecycleManager ──▶ VocabularyGateway
//!        │        ──▶ ResourceStore<P>
//!        │        ──▶ MigrationCollaborator
//!        └─ events ──▶ dispatcher ──▶ Notifier
//! ```

pub mod clock;
pub mod migration;
pub mod notifier;
pub mod store;
pub mod vocabulary;

pub use clock::{Clock, SystemClock};
pub use migration::MigrationCollaborator;
pub use notifier::{Notification, Notifier};
pub use store::{Paged, ResourceFilter, ResourceStore};
pub use vocabulary::{StateRegistry, Term, VocabularyGateway};
