// Copyright (c) 2025 - Cowboy AI, Inc.
//! Catalogue Domain Models
//!
//! Core domain concepts for the resource catalogue: the [`Bundle`] envelope,
//! payload kinds, closed status enums and the pure precondition checks used
//! by the lifecycle manager.
//!
//! # Value Types
//!
//! - [`ResourceKind`] - closed taxonomy of payload kinds
//! - [`ResourceState`] - primary onboarding state (pending/approved/rejected)
//! - [`TemplateStatus`] - provider-level auto-approval gate
//!
//! # Entities
//!
//! - [`Bundle`] - lifecycle envelope with status overlays and audit trail
//! - [`Provider`], [`Service`], [`Datasource`], ... - payloads

pub mod bundle;
pub mod invariants;
pub mod payload;
pub mod resource_kind;
pub mod status;

pub use bundle::{Bundle, Metadata};
pub use payload::{
    ConfigurationTemplateInstance, Datasource, Helpdesk, InteroperabilityRecord, Monitoring,
    Payload, Provider, Relocatable, ResourceInteroperabilityRecord, Service, TrainingResource,
};
pub use resource_kind::ResourceKind;
pub use status::{ResourceState, TemplateStatus};
