// Copyright (c) 2025 - Cowboy AI, Inc.
//! Catalogue Domain Events
//!
//! Every lifecycle operation returns the events describing what it changed.
//! The same events are enqueued in the outbox and drive mirror sync,
//! notifications and NATS publication.
//!
//! # Principles
//!
//! 1. **Events are immutable**: Once created, events never change
//! 2. **Events are past tense**: Named for what happened (Onboarded, not Onboard)
//! 3. **Events include metadata**: correlation_id, causation_id, timestamp
//!
//! # Correlation and Causation
//!
//! ```text
//! suspend(service)
//!   ResourceSuspended (service)   correlation: c-1, causation: None, id: e-1
//!     ↓ cascade
//!   ResourceSuspended (datasource) correlation: c-1, causation: e-1
//!   ResourceSuspended (helpdesk)   correlation: c-1, causation: e-1
//! ```

pub mod lifecycle;

pub use lifecycle::{LifecycleChange, LifecycleEvent};
