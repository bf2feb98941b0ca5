//! Resource lifecycle engine for an onboarding catalogue
//!
//! This crate moves catalogue resources (services, datasources, training
//! resources, interoperability records and their sub-profiles) through
//! onboarding, verification, activation, suspension, audit and ownership
//! moves, cascades changes to dependents, and keeps derived public-mirror
//! copies in sync through an outbox-driven dispatcher.

pub mod adapters;
pub mod audit;
pub mod cascade;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod events;
pub mod identity;
pub mod lifecycle;
pub mod mirror;
pub mod nats;
pub mod ports;
pub mod state_machine;
pub mod subjects;
pub mod telemetry;

// Re-export commonly used types
pub use config::CatalogueConfig;
pub use engine::{CatalogueEngine, EngineBuilder};
pub use errors::{CatalogueError, CatalogueResult};
pub use events::{LifecycleChange, LifecycleEvent};
pub use identity::{Actor, InternalCapability, Role, UserIdentity};
pub use lifecycle::{LifecycleManager, LifecycleOutcome};
pub use nats::{NatsClient, NatsConfig, NatsEventPublisher};
