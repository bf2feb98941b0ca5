// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Dispatch
//!
//! Lifecycle operations hand their events to an [`EventSink`]. The production
//! sink is the [`EventDispatcher`], which writes one outbox entry per
//! interested [`EventHandler`] and drains the outbox in the background.
//!
//! # Delivery Guarantees
//!
//! - At-least-once per (event, handler); handlers must be idempotent
//! - In enqueue order per (handler, resource)
//! - Failed deliveries back off per [`RetryPolicy`] and are dead-lettered
//!   once the budget is spent
//! - Nothing here ever fails the lifecycle caller

pub mod dispatcher;
pub mod handlers;
pub mod outbox;
pub mod retry;

use async_trait::async_trait;

use crate::errors::CatalogueResult;
use crate::events::LifecycleEvent;

pub use dispatcher::{DispatchReport, DispatcherHandle, EventDispatcher};
pub use handlers::{MirrorSyncHandler, NotificationHandler};
pub use outbox::{select_due, Outbox, OutboxEntry, OutboxStatus};
pub use retry::{RetryPolicy, RetryPolicyBuilder};

/// Where lifecycle operations put their events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, events: &[LifecycleEvent]) -> CatalogueResult<()>;
}

/// Background consumer of lifecycle events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name, stored on outbox entries
    fn name(&self) -> &str;

    /// Whether an outbox entry should be created for `event`
    fn interested_in(&self, _event: &LifecycleEvent) -> bool {
        true
    }

    async fn handle(&self, event: &LifecycleEvent) -> CatalogueResult<()>;
}
