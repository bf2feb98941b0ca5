// Copyright (c) 2025 - Cowboy AI, Inc.
//! Outbox
//!
//! Each (event, handler) pair becomes one [`OutboxEntry`]. The dispatcher
//! pulls due entries, runs the handler and records the outcome. Ordering is
//! kept per (handler, resource): while an earlier entry for the same handler
//! and resource is still pending, later ones are held back even if they are
//! due, so a retried "suspended" never lands after the "unsuspended" that
//! followed it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::ResourceKind;
use crate::errors::CatalogueResult;
use crate::events::LifecycleEvent;

/// Delivery state of an outbox entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Waiting for (re)delivery
    Pending,
    /// Handler succeeded
    Delivered,
    /// Retry budget exhausted
    DeadLettered,
}

/// One pending delivery of one event to one handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Monotonic enqueue order
    pub seq: u64,
    pub handler: String,
    pub event: LifecycleEvent,
    pub status: OutboxStatus,
    /// Failed deliveries so far
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl OutboxEntry {
    /// Ordering key: entries sharing it are delivered in `seq` order
    pub fn ordering_key(&self) -> (&str, ResourceKind, &str, &str) {
        (
            self.handler.as_str(),
            self.event.resource_kind,
            self.event.catalogue_id.as_str(),
            self.event.resource_id.as_str(),
        )
    }

    pub fn is_pending(&self) -> bool {
        self.status == OutboxStatus::Pending
    }
}

/// Durable queue of handler deliveries
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Enqueue `event` once per handler name
    async fn enqueue(
        &self,
        event: LifecycleEvent,
        handlers: &[String],
        now: DateTime<Utc>,
    ) -> CatalogueResult<()>;

    /// Up to `limit` entries ready for delivery at `now`, respecting ordering
    async fn due(&self, now: DateTime<Utc>, limit: usize) -> CatalogueResult<Vec<OutboxEntry>>;

    /// Acknowledge a delivery. Implementations may drop the entry instead of
    /// keeping it as [`OutboxStatus::Delivered`]
    async fn mark_delivered(&self, seq: u64) -> CatalogueResult<()>;

    /// Record a failed delivery and when to try again
    async fn reschedule(
        &self,
        seq: u64,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        error: String,
    ) -> CatalogueResult<()>;

    /// Record the final failed delivery
    async fn dead_letter(&self, seq: u64, attempts: u32, error: String) -> CatalogueResult<()>;

    /// Entries in a given state, for inspection and replay tooling
    async fn with_status(&self, status: OutboxStatus) -> CatalogueResult<Vec<OutboxEntry>>;
}

/// Pick deliverable entries from `entries` (any order)
///
/// An entry is deliverable when it is pending, its `next_attempt_at` has
/// passed, and no pending entry with the same ordering key and a lower `seq`
/// exists.
pub fn select_due(entries: &[OutboxEntry], now: DateTime<Utc>, limit: usize) -> Vec<OutboxEntry> {
    let mut pending: Vec<&OutboxEntry> = entries.iter().filter(|e| e.is_pending()).collect();
    pending.sort_by_key(|e| e.seq);

    let mut blocked = HashSet::new();
    let mut due = Vec::new();
    for entry in pending {
        if due.len() >= limit {
            break;
        }
        let first_for_key = blocked.insert(entry.ordering_key());
        if first_for_key && entry.next_attempt_at <= now {
            due.push(entry.clone());
        }
    }
    due
}
