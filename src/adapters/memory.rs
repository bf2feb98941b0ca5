// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Adapters
//!
//! Implementations of every port backed by process memory. They back the
//! default [`CatalogueEngine`](crate::engine::CatalogueEngine) wiring and the
//! test suites. Stores support failure injection so partial-failure paths
//! (cascades, ownership moves, dispatcher retries) can be exercised.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::dispatch::outbox::{select_due, Outbox, OutboxEntry, OutboxStatus};
use crate::dispatch::EventSink;
use crate::domain::{Bundle, Payload, ResourceKind, TemplateStatus};
use crate::errors::{CatalogueError, CatalogueResult};
use crate::events::LifecycleEvent;
use crate::lifecycle::{MoveIntent, MoveJournal};
use crate::ports::{
    Clock, MigrationCollaborator, Notification, Notifier, Paged, ResourceFilter, ResourceStore,
    StateRegistry, Term, VocabularyGateway,
};

// ============================================================================
// Resource store
// ============================================================================

/// `ResourceStore` over a map keyed by `(id, catalogue_id)`
pub struct InMemoryResourceStore<P: Payload> {
    bundles: RwLock<HashMap<(String, String), Bundle<P>>>,
    failing: RwLock<HashSet<String>>,
    failing_in: RwLock<HashSet<(String, String)>>,
}

impl<P: Payload> Default for InMemoryResourceStore<P> {
    fn default() -> Self {
        Self {
            bundles: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            failing_in: RwLock::new(HashSet::new()),
        }
    }
}

impl<P: Payload> InMemoryResourceStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write touching `id` fail with a `Store` error
    pub async fn fail_writes_for(&self, id: impl Into<String>) {
        self.failing.write().await.insert(id.into());
    }

    /// Make writes to `id` fail in one catalogue only
    pub async fn fail_writes_in(&self, id: &str, catalogue_id: &str) {
        self.failing_in.write().await.insert(Self::key(id, catalogue_id));
    }

    /// Undo [`Self::fail_writes_for`] and [`Self::fail_writes_in`]
    pub async fn restore_writes_for(&self, id: &str) {
        self.failing.write().await.remove(id);
        self.failing_in.write().await.retain(|(failing, _)| failing != id);
    }

    pub async fn len(&self) -> usize {
        self.bundles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bundles.read().await.is_empty()
    }

    /// Every stored bundle, ordered by `(catalogue_id, id)`
    pub async fn all(&self) -> Vec<Bundle<P>> {
        let mut all: Vec<_> = self.bundles.read().await.values().cloned().collect();
        all.sort_by(|a, b| (&a.catalogue_id, &a.id).cmp(&(&b.catalogue_id, &b.id)));
        all
    }

    async fn guard(&self, id: &str, catalogue_id: &str) -> CatalogueResult<()> {
        let scoped = self.failing_in.read().await.contains(&Self::key(id, catalogue_id));
        if scoped || self.failing.read().await.contains(id) {
            return Err(CatalogueError::Store(format!(
                "injected write failure for {} '{id}'",
                P::KIND
            )));
        }
        Ok(())
    }

    fn key(id: &str, catalogue_id: &str) -> (String, String) {
        (id.to_string(), catalogue_id.to_string())
    }
}

#[async_trait]
impl<P: Payload> ResourceStore<P> for InMemoryResourceStore<P> {
    async fn get(&self, id: &str, catalogue_id: &str) -> CatalogueResult<Option<Bundle<P>>> {
        Ok(self.bundles.read().await.get(&Self::key(id, catalogue_id)).cloned())
    }

    async fn add(&self, bundle: Bundle<P>) -> CatalogueResult<Bundle<P>> {
        self.guard(&bundle.id, &bundle.catalogue_id).await?;
        let mut bundles = self.bundles.write().await;
        let key = Self::key(&bundle.id, &bundle.catalogue_id);
        if bundles.contains_key(&key) {
            return Err(CatalogueError::Conflict(format!(
                "{} '{}' already exists in catalogue '{}'",
                P::KIND,
                bundle.id,
                bundle.catalogue_id
            )));
        }
        bundles.insert(key, bundle.clone());
        Ok(bundle)
    }

    async fn update(&self, bundle: Bundle<P>) -> CatalogueResult<Bundle<P>> {
        self.guard(&bundle.id, &bundle.catalogue_id).await?;
        let mut bundles = self.bundles.write().await;
        match bundles.get_mut(&Self::key(&bundle.id, &bundle.catalogue_id)) {
            Some(stored) => {
                *stored = bundle.clone();
                Ok(bundle)
            }
            None => Err(CatalogueError::not_found(P::KIND, &bundle.id, &bundle.catalogue_id)),
        }
    }

    async fn delete(&self, id: &str, catalogue_id: &str) -> CatalogueResult<()> {
        self.guard(id, catalogue_id).await?;
        self.bundles
            .write()
            .await
            .remove(&Self::key(id, catalogue_id))
            .map(|_| ())
            .ok_or_else(|| CatalogueError::not_found(P::KIND, id, catalogue_id))
    }

    async fn query(&self, filter: &ResourceFilter) -> CatalogueResult<Paged<Bundle<P>>> {
        let mut matches: Vec<Bundle<P>> = self
            .bundles
            .read()
            .await
            .values()
            .filter(|bundle| filter.matches(*bundle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| (&a.id, &a.catalogue_id).cmp(&(&b.id, &b.catalogue_id)));

        let total = matches.len();
        let results = matches
            .into_iter()
            .skip(filter.from)
            .take(filter.quantity.unwrap_or(usize::MAX))
            .collect();
        Ok(Paged {
            total,
            from: filter.from,
            results,
        })
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Fixed vocabulary
#[derive(Debug, Clone, Default)]
pub struct StaticVocabulary {
    terms: HashMap<String, Term>,
}

impl StaticVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lifecycle state term of every kind plus the template statuses
    pub fn with_catalogue_defaults() -> Self {
        let mut vocabulary = Self::new();
        for (term_id, vocabulary_type) in StateRegistry::new().terms() {
            vocabulary = vocabulary.with_term(Term::new(term_id, term_id, vocabulary_type));
        }
        for template in [
            TemplateStatus::NoTemplate,
            TemplateStatus::Pending,
            TemplateStatus::Approved,
            TemplateStatus::Rejected,
        ] {
            let id = template.term_id();
            vocabulary = vocabulary.with_term(Term::new(id, id, "Template state"));
        }
        vocabulary
    }

    pub fn with_term(mut self, term: Term) -> Self {
        self.terms.insert(term.id.clone(), term);
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[async_trait]
impl VocabularyGateway for StaticVocabulary {
    async fn resolve(&self, term_id: &str) -> CatalogueResult<Option<Term>> {
        Ok(self.terms.get(term_id).cloned())
    }
}

// ============================================================================
// Notifiers and migration
// ============================================================================

/// Keeps every notification; can be told to fail the next N deliveries
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failures_left: AtomicU32,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, times: u32) {
        self.failures_left.store(times, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> CatalogueResult<()> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CatalogueError::Notification("mail relay unavailable".to_string()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) -> CatalogueResult<()> {
        info!(
            recipients = ?notification.recipients,
            subject = %notification.subject,
            "Notification"
        );
        Ok(())
    }
}

/// Records reference rewrites
#[derive(Default)]
pub struct RecordingMigration {
    calls: Mutex<Vec<(String, String, String)>>,
    failing: AtomicBool,
}

impl RecordingMigration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `(old_id, new_id, catalogue_id)` of each successful rewrite
    pub async fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl MigrationCollaborator for RecordingMigration {
    async fn rewrite_references(&self, old_id: &str, new_id: &str, catalogue_id: &str) -> CatalogueResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogueError::Store(format!(
                "references of '{old_id}' could not be rewritten"
            )));
        }
        self.calls
            .lock()
            .await
            .push((old_id.to_string(), new_id.to_string(), catalogue_id.to_string()));
        Ok(())
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// Event sink, move journal, outbox
// ============================================================================

/// Sink that keeps published events in order
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<LifecycleEvent>>,
    failing: AtomicBool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().await.clone()
    }

    /// Drain collected events
    pub async fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock().await)
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn publish(&self, events: &[LifecycleEvent]) -> CatalogueResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogueError::Dispatch("sink unavailable".to_string()));
        }
        self.events.lock().await.extend_from_slice(events);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMoveJournal {
    intents: Mutex<Vec<MoveIntent>>,
}

impl InMemoryMoveJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<MoveIntent> {
        self.intents.lock().await.clone()
    }
}

#[async_trait]
impl MoveJournal for InMemoryMoveJournal {
    async fn record(&self, intent: &MoveIntent) -> CatalogueResult<()> {
        let mut intents = self.intents.lock().await;
        if intents.iter().any(|i| i.intent_id == intent.intent_id) {
            return Err(CatalogueError::Conflict(format!(
                "move intent {} already recorded",
                intent.intent_id
            )));
        }
        intents.push(intent.clone());
        Ok(())
    }

    async fn update(&self, intent: &MoveIntent) -> CatalogueResult<()> {
        let mut intents = self.intents.lock().await;
        match intents.iter_mut().find(|i| i.intent_id == intent.intent_id) {
            Some(stored) => {
                *stored = intent.clone();
                Ok(())
            }
            None => Err(CatalogueError::Store(format!(
                "move intent {} was never recorded",
                intent.intent_id
            ))),
        }
    }

    async fn get(&self, intent_id: Uuid) -> CatalogueResult<Option<MoveIntent>> {
        Ok(self
            .intents
            .lock()
            .await
            .iter()
            .find(|i| i.intent_id == intent_id)
            .cloned())
    }

    async fn unfinished(&self, kind: ResourceKind) -> CatalogueResult<Vec<MoveIntent>> {
        let mut open: Vec<MoveIntent> = self
            .intents
            .lock()
            .await
            .iter()
            .filter(|i| i.kind == kind && !i.step.is_terminal())
            .cloned()
            .collect();
        open.sort_by_key(|i| i.recorded_at);
        Ok(open)
    }
}

/// Outbox held in memory; delivered entries are dropped on acknowledgement,
/// so only pending and dead-lettered ones are retained
#[derive(Default)]
pub struct InMemoryOutbox {
    entries: Mutex<Vec<OutboxEntry>>,
    next_seq: AtomicU64,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn modify(&self, seq: u64, change: impl FnOnce(&mut OutboxEntry)) -> CatalogueResult<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.seq == seq)
            .ok_or_else(|| CatalogueError::Dispatch(format!("no outbox entry {seq}")))?;
        change(entry);
        Ok(())
    }
}

#[async_trait]
impl Outbox for InMemoryOutbox {
    async fn enqueue(&self, event: LifecycleEvent, handlers: &[String], now: DateTime<Utc>) -> CatalogueResult<()> {
        let mut entries = self.entries.lock().await;
        for handler in handlers {
            entries.push(OutboxEntry {
                seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
                handler: handler.clone(),
                event: event.clone(),
                status: OutboxStatus::Pending,
                attempts: 0,
                enqueued_at: now,
                next_attempt_at: now,
                last_error: None,
            });
        }
        Ok(())
    }

    async fn due(&self, now: DateTime<Utc>, limit: usize) -> CatalogueResult<Vec<OutboxEntry>> {
        Ok(select_due(&self.entries.lock().await, now, limit))
    }

    async fn mark_delivered(&self, seq: u64) -> CatalogueResult<()> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.seq != seq);
        if entries.len() == before {
            return Err(CatalogueError::Dispatch(format!("no outbox entry {seq}")));
        }
        Ok(())
    }

    async fn reschedule(&self, seq: u64, attempts: u32, next_attempt_at: DateTime<Utc>, error: String) -> CatalogueResult<()> {
        self.modify(seq, |entry| {
            entry.attempts = attempts;
            entry.next_attempt_at = next_attempt_at;
            entry.last_error = Some(error);
        })
        .await
    }

    async fn dead_letter(&self, seq: u64, attempts: u32, error: String) -> CatalogueResult<()> {
        self.modify(seq, |entry| {
            entry.status = OutboxStatus::DeadLettered;
            entry.attempts = attempts;
            entry.last_error = Some(error);
        })
        .await
    }

    async fn with_status(&self, status: OutboxStatus) -> CatalogueResult<Vec<OutboxEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }
}
