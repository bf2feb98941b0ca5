// Copyright (c) 2025 - Cowboy AI, Inc.
//! Outbox Dispatcher
//!
//! ```text
//! publish(events) ──▶ Outbox (one entry per interested handler)
//!                        │
//!        run_once / spawn loop
//!                        ▼
//!                 handler.handle(event)
//!                   ok  → acknowledged (entry dropped)
//!                   err → rescheduled (backoff) or DeadLettered
//! ```

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::outbox::{Outbox, OutboxEntry};
use super::retry::RetryPolicy;
use super::{EventHandler, EventSink};
use crate::errors::{CatalogueError, CatalogueResult};
use crate::events::LifecycleEvent;
use crate::ports::{Clock, SystemClock};

/// Counts from one drain of the outbox
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub retried: usize,
    pub dead_lettered: usize,
}

impl DispatchReport {
    pub fn is_idle(&self) -> bool {
        self.delivered + self.retried + self.dead_lettered == 0
    }
}

/// Outbox-backed [`EventSink`] with a background drain loop
pub struct EventDispatcher {
    outbox: Arc<dyn Outbox>,
    handlers: Vec<Arc<dyn EventHandler>>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

impl EventDispatcher {
    pub fn new(outbox: Arc<dyn Outbox>, retry: RetryPolicy) -> Self {
        Self {
            outbox,
            handlers: Vec::new(),
            retry,
            clock: Arc::new(SystemClock),
            batch_size: 64,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn outbox(&self) -> &Arc<dyn Outbox> {
        &self.outbox
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Deliver every entry that is due now, batch after batch
    ///
    /// Returns once no entry is due. Entries rescheduled into the future are
    /// left for a later call.
    pub async fn run_once(&self) -> CatalogueResult<DispatchReport> {
        let mut report = DispatchReport::default();
        loop {
            let batch = self.outbox.due(self.clock.now(), self.batch_size).await?;
            if batch.is_empty() {
                break;
            }
            for entry in batch {
                self.deliver(entry, &mut report).await?;
            }
        }
        if !report.is_idle() {
            debug!(?report, "Outbox drained");
        }
        Ok(report)
    }

    async fn deliver(&self, entry: OutboxEntry, report: &mut DispatchReport) -> CatalogueResult<()> {
        let outcome = match self.handlers.iter().find(|h| h.name() == entry.handler) {
            Some(handler) => handler.handle(&entry.event).await,
            None => Err(CatalogueError::Dispatch(format!(
                "no handler registered as '{}'",
                entry.handler
            ))),
        };

        match outcome {
            Ok(()) => {
                self.outbox.mark_delivered(entry.seq).await?;
                report.delivered += 1;
            }
            Err(err) => {
                let attempts = entry.attempts + 1;
                if self.retry.allows_retry_after(attempts) {
                    let delay = self.retry.delay_for_attempt(attempts);
                    let next = self.clock.now()
                        + ChronoDuration::milliseconds(delay.as_millis().min(i64::MAX as u128) as i64);
                    warn!(
                        handler = %entry.handler,
                        event_id = %entry.event.event_id,
                        resource_id = %entry.event.resource_id,
                        attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %err,
                        "Event delivery failed, rescheduling"
                    );
                    self.outbox
                        .reschedule(entry.seq, attempts, next, err.to_string())
                        .await?;
                    report.retried += 1;
                } else {
                    error!(
                        handler = %entry.handler,
                        event_id = %entry.event.event_id,
                        resource_id = %entry.event.resource_id,
                        attempts,
                        error = %err,
                        "Event delivery dead-lettered"
                    );
                    self.outbox.dead_letter(entry.seq, attempts, err.to_string()).await?;
                    report.dead_lettered += 1;
                }
            }
        }
        Ok(())
    }

    /// Run the drain loop on a tokio task until the handle is shut down
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> DispatcherHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let dispatcher = self;

        let join = tokio::spawn(async move {
            info!(poll_ms = poll_interval.as_millis() as u64, "Event dispatcher started");
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = dispatcher.run_once().await {
                            error!(error = %err, "Outbox drain failed");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            // Deliver what is already due before exiting
            if let Err(err) = dispatcher.run_once().await {
                error!(error = %err, "Final outbox drain failed");
            }
            info!("Event dispatcher stopped");
        });

        DispatcherHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

#[async_trait]
impl EventSink for EventDispatcher {
    async fn publish(&self, events: &[LifecycleEvent]) -> CatalogueResult<()> {
        let now = self.clock.now();
        for event in events {
            let handlers: Vec<String> = self
                .handlers
                .iter()
                .filter(|h| h.interested_in(event))
                .map(|h| h.name().to_string())
                .collect();
            if handlers.is_empty() {
                continue;
            }
            debug!(
                event_id = %event.event_id,
                event_type = event.event_type_name(),
                handlers = handlers.len(),
                "Enqueuing event"
            );
            self.outbox.enqueue(event.clone(), &handlers, now).await?;
        }
        Ok(())
    }
}

/// Running dispatcher task
pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Signal the loop to stop and wait for its final drain
    pub async fn shutdown(self) -> CatalogueResult<()> {
        // A closed channel means the task already exited
        let _ = self.shutdown.send(true);
        self.join
            .await
            .map_err(|err| CatalogueError::Dispatch(format!("dispatcher task failed: {err}")))
    }
}
