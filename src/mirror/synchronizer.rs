// Copyright (c) 2025 - Cowboy AI, Inc.
//! Public Mirror Synchronizer
//!
//! Executes [`plan_mirror`] against a [`ResourceStore`]. Both bundles are
//! re-read on every call, so a sync triggered by a stale or duplicated event
//! still converges on the current primary state.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::plan::{mirror_id, plan_mirror, primary_id_of, MirrorEffect};
use crate::domain::{Payload, ResourceKind};
use crate::errors::{CatalogueError, CatalogueResult};
use crate::ports::{ResourceFilter, ResourceStore};

/// What a sync did to the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

/// Totals of a catalogue-wide resync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Primaries whose mirror key is held by another primary
    pub conflicts: usize,
}

impl ResyncReport {
    fn count(&mut self, outcome: MirrorOutcome) {
        match outcome {
            MirrorOutcome::Created => self.created += 1,
            MirrorOutcome::Updated => self.updated += 1,
            MirrorOutcome::Deleted => self.deleted += 1,
            MirrorOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Whether the resync had to repair anything
    pub fn repaired(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }
}

/// Kind-erased mirror maintenance, used by the dispatcher
#[async_trait]
pub trait MirrorSync: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Bring the mirror of `(primary_id, catalogue_id)` in line with its primary
    async fn sync(&self, primary_id: &str, catalogue_id: &str) -> CatalogueResult<MirrorOutcome>;

    /// Sync every primary and remove orphaned mirrors in a catalogue
    async fn resync(&self, catalogue_id: &str) -> CatalogueResult<ResyncReport>;
}

/// Mirror maintenance for one payload kind
pub struct PublicMirrorSynchronizer<P: Payload> {
    store: Arc<dyn ResourceStore<P>>,
}

impl<P: Payload> PublicMirrorSynchronizer<P> {
    pub fn new(store: Arc<dyn ResourceStore<P>>) -> Self {
        Self { store }
    }

    async fn apply(&self, effect: MirrorEffect<P>) -> CatalogueResult<MirrorOutcome> {
        match effect {
            MirrorEffect::Create(mirror) => match self.store.add(mirror.clone()).await {
                Ok(_) => Ok(MirrorOutcome::Created),
                // Raced with another sync; overwrite only if the key still holds a mirror
                Err(CatalogueError::Conflict(reason)) => {
                    let occupied_by_mirror = self
                        .store
                        .get(&mirror.id, &mirror.catalogue_id)
                        .await?
                        .is_some_and(|bundle| bundle.is_public_mirror());
                    if !occupied_by_mirror {
                        return Err(CatalogueError::Conflict(reason));
                    }
                    self.store.update(mirror).await?;
                    Ok(MirrorOutcome::Updated)
                }
                Err(err) => Err(err),
            },
            MirrorEffect::Update(mirror) => {
                self.store.update(mirror).await?;
                Ok(MirrorOutcome::Updated)
            }
            MirrorEffect::Delete { id, catalogue_id } => {
                match self.store.delete(&id, &catalogue_id).await {
                    Ok(()) | Err(CatalogueError::NotFound { .. }) => Ok(MirrorOutcome::Deleted),
                    Err(err) => Err(err),
                }
            }
            MirrorEffect::Unchanged => Ok(MirrorOutcome::Unchanged),
        }
    }
}

#[async_trait]
impl<P: Payload> MirrorSync for PublicMirrorSynchronizer<P> {
    fn kind(&self) -> ResourceKind {
        P::KIND
    }

    async fn sync(&self, primary_id: &str, catalogue_id: &str) -> CatalogueResult<MirrorOutcome> {
        let primary = self
            .store
            .get(primary_id, catalogue_id)
            .await?
            .filter(|bundle| !bundle.is_public_mirror());
        let key = mirror_id(catalogue_id, primary_id);
        let mirror = match self.store.get(&key, catalogue_id).await? {
            Some(occupant) if !occupant.is_public_mirror() => {
                warn!(
                    kind = P::KIND.as_str(),
                    resource_id = %primary_id,
                    mirror_id = %key,
                    catalogue_id = %catalogue_id,
                    "Mirror key is held by a primary, leaving it untouched"
                );
                return Err(CatalogueError::Conflict(format!(
                    "{} '{}' in catalogue '{}' occupies the mirror key of '{}'",
                    P::KIND.as_str(),
                    key,
                    catalogue_id,
                    primary_id
                )));
            }
            other => other,
        };

        let outcome = self.apply(plan_mirror(primary.as_ref(), mirror.as_ref())).await?;
        if outcome != MirrorOutcome::Unchanged {
            info!(
                kind = P::KIND.as_str(),
                resource_id = %primary_id,
                catalogue_id = %catalogue_id,
                ?outcome,
                "Public mirror synchronized"
            );
        } else {
            debug!(kind = P::KIND.as_str(), resource_id = %primary_id, "Public mirror already in sync");
        }
        Ok(outcome)
    }

    async fn resync(&self, catalogue_id: &str) -> CatalogueResult<ResyncReport> {
        let mut report = ResyncReport::default();

        let primaries = self
            .store
            .query(&ResourceFilter::new().in_catalogue(catalogue_id).primaries())
            .await?;
        for primary in &primaries.results {
            match self.sync(&primary.id, catalogue_id).await {
                Ok(outcome) => report.count(outcome),
                Err(CatalogueError::Conflict(_)) => report.conflicts += 1,
                Err(err) => return Err(err),
            }
        }

        let mirrors = self
            .store
            .query(&ResourceFilter::new().in_catalogue(catalogue_id).mirrors())
            .await?;
        for mirror in &mirrors.results {
            match primary_id_of(catalogue_id, &mirror.id) {
                Some(primary_id) => {
                    if primaries.results.iter().all(|p| p.id != primary_id) {
                        report.count(self.sync(primary_id, catalogue_id).await?);
                    }
                }
                None => {
                    warn!(
                        kind = P::KIND.as_str(),
                        mirror_id = %mirror.id,
                        catalogue_id = %catalogue_id,
                        "Removing mirror with unrecognised key"
                    );
                    report.count(
                        self.apply(MirrorEffect::Delete {
                            id: mirror.id.clone(),
                            catalogue_id: catalogue_id.to_string(),
                        })
                        .await?,
                    );
                }
            }
        }

        info!(kind = P::KIND.as_str(), catalogue_id = %catalogue_id, ?report, "Mirror resync complete");
        Ok(report)
    }
}
