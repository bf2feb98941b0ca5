// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Store Port
//!
//! Persistence of bundles keyed by `(id, catalogue_id)`. The store is a plain
//! repository: it enforces key uniqueness and nothing else. Lifecycle rules
//! live in the manager, mirror rules in the synchronizer.
//!
//! # Key Semantics
//!
//! | Operation | Missing key     | Existing key    |
//! |-----------|-----------------|-----------------|
//! | `get`     | `Ok(None)`      | `Ok(Some(..))`  |
//! | `add`     | inserts         | `Conflict`      |
//! | `update`  | `NotFound`      | replaces        |
//! | `delete`  | `NotFound`      | removes         |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Bundle, Payload, ResourceState};
use crate::errors::CatalogueResult;

/// Query filter over bundles of one kind
///
/// Every `Some` field must match. `published` distinguishes primaries
/// (`Some(false)`) from public mirrors (`Some(true)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFilter {
    pub catalogue_id: Option<String>,
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub parent_resource_id: Option<String>,
    pub status: Option<ResourceState>,
    pub active: Option<bool>,
    pub suspended: Option<bool>,
    pub published: Option<bool>,
    /// Offset into the ordered result set
    pub from: usize,
    /// Page size; `None` returns everything after `from`
    pub quantity: Option<usize>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_catalogue(mut self, catalogue_id: impl Into<String>) -> Self {
        self.catalogue_id = Some(catalogue_id.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn child_of(mut self, parent_resource_id: impl Into<String>) -> Self {
        self.parent_resource_id = Some(parent_resource_id.into());
        self
    }

    pub fn with_status(mut self, status: ResourceState) -> Self {
        self.status = Some(status);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn suspended(mut self, suspended: bool) -> Self {
        self.suspended = Some(suspended);
        self
    }

    /// Only primaries
    pub fn primaries(mut self) -> Self {
        self.published = Some(false);
        self
    }

    /// Only public-mirror copies
    pub fn mirrors(mut self) -> Self {
        self.published = Some(true);
        self
    }

    pub fn page(mut self, from: usize, quantity: usize) -> Self {
        self.from = from;
        self.quantity = Some(quantity);
        self
    }

    /// Whether `bundle` satisfies every criterion (paging excluded)
    pub fn matches<P: Payload>(&self, bundle: &Bundle<P>) -> bool {
        fn eq<T: PartialEq>(wanted: &Option<T>, actual: T) -> bool {
            wanted.as_ref().map_or(true, |w| *w == actual)
        }

        eq(&self.catalogue_id.as_deref(), bundle.catalogue_id.as_str())
            && eq(&self.id.as_deref(), bundle.id.as_str())
            && self
                .owner_id
                .as_deref()
                .map_or(true, |owner| bundle.owner_id() == Some(owner))
            && self
                .parent_resource_id
                .as_deref()
                .map_or(true, |parent| bundle.payload.parent_resource_id() == Some(parent))
            && eq(&self.status, bundle.status)
            && eq(&self.active, bundle.active)
            && eq(&self.suspended, bundle.suspended)
            && eq(&self.published, bundle.metadata.published)
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    /// Matches before paging
    pub total: usize,
    pub from: usize,
    pub results: Vec<T>,
}

impl<T> Paged<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            from: 0,
            results: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Bundle repository for one payload kind
#[async_trait]
pub trait ResourceStore<P: Payload>: Send + Sync {
    /// Load the bundle at `(id, catalogue_id)`
    async fn get(&self, id: &str, catalogue_id: &str) -> CatalogueResult<Option<Bundle<P>>>;

    /// Insert a new bundle
    ///
    /// # Errors
    ///
    /// `Conflict` if the key is taken.
    async fn add(&self, bundle: Bundle<P>) -> CatalogueResult<Bundle<P>>;

    /// Replace an existing bundle
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is absent.
    async fn update(&self, bundle: Bundle<P>) -> CatalogueResult<Bundle<P>>;

    /// Remove the bundle at `(id, catalogue_id)`
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is absent.
    async fn delete(&self, id: &str, catalogue_id: &str) -> CatalogueResult<()>;

    /// Bundles matching `filter`, ordered by id
    async fn query(&self, filter: &ResourceFilter) -> CatalogueResult<Paged<Bundle<P>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Datasource;
    use crate::identity::{Actor, InternalCapability};
    use chrono::Utc;

    fn datasource() -> Bundle<Datasource> {
        let actor: Actor = InternalCapability::issue("test").into();
        Bundle::new(
            Datasource {
                id: "acme.ds".to_string(),
                service_id: "acme.compute".to_string(),
                resource_organisation: "acme".to_string(),
                version: None,
                jurisdiction: None,
            },
            "eosc",
            ResourceState::Approved,
            true,
            &actor,
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ResourceFilter::new().matches(&datasource()));
    }

    #[test]
    fn test_filter_criteria() {
        let bundle = datasource();
        assert!(ResourceFilter::new()
            .in_catalogue("eosc")
            .child_of("acme.compute")
            .owned_by("acme")
            .primaries()
            .matches(&bundle));
        assert!(!ResourceFilter::new().child_of("acme.other").matches(&bundle));
        assert!(!ResourceFilter::new().mirrors().matches(&bundle));
        assert!(!ResourceFilter::new().suspended(true).matches(&bundle));
    }
}
