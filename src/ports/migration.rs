// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reference migration after an ownership move

use async_trait::async_trait;

use crate::errors::CatalogueResult;

/// Rewrites cross-references (sub-profiles, interoperability links, ...) that
/// still point at a moved resource's old id
#[async_trait]
pub trait MigrationCollaborator: Send + Sync {
    async fn rewrite_references(
        &self,
        old_id: &str,
        new_id: &str,
        catalogue_id: &str,
    ) -> CatalogueResult<()>;
}
