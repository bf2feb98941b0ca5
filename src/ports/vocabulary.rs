// Copyright (c) 2025 - Cowboy AI, Inc.
//! Vocabulary Gateway and Status Boundary
//!
//! Status identifiers such as `"approved resource"` are defined by an external
//! vocabulary. The engine only ever sees [`ResourceState`] values:
//! [`StateRegistry::resolve`] is the single place where an incoming term id is
//! looked up, type-checked against the kind's state vocabulary and mapped to
//! the closed enum. Anything that fails here is a `Validation` error and the
//! bundle is left untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{ResourceKind, ResourceState};
use crate::errors::{CatalogueError, CatalogueResult};

/// One vocabulary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub name: String,
    /// Vocabulary this term belongs to ("Resource state", ...)
    pub vocabulary_type: String,
}

impl Term {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        vocabulary_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vocabulary_type: vocabulary_type.into(),
        }
    }
}

/// Lookup into the external vocabulary service
#[async_trait]
pub trait VocabularyGateway: Send + Sync {
    /// Term with this identifier, if any
    async fn resolve(&self, term_id: &str) -> CatalogueResult<Option<Term>>;

    /// Whether `term` belongs to `vocabulary_type`
    fn is_of_type(&self, term: &Term, vocabulary_type: &str) -> bool {
        term.vocabulary_type == vocabulary_type
    }
}

/// Maps vocabulary identifiers onto [`ResourceState`] per state vocabulary
#[derive(Debug, Clone)]
pub struct StateRegistry {
    states: HashMap<String, (ResourceState, &'static str)>,
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRegistry {
    /// Registry covering every kind's state vocabulary
    pub fn new() -> Self {
        let mut states = HashMap::new();
        for kind in ResourceKind::ALL {
            for state in ResourceState::ALL {
                states.insert(state.term_id(kind), (state, kind.state_vocabulary()));
            }
        }
        Self { states }
    }

    /// Every term id the registry understands, paired with its vocabulary type
    pub fn terms(&self) -> impl Iterator<Item = (&str, &'static str)> + '_ {
        self.states
            .iter()
            .map(|(term_id, (_, vocabulary))| (term_id.as_str(), *vocabulary))
    }

    /// Parse an incoming status identifier for `kind`
    ///
    /// # Errors
    ///
    /// `Validation` if the vocabulary does not know the term, the term is of
    /// another vocabulary type, or the term is not a lifecycle state.
    pub async fn resolve(
        &self,
        gateway: &dyn VocabularyGateway,
        kind: ResourceKind,
        term_id: &str,
    ) -> CatalogueResult<ResourceState> {
        let expected_type = kind.state_vocabulary();
        let term = gateway.resolve(term_id).await?.ok_or_else(|| {
            CatalogueError::Validation(format!("vocabulary has no term '{term_id}'"))
        })?;

        if !gateway.is_of_type(&term, expected_type) {
            return Err(CatalogueError::Validation(format!(
                "'{term_id}' is a {} term, expected {expected_type}",
                term.vocabulary_type
            )));
        }

        match self.states.get(&term.id) {
            Some((state, vocabulary)) if *vocabulary == expected_type => Ok(*state),
            _ => Err(CatalogueError::Validation(format!(
                "'{term_id}' is not a lifecycle state of {kind}"
            ))),
        }
    }
}
