// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Mirror Planning
//!
//! ```text
//! (primary?, stored mirror?) → MirrorEffect
//! ```
//!
//! No I/O happens here. The synchronizer reads both bundles, asks
//! [`plan_mirror`] what to do and executes the single resulting effect.

use crate::domain::{Bundle, Payload, ResourceState};

/// Whether a primary bundle must have a public mirror
pub fn should_be_public<P: Payload>(bundle: &Bundle<P>) -> bool {
    bundle.status == ResourceState::Approved
        && bundle.active
        && !bundle.suspended
        && !bundle.is_public_mirror()
}

/// Key of the public mirror of `primary_id`
///
/// ```rust
/// use catalogue_lifecycle::mirror::mirror_id;
/// assert_eq!(mirror_id("eosc", "acme.compute"), "eosc.acme.compute");
/// ```
pub fn mirror_id(catalogue_id: &str, primary_id: &str) -> String {
    format!("{catalogue_id}.{primary_id}")
}

/// Recover the primary id from a mirror id, if it has the expected prefix
pub fn primary_id_of<'a>(catalogue_id: &str, mirror_id: &'a str) -> Option<&'a str> {
    mirror_id
        .strip_prefix(catalogue_id)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|rest| !rest.is_empty())
}

/// Public copy of a primary bundle
pub fn derive_mirror<P: Payload>(primary: &Bundle<P>) -> Bundle<P> {
    let mut mirror = primary.clone();
    mirror.rekey(mirror_id(&primary.catalogue_id, &primary.id));
    mirror.metadata.published = true;
    mirror
}

/// Single write needed to bring the mirror in line with its primary
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorEffect<P> {
    Create(Bundle<P>),
    Update(Bundle<P>),
    Delete { id: String, catalogue_id: String },
    Unchanged,
}

/// Decide the mirror write for a primary and its currently stored mirror
pub fn plan_mirror<P: Payload>(
    primary: Option<&Bundle<P>>,
    mirror: Option<&Bundle<P>>,
) -> MirrorEffect<P> {
    let wanted = primary.filter(|p| should_be_public(p)).map(derive_mirror);

    match (wanted, mirror) {
        (Some(wanted), None) => MirrorEffect::Create(wanted),
        (Some(wanted), Some(stored)) if wanted == *stored => MirrorEffect::Unchanged,
        (Some(wanted), Some(_)) => MirrorEffect::Update(wanted),
        (None, Some(stored)) => MirrorEffect::Delete {
            id: stored.id.clone(),
            catalogue_id: stored.catalogue_id.clone(),
        },
        (None, None) => MirrorEffect::Unchanged,
    }
}
