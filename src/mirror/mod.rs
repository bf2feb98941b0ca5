// Copyright (c) 2025 - Cowboy AI, Inc.
//! Public Mirror
//!
//! Approved, active and unsuspended primaries are replicated into a public
//! copy keyed `"{catalogue_id}.{primary_id}"` with `metadata.published = true`.
//! Mirrors are written only by [`PublicMirrorSynchronizer`], which the
//! dispatcher drives from lifecycle events.
//!
//! # Architecture
//!
//! ```text
//! LifecycleEvent ──▶ MirrorSyncHandler ──▶ PublicMirrorSynchronizer::sync
//!                                               │ read primary + mirror
//!                                               │ plan_mirror (pure)
//!                                               ▼ single store write
//! ```

pub mod plan;
pub mod synchronizer;

pub use plan::{derive_mirror, mirror_id, plan_mirror, primary_id_of, should_be_public, MirrorEffect};
pub use synchronizer::{MirrorOutcome, MirrorSync, PublicMirrorSynchronizer, ResyncReport};
