// Copyright (c) 2025 - Cowboy AI, Inc.

//! Port implementations
//!
//! Only in-memory adapters ship with the crate. Production stores, vocabulary
//! services and mail relays implement the traits in [`crate::ports`].

pub mod memory;

pub use memory::{
    CollectingSink, InMemoryMoveJournal, InMemoryOutbox, InMemoryResourceStore, ManualClock,
    RecordingMigration, RecordingNotifier, StaticVocabulary, TracingNotifier,
};
