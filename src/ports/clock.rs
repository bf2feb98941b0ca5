// Copyright (c) 2025 - Cowboy AI, Inc.
//! Injected time source

use chrono::{DateTime, Utc};

/// Source of "now" for audit timestamps and retry scheduling
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
