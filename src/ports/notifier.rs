// Copyright (c) 2025 - Cowboy AI, Inc.
//! Notification delivery

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CatalogueResult;

/// A message for one or more recipients
///
/// Formatting into mail or any other channel is the notifier's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(recipients: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipients,
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Fire-and-forget delivery channel
///
/// Called from the dispatcher only; an error schedules a retry and never
/// reaches the lifecycle caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> CatalogueResult<()>;
}
