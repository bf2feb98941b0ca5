// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine Configuration
//!
//! Defaults suit a local single-process deployment. [`CatalogueConfig::from_env`]
//! applies environment overrides on top of them:
//!
//! | Variable                       | Field                      |
//! |--------------------------------|----------------------------|
//! | `CATALOGUE_ID`                 | `catalogue_id`             |
//! | `CATALOGUE_DISPATCH_POLL_MS`   | `dispatcher.poll_interval_ms` |
//! | `CATALOGUE_DISPATCH_BATCH`     | `dispatcher.batch_size`    |
//! | `CATALOGUE_RETRY_MAX_ATTEMPTS` | `retry.max_attempts`       |
//! | `CATALOGUE_RETRY_INITIAL_MS`   | `retry.initial_delay_ms`   |
//! | `CATALOGUE_RETRY_MAX_MS`       | `retry.max_delay_ms`       |
//! | `NATS_URL`                     | `nats` (enables publishing) |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::RetryPolicy;
use crate::errors::{CatalogueError, CatalogueResult};
use crate::nats::NatsConfig;

/// Outbox drain settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub poll_interval_ms: u64,
    pub batch_size: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            batch_size: 64,
        }
    }
}

impl DispatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Handler retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::builder()
            .max_attempts(config.max_attempts)
            .initial_delay(Duration::from_millis(config.initial_delay_ms))
            .max_delay(Duration::from_millis(config.max_delay_ms))
            .multiplier(config.multiplier)
            .build()
    }
}

/// Optional NATS publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatsSettings {
    /// Comma-separated server URLs
    pub url: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

fn default_client_name() -> String {
    "catalogue-lifecycle".to_string()
}

impl NatsSettings {
    pub fn to_nats_config(&self) -> NatsConfig {
        NatsConfig {
            name: self.client_name.clone(),
            ..NatsConfig::for_servers(&self.url)
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Catalogue served by this process
    pub catalogue_id: String,
    pub dispatcher: DispatcherConfig,
    pub retry: RetryConfig,
    pub nats: Option<NatsSettings>,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            catalogue_id: "eosc".to_string(),
            dispatcher: DispatcherConfig::default(),
            retry: RetryConfig::default(),
            nats: None,
        }
    }
}

impl CatalogueConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> CatalogueResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`
    pub fn from_lookup<F>(lookup: F) -> CatalogueResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(catalogue_id) = lookup("CATALOGUE_ID") {
            config.catalogue_id = catalogue_id;
        }
        if let Some(value) = parsed(&lookup, "CATALOGUE_DISPATCH_POLL_MS")? {
            config.dispatcher.poll_interval_ms = value;
        }
        if let Some(value) = parsed(&lookup, "CATALOGUE_DISPATCH_BATCH")? {
            config.dispatcher.batch_size = value;
        }
        if let Some(value) = parsed(&lookup, "CATALOGUE_RETRY_MAX_ATTEMPTS")? {
            config.retry.max_attempts = value;
        }
        if let Some(value) = parsed(&lookup, "CATALOGUE_RETRY_INITIAL_MS")? {
            config.retry.initial_delay_ms = value;
        }
        if let Some(value) = parsed(&lookup, "CATALOGUE_RETRY_MAX_MS")? {
            config.retry.max_delay_ms = value;
        }
        if let Some(url) = lookup("NATS_URL") {
            config.nats = Some(NatsSettings {
                url,
                client_name: default_client_name(),
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> CatalogueResult<()> {
        if self.catalogue_id.trim().is_empty() {
            return Err(CatalogueError::Configuration("catalogue id is empty".to_string()));
        }
        if self.dispatcher.poll_interval_ms == 0 {
            return Err(CatalogueError::Configuration(
                "dispatcher poll interval must be positive".to_string(),
            ));
        }
        if self.dispatcher.batch_size == 0 {
            return Err(CatalogueError::Configuration(
                "dispatcher batch size must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(CatalogueError::Configuration(
                "retry max attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(CatalogueError::Configuration(format!(
                "retry initial delay {}ms exceeds max delay {}ms",
                self.retry.initial_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> CatalogueResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|err| CatalogueError::Configuration(format!("{key}={raw:?}: {err}")))
        })
        .transpose()
}
