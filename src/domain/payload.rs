// Copyright (c) 2025 - Cowboy AI, Inc.
//! Catalogue Payloads
//!
//! The domain objects wrapped by a [`Bundle`](super::Bundle). The engine only
//! needs a handful of facts from each payload (its id, its owner, its version
//! and, for sub-profiles, the parent resource), exposed through [`Payload`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::{ResourceKind, TemplateStatus};

/// Facts the lifecycle engine reads from a payload
pub trait Payload:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind tag of this payload type
    const KIND: ResourceKind;

    /// Payload identifier (kept equal to the bundle id)
    fn id(&self) -> &str;

    /// Replace the payload identifier
    fn set_id(&mut self, id: String);

    /// Owning provider, if this kind has one
    fn owner_id(&self) -> Option<&str> {
        None
    }

    /// Version label, if this kind is versioned
    fn version(&self) -> Option<&str> {
        None
    }

    /// Parent resource for sub-profiles
    fn parent_resource_id(&self) -> Option<&str> {
        None
    }
}

/// Payloads whose owning provider can change
pub trait Relocatable: Payload {
    /// Point the payload at a new owning provider
    fn set_owner_id(&mut self, owner_id: String);
}

/// Organisation that owns catalogue resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    /// Contact addresses notified about lifecycle changes
    #[serde(default)]
    pub contacts: Vec<String>,
    /// Gate for auto-approving new resources
    #[serde(default)]
    pub template_status: TemplateStatus,
}

impl Payload for Provider {
    const KIND: ResourceKind = ResourceKind::Provider;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Service offered by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub resource_organisation: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub webpage: Option<String>,
}

impl Payload for Service {
    const KIND: ResourceKind = ResourceKind::Service;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.resource_organisation)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl Relocatable for Service {
    fn set_owner_id(&mut self, owner_id: String) {
        self.resource_organisation = owner_id;
    }
}

/// Datasource profile attached to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    pub id: String,
    pub service_id: String,
    pub resource_organisation: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

impl Payload for Datasource {
    const KIND: ResourceKind = ResourceKind::Datasource;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.resource_organisation)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn parent_resource_id(&self) -> Option<&str> {
        Some(&self.service_id)
    }
}

impl Relocatable for Datasource {
    fn set_owner_id(&mut self, owner_id: String) {
        self.resource_organisation = owner_id;
    }
}

/// Training material published by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingResource {
    pub id: String,
    pub title: String,
    pub resource_organisation: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Payload for TrainingResource {
    const KIND: ResourceKind = ResourceKind::TrainingResource;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.resource_organisation)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl Relocatable for TrainingResource {
    fn set_owner_id(&mut self, owner_id: String) {
        self.resource_organisation = owner_id;
    }
}

/// Interoperability guideline record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteroperabilityRecord {
    pub id: String,
    pub title: String,
    pub provider_id: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl Payload for InteroperabilityRecord {
    const KIND: ResourceKind = ResourceKind::InteroperabilityRecord;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.provider_id)
    }
}

impl Relocatable for InteroperabilityRecord {
    fn set_owner_id(&mut self, owner_id: String) {
        self.provider_id = owner_id;
    }
}

/// Helpdesk sub-profile of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Helpdesk {
    pub id: String,
    pub service_id: String,
    #[serde(default)]
    pub support_emails: Vec<String>,
}

impl Payload for Helpdesk {
    const KIND: ResourceKind = ResourceKind::Helpdesk;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn parent_resource_id(&self) -> Option<&str> {
        Some(&self.service_id)
    }
}

/// Monitoring sub-profile of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitoring {
    pub id: String,
    pub service_id: String,
    #[serde(default)]
    pub monitored_by: Option<String>,
}

impl Payload for Monitoring {
    const KIND: ResourceKind = ResourceKind::Monitoring;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn parent_resource_id(&self) -> Option<&str> {
        Some(&self.service_id)
    }
}

/// Links a resource to the interoperability records it implements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInteroperabilityRecord {
    pub id: String,
    pub resource_id: String,
    #[serde(default)]
    pub interoperability_record_ids: Vec<String>,
}

impl Payload for ResourceInteroperabilityRecord {
    const KIND: ResourceKind = ResourceKind::ResourceInteroperabilityRecord;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn parent_resource_id(&self) -> Option<&str> {
        Some(&self.resource_id)
    }
}

/// Configuration template filled in for a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationTemplateInstance {
    pub id: String,
    pub resource_id: String,
    pub configuration_template_id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Payload for ConfigurationTemplateInstance {
    const KIND: ResourceKind = ResourceKind::ConfigurationTemplateInstance;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn parent_resource_id(&self) -> Option<&str> {
        Some(&self.resource_id)
    }
}
