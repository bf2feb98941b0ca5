// Copyright (c) 2025 - Cowboy AI, Inc.
//! Catalogue Resource Kinds
//!
//! Closed taxonomy of the payload kinds a catalogue bundle can wrap. The kind
//! decides which state vocabulary a bundle's status belongs to, whether the
//! kind participates in the one-template-per-provider rule, and whether it is
//! a sub-profile hanging off a parent resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalogue payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Organisation that owns resources
    Provider,
    /// Service offered by a provider
    Service,
    /// Datasource profile of a service
    Datasource,
    /// Training material
    TrainingResource,
    /// Interoperability guideline record
    InteroperabilityRecord,
    /// Helpdesk sub-profile of a service
    Helpdesk,
    /// Monitoring sub-profile of a service
    Monitoring,
    /// Link between a resource and interoperability records
    ResourceInteroperabilityRecord,
    /// Configuration template filled in for a resource
    ConfigurationTemplateInstance,
}

impl ResourceKind {
    /// Every kind, in declaration order
    pub const ALL: [ResourceKind; 9] = [
        Self::Provider,
        Self::Service,
        Self::Datasource,
        Self::TrainingResource,
        Self::InteroperabilityRecord,
        Self::Helpdesk,
        Self::Monitoring,
        Self::ResourceInteroperabilityRecord,
        Self::ConfigurationTemplateInstance,
    ];

    /// Canonical string representation (used in subjects and logs)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Service => "service",
            Self::Datasource => "datasource",
            Self::TrainingResource => "training_resource",
            Self::InteroperabilityRecord => "interoperability_record",
            Self::Helpdesk => "helpdesk",
            Self::Monitoring => "monitoring",
            Self::ResourceInteroperabilityRecord => "resource_interoperability_record",
            Self::ConfigurationTemplateInstance => "configuration_template_instance",
        }
    }

    /// Parse from the canonical string representation
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Vocabulary type a status term of this kind must belong to
    pub fn state_vocabulary(&self) -> &'static str {
        match self {
            Self::Provider => "Provider state",
            Self::InteroperabilityRecord => "Interoperability Record state",
            _ => "Resource state",
        }
    }

    /// Noun used when spelling state identifiers ("approved resource")
    pub fn state_noun(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::InteroperabilityRecord => "interoperability record",
            _ => "resource",
        }
    }

    /// Kinds subject to the one-pending-template-per-provider rule
    pub fn is_template_kind(&self) -> bool {
        matches!(self, Self::Service | Self::TrainingResource)
    }

    /// Kinds that hang off a parent resource and follow its activation
    pub fn is_sub_profile(&self) -> bool {
        matches!(
            self,
            Self::Datasource
                | Self::Helpdesk
                | Self::Monitoring
                | Self::ResourceInteroperabilityRecord
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
