// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lifecycle Status Values
//!
//! The catalogue's status identifiers come from an external vocabulary
//! ("pending resource", "approved template", ...). Inside the engine they are
//! closed enums; the identifier spelling is derived per [`ResourceKind`] and
//! parsed back only at the boundary (see `ports::vocabulary::StateRegistry`).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ResourceKind;

/// Primary onboarding state of a bundle
///
/// `suspended` and `published` are orthogonal overlays on the bundle and are
/// deliberately not part of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Submitted, awaiting verification
    Pending,
    /// Verified and accepted
    Approved,
    /// Verified and refused
    Rejected,
}

impl ResourceState {
    /// All primary states
    pub const ALL: [ResourceState; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Vocabulary identifier of this state for the given kind
    ///
    /// ```rust
    /// use catalogue_lifecycle::domain::{ResourceKind, ResourceState};
    ///
    /// assert_eq!(ResourceState::Approved.term_id(ResourceKind::Service), "approved resource");
    /// assert_eq!(ResourceState::Pending.term_id(ResourceKind::Provider), "pending provider");
    /// ```
    pub fn term_id(&self, kind: ResourceKind) -> String {
        format!("{} {}", self.as_str(), kind.state_noun())
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provider-level gate deciding whether new resources are auto-approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemplateStatus {
    /// Provider never submitted a resource template
    #[default]
    #[serde(rename = "no template status")]
    NoTemplate,
    /// A template resource is awaiting verification
    #[serde(rename = "pending template")]
    Pending,
    /// The provider's template was approved; new resources are auto-approved
    #[serde(rename = "approved template")]
    Approved,
    /// The provider's template was rejected
    #[serde(rename = "rejected template")]
    Rejected,
}

impl TemplateStatus {
    /// Vocabulary identifier
    pub fn term_id(&self) -> &'static str {
        match self {
            Self::NoTemplate => "no template status",
            Self::Pending => "pending template",
            Self::Approved => "approved template",
            Self::Rejected => "rejected template",
        }
    }

    /// Template status that follows verifying a template resource into `state`
    pub fn after_verification(state: ResourceState) -> Self {
        match state {
            ResourceState::Pending => Self::Pending,
            ResourceState::Approved => Self::Approved,
            ResourceState::Rejected => Self::Rejected,
        }
    }
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_ids_follow_kind_noun() {
        assert_eq!(ResourceState::Rejected.term_id(ResourceKind::Datasource), "rejected resource");
        assert_eq!(
            ResourceState::Approved.term_id(ResourceKind::InteroperabilityRecord),
            "approved interoperability record"
        );
    }

    #[test]
    fn test_template_status_serializes_as_term_id() {
        let json = serde_json::to_string(&TemplateStatus::Approved).unwrap();
        assert_eq!(json, "\"approved template\"");
        let back: TemplateStatus = serde_json::from_str("\"no template status\"").unwrap();
        assert_eq!(back, TemplateStatus::NoTemplate);
    }

    #[test]
    fn test_after_verification() {
        assert_eq!(
            TemplateStatus::after_verification(ResourceState::Rejected),
            TemplateStatus::Rejected
        );
    }
}
