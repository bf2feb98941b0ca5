// Copyright (c) 2025 - Cowboy AI, Inc.
//! Caller Identities
//!
//! Every lifecycle operation is attributed to an [`Actor`]. Human callers are
//! [`UserIdentity`] values supplied by the transport layer. Background and
//! reconciliation work runs under an [`InternalCapability`], an explicit
//! credential handed to the component at wiring time, never synthesized inside
//! a call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalogue roles relevant to lifecycle rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Catalogue operator (onboarding team)
    Epot,
    /// Administrator of one or more providers
    ProviderAdmin,
    /// Authenticated user without elevated rights
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Epot => "epot",
            Self::ProviderAdmin => "provider_admin",
            Self::User => "user",
        }
    }
}

/// Authenticated human caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl UserIdentity {
    /// Create a user identity with the given roles
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Highest role, used for audit attribution
    pub fn primary_role(&self) -> Role {
        [Role::Admin, Role::Epot, Role::ProviderAdmin]
            .into_iter()
            .find(|role| self.has_role(*role))
            .unwrap_or(Role::User)
    }
}

/// Credential for system-triggered work
///
/// Constructed once by the composition root (see [`crate::engine`]) and passed
/// to background components. The `purpose` ends up in audit entries so system
/// writes stay attributable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalCapability {
    purpose: String,
    issued_at: DateTime<Utc>,
}

impl InternalCapability {
    /// Issue a capability for a named subsystem
    pub fn issue(purpose: impl Into<String>) -> Self {
        Self {
            purpose: purpose.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Who is performing a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Actor {
    /// Human caller
    User(UserIdentity),
    /// Internal subsystem
    System(InternalCapability),
}

impl Actor {
    /// Stable identifier written to audit entries
    pub fn id(&self) -> String {
        match self {
            Actor::User(user) => user.id.clone(),
            Actor::System(capability) => format!("system:{}", capability.purpose()),
        }
    }

    /// Role label written to audit entries
    pub fn role_label(&self) -> &'static str {
        match self {
            Actor::User(user) => user.primary_role().as_str(),
            Actor::System(_) => "system",
        }
    }

    /// Whether the actor may perform catalogue-level changes
    pub fn is_privileged(&self) -> bool {
        match self {
            Actor::User(user) => user.has_role(Role::Admin) || user.has_role(Role::Epot),
            Actor::System(_) => true,
        }
    }
}

impl From<UserIdentity> for Actor {
    fn from(user: UserIdentity) -> Self {
        Actor::User(user)
    }
}

impl From<InternalCapability> for Actor {
    fn from(capability: InternalCapability) -> Self {
        Actor::System(capability)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.role_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_follows_roles() {
        let admin: Actor = UserIdentity::new("u1", "Ada", "ada@example.org", vec![Role::Admin]).into();
        let provider_admin: Actor =
            UserIdentity::new("u2", "Bo", "bo@example.org", vec![Role::ProviderAdmin]).into();

        assert!(admin.is_privileged());
        assert!(!provider_admin.is_privileged());
        assert_eq!(provider_admin.role_label(), "provider_admin");
    }

    #[test]
    fn test_system_actor_is_attributed_by_purpose() {
        let actor: Actor = InternalCapability::issue("mirror-sync").into();
        assert_eq!(actor.id(), "system:mirror-sync");
        assert_eq!(actor.role_label(), "system");
        assert!(actor.is_privileged());
    }
}
