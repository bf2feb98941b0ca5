// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Lifecycle Preconditions
//!
//! Business rules checked by the lifecycle manager before it mutates a
//! bundle. Every function is pure: it inspects already-loaded state and
//! returns the error category the caller must surface.
//!
//! # Categories
//!
//! - **Validation**: request breaks a rule regardless of timing
//! - **Conflict**: request is fine in itself but clashes with current state

use super::{Bundle, Payload, Provider, ResourceState};
use crate::audit::ActionType;
use crate::errors::{CatalogueError, CatalogueResult};
use crate::identity::Actor;

/// Public-mirror copies are written only by the synchronizer
pub fn ensure_not_public_mirror<P: Payload>(bundle: &Bundle<P>) -> CatalogueResult<()> {
    if bundle.is_public_mirror() {
        return Err(CatalogueError::Validation(format!(
            "{} '{}' is a public mirror and cannot be modified directly",
            bundle.kind(),
            bundle.id
        )));
    }
    Ok(())
}

/// Only privileged actors may move a bundle to another catalogue
pub fn ensure_catalogue_change_allowed(
    current_catalogue: &str,
    requested_catalogue: &str,
    actor: &Actor,
) -> CatalogueResult<()> {
    if current_catalogue != requested_catalogue && !actor.is_privileged() {
        return Err(CatalogueError::Validation(format!(
            "catalogue cannot be changed from '{current_catalogue}' to '{requested_catalogue}'"
        )));
    }
    Ok(())
}

/// A versioned resource cannot be updated to "no version"
pub fn ensure_version_not_cleared(previous: Option<&str>, next: Option<&str>) -> CatalogueResult<()> {
    if previous.is_some() && next.is_none() {
        return Err(CatalogueError::Validation(
            "version cannot be removed from a versioned resource".to_string(),
        ));
    }
    Ok(())
}

/// Owner changes go through the ownership-move path, not through update
pub fn ensure_owner_unchanged(previous: Option<&str>, next: Option<&str>) -> CatalogueResult<()> {
    if previous != next {
        return Err(CatalogueError::Validation(format!(
            "owner cannot change from {:?} to {:?} on update; move the resource instead",
            previous, next
        )));
    }
    Ok(())
}

/// Owner must exist and be approved to onboard resources
pub fn ensure_owner_onboarded(provider: &Bundle<Provider>) -> CatalogueResult<()> {
    if provider.status != ResourceState::Approved {
        return Err(CatalogueError::Validation(format!(
            "provider '{}' is {} and cannot own new resources",
            provider.id,
            provider.status_term()
        )));
    }
    Ok(())
}

/// Suspend/unsuspend must change the flag
pub fn ensure_suspension_toggles(current: bool, requested: bool, id: &str) -> CatalogueResult<()> {
    if current == requested {
        let state = if current { "suspended" } else { "not suspended" };
        return Err(CatalogueError::Validation(format!("'{id}' is already {state}")));
    }
    Ok(())
}

/// A resource cannot be unsuspended while its owner is suspended
pub fn ensure_unsuspension_allowed(
    owner: Option<&Bundle<Provider>>,
    requested_suspended: bool,
) -> CatalogueResult<()> {
    match owner {
        Some(provider) if provider.suspended && !requested_suspended => {
            Err(CatalogueError::Conflict(format!(
                "provider '{}' is suspended; unsuspend the provider first",
                provider.id
            )))
        }
        _ => Ok(()),
    }
}

/// Activation requires an approved, unsuspended resource whose owner is approved and active
pub fn ensure_activation_eligible<P: Payload>(
    bundle: &Bundle<P>,
    owner: Option<&Bundle<Provider>>,
) -> CatalogueResult<()> {
    if bundle.status != ResourceState::Approved {
        return Err(CatalogueError::Conflict(format!(
            "'{}' is {} and cannot be activated",
            bundle.id,
            bundle.status_term()
        )));
    }
    if bundle.suspended {
        return Err(CatalogueError::Conflict(format!(
            "'{}' is suspended and cannot be activated",
            bundle.id
        )));
    }
    match owner {
        Some(provider) if provider.status == ResourceState::Approved && provider.active => Ok(()),
        Some(provider) => Err(CatalogueError::Conflict(format!(
            "owner provider '{}' is not approved and active",
            provider.id
        ))),
        None => Err(CatalogueError::Conflict(format!(
            "owner provider of '{}' does not exist",
            bundle.id
        ))),
    }
}

/// Ownership moves apply to approved resources only
pub fn ensure_movable<P: Payload>(bundle: &Bundle<P>) -> CatalogueResult<()> {
    if bundle.status != ResourceState::Approved {
        return Err(CatalogueError::Validation(format!(
            "'{}' is {}; only approved resources can change provider",
            bundle.id,
            bundle.status_term()
        )));
    }
    Ok(())
}

/// Live public resources must be deactivated before deletion
pub fn ensure_deletable<P: Payload>(bundle: &Bundle<P>) -> CatalogueResult<()> {
    if bundle.status == ResourceState::Approved && bundle.active {
        return Err(CatalogueError::Conflict(format!(
            "'{}' is approved and active; deactivate it before deleting",
            bundle.id
        )));
    }
    Ok(())
}

/// Explicit audits record a verdict
pub fn ensure_audit_verdict(action: ActionType) -> CatalogueResult<()> {
    if !action.is_audit_verdict() {
        return Err(CatalogueError::Validation(format!(
            "'{action}' is not an audit verdict"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TemplateStatus;
    use crate::identity::{InternalCapability, Role, UserIdentity};
    use chrono::Utc;
    use test_case::test_case;

    fn provider(status: ResourceState, active: bool, suspended: bool) -> Bundle<Provider> {
        let actor: Actor = InternalCapability::issue("test").into();
        let mut bundle = Bundle::new(
            Provider {
                id: "acme".to_string(),
                name: "Acme".to_string(),
                abbreviation: "ACME".to_string(),
                contacts: vec![],
                template_status: TemplateStatus::Approved,
            },
            "eosc",
            status,
            active,
            &actor,
            Utc::now(),
        );
        bundle.suspended = suspended;
        bundle
    }

    #[test_case(ResourceState::Approved, true, true ; "approved active owner")]
    #[test_case(ResourceState::Approved, false, false ; "inactive owner")]
    #[test_case(ResourceState::Pending, true, false ; "pending owner")]
    fn test_activation_depends_on_owner(owner_status: ResourceState, owner_active: bool, ok: bool) {
        let owner = provider(owner_status, owner_active, false);
        let mut resource = provider(ResourceState::Approved, false, false);
        resource.id = "acme".to_string();
        let result = ensure_activation_eligible(&resource, Some(&owner));
        assert_eq!(result.is_ok(), ok);
        if let Err(err) = result {
            assert!(err.is_conflict());
        }
    }

    #[test]
    fn test_unsuspend_blocked_by_suspended_owner() {
        let owner = provider(ResourceState::Approved, true, true);
        assert!(ensure_unsuspension_allowed(Some(&owner), true).is_ok());
        let err = ensure_unsuspension_allowed(Some(&owner), false).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_catalogue_change_requires_privilege() {
        let user: Actor = UserIdentity::new("u", "U", "u@example.org", vec![Role::ProviderAdmin]).into();
        let epot: Actor = UserIdentity::new("e", "E", "e@example.org", vec![Role::Epot]).into();

        assert!(ensure_catalogue_change_allowed("eosc", "eosc", &user).is_ok());
        assert!(ensure_catalogue_change_allowed("eosc", "other", &user).is_err());
        assert!(ensure_catalogue_change_allowed("eosc", "other", &epot).is_ok());
    }

    #[test_case(Some("1.0"), None, false ; "clearing version")]
    #[test_case(Some("1.0"), Some("2.0"), true ; "bumping version")]
    #[test_case(None, None, true ; "never versioned")]
    fn test_version_rules(previous: Option<&str>, next: Option<&str>, ok: bool) {
        assert_eq!(ensure_version_not_cleared(previous, next).is_ok(), ok);
    }

    #[test]
    fn test_suspension_toggle_rejects_no_op() {
        assert!(ensure_suspension_toggles(false, true, "x").is_ok());
        assert!(ensure_suspension_toggles(true, true, "x").unwrap_err().is_validation());
    }

    #[test]
    fn test_audit_verdicts() {
        assert!(ensure_audit_verdict(ActionType::Invalid).is_ok());
        assert!(ensure_audit_verdict(ActionType::Suspended).is_err());
    }
}
