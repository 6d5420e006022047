//! Resource access guard.
//!
//! Every state-changing operation passes through [`authorize`] before it
//! touches the store. The decision combines three inputs, all supplied by
//! the caller:
//!
//! - the resolved [`Identity`] (or its absence)
//! - an optional minimum [`Role`]
//! - for per-resource operations, the owner id of the target
//!
//! ```text
//! Start ─┬─ no identity ──────────────▶ Unauthenticated
//!        ├─ role below required ──────▶ Forbidden(required)
//!        └─ otherwise ────────────────▶ Allowed(identity)
//! ```
//!
//! All functions here are pure; the same inputs always yield the same
//! decision.

use std::future::Future;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::permission::Permission;
use crate::role::Role;

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Outcome of [`authorize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed(Identity),
    Unauthenticated,
    Forbidden(Role),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// Convert into a `Result`, mapping denials to their HTTP-facing errors.
    pub fn into_result(self) -> Result<Identity> {
        match self {
            Decision::Allowed(identity) => Ok(identity),
            Decision::Unauthenticated => Err(Error::Unauthorized),
            Decision::Forbidden(required) => Err(Error::InsufficientRole { required }),
        }
    }
}

/// Decide whether a caller may proceed.
pub fn authorize(identity: Option<&Identity>, required: Option<Role>) -> Decision {
    let Some(identity) = identity else {
        return Decision::Unauthenticated;
    };

    if let Some(required) = required
        && !identity.role.satisfies(required)
    {
        tracing::debug!(user = %identity.id, role = %identity.role, %required, "insufficient role");
        return Decision::Forbidden(required);
    }

    Decision::Allowed(identity.clone())
}

/// Returns `true` if the caller is an admin or owns the resource.
pub fn can_access_resource(role: Role, caller_id: &str, owner_id: &str) -> bool {
    role.is_admin() || caller_id == owner_id
}

/// [`can_access_resource`] as a `Result`, for use with `?`.
pub fn require_resource_access(identity: &Identity, owner_id: &str) -> Result<()> {
    if can_access_resource(identity.role, &identity.id, owner_id) {
        Ok(())
    } else {
        tracing::debug!(user = %identity.id, owner = %owner_id, "not the resource owner");
        Err(Error::Forbidden {
            resource: "this resource".to_string(),
            action: "access".to_string(),
        })
    }
}

/// Require that the caller's role holds `permission`.
pub fn require_permission(identity: &Identity, permission: Permission) -> Result<()> {
    if identity.role.has(permission) {
        Ok(())
    } else {
        tracing::debug!(user = %identity.id, role = %identity.role, %permission, "permission denied");
        let (action, resource) = permission.describe();
        Err(Error::Forbidden {
            resource: resource.to_string(),
            action: action.to_string(),
        })
    }
}

/// Pick the own/any variant of a permission depending on ownership, then
/// require both resource access and that permission.
///
/// Used for edit and delete, where an owner needs the `*_OWN_*` permission
/// and anyone else needs the `*_ANY_*` one.
pub fn require_owned_or_any(
    identity: &Identity,
    owner_id: &str,
    own: Permission,
    any: Permission,
) -> Result<()> {
    require_resource_access(identity, owner_id)?;
    if identity.id == owner_id {
        require_permission(identity, own)
    } else {
        require_permission(identity, any)
    }
}

/// Run `op` only if the caller is authorized.
///
/// On `Unauthenticated` or `Forbidden` the error is returned and `op` is
/// never called.
pub async fn guarded<F, Fut, T>(identity: Option<&Identity>, required: Option<Role>, op: F) -> Result<T>
where
    F: FnOnce(Identity) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let identity = authorize(identity, required).into_result()?;
    op(identity).await
}
