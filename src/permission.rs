//! Named permissions.
//!
//! Each [`Permission`] maps to a static set of roles. The table is compiled
//! in and never changes at runtime; role-tier checks live in [`crate::role`],
//! this module answers the finer "may this role do X" question.
//!
//! Lookups by name fail loudly on unknown names instead of returning `false`,
//! so a typo in a permission name surfaces as a server error in tests rather
//! than as a silent denial.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::role::Role;

const EDITORS: &[Role] = &[Role::Editor, Role::Admin];
const ADMINS: &[Role] = &[Role::Admin];

/// A named action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Permission {
    // Content
    CreateContent,
    EditOwnContent,
    EditAnyContent,
    DeleteOwnContent,
    DeleteAnyContent,
    PublishContent,

    // User management
    ViewUsers,
    EditUsers,
    DeleteUsers,
    ChangeRoles,

    // System
    ViewAnalytics,
    ManageSettings,
}

impl Permission {
    /// Every permission, in table order.
    pub const ALL: [Permission; 12] = [
        Permission::CreateContent,
        Permission::EditOwnContent,
        Permission::EditAnyContent,
        Permission::DeleteOwnContent,
        Permission::DeleteAnyContent,
        Permission::PublishContent,
        Permission::ViewUsers,
        Permission::EditUsers,
        Permission::DeleteUsers,
        Permission::ChangeRoles,
        Permission::ViewAnalytics,
        Permission::ManageSettings,
    ];

    /// Roles granted this permission.
    pub const fn roles(self) -> &'static [Role] {
        match self {
            Permission::CreateContent
            | Permission::EditOwnContent
            | Permission::DeleteOwnContent
            | Permission::PublishContent
            | Permission::ViewAnalytics => EDITORS,
            Permission::EditAnyContent
            | Permission::DeleteAnyContent
            | Permission::ViewUsers
            | Permission::EditUsers
            | Permission::DeleteUsers
            | Permission::ChangeRoles
            | Permission::ManageSettings => ADMINS,
        }
    }

    /// Table name, e.g. `CREATE_CONTENT`.
    pub const fn name(self) -> &'static str {
        match self {
            Permission::CreateContent => "CREATE_CONTENT",
            Permission::EditOwnContent => "EDIT_OWN_CONTENT",
            Permission::EditAnyContent => "EDIT_ANY_CONTENT",
            Permission::DeleteOwnContent => "DELETE_OWN_CONTENT",
            Permission::DeleteAnyContent => "DELETE_ANY_CONTENT",
            Permission::PublishContent => "PUBLISH_CONTENT",
            Permission::ViewUsers => "VIEW_USERS",
            Permission::EditUsers => "EDIT_USERS",
            Permission::DeleteUsers => "DELETE_USERS",
            Permission::ChangeRoles => "CHANGE_ROLES",
            Permission::ViewAnalytics => "VIEW_ANALYTICS",
            Permission::ManageSettings => "MANAGE_SETTINGS",
        }
    }

    /// Action verb and resource noun used in `Forbidden` errors.
    pub(crate) const fn describe(self) -> (&'static str, &'static str) {
        match self {
            Permission::CreateContent => ("create", "content"),
            Permission::EditOwnContent | Permission::EditAnyContent => ("edit", "content"),
            Permission::DeleteOwnContent | Permission::DeleteAnyContent => ("delete", "content"),
            Permission::PublishContent => ("publish", "content"),
            Permission::ViewUsers => ("view", "users"),
            Permission::EditUsers => ("edit", "users"),
            Permission::DeleteUsers => ("delete", "users"),
            Permission::ChangeRoles => ("change", "roles"),
            Permission::ViewAnalytics => ("view", "analytics"),
            Permission::ManageSettings => ("manage", "settings"),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Permission::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownPermission(s.to_string()))
    }
}

/// Check whether `role` holds the permission called `name`.
///
/// # Returns
/// - `Ok(true)` / `Ok(false)` for a configured permission
/// - `Err(Error::UnknownPermission)` if `name` is not in the table
pub fn has_permission(role: Role, name: &str) -> Result<bool> {
    let permission: Permission = name.parse()?;
    Ok(role.has(permission))
}
