//! Role hierarchy.
//!
//! Roles form a fixed total order: `Viewer < Editor < Admin`. Every role
//! check reduces to comparing ordinals, so a higher role always holds every
//! capability of the roles below it.
//!
//! ```
//! use inkstone::Role;
//!
//! assert!(Role::Admin.satisfies(Role::Editor));
//! assert!(!Role::Viewer.satisfies(Role::Editor));
//! assert!(Role::Editor.can_edit());
//! ```

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::permission::Permission;

/// A privilege tier.
///
/// Deserialization accepts only the three lowercase names, so an unknown or
/// missing role never reaches [`Role::satisfies`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access.
    Viewer,
    /// Content authoring and editing.
    Editor,
    /// Full administrative control.
    Admin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Admin];

    /// Position in the hierarchy. Higher ordinal = more privilege.
    pub const fn ordinal(self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Editor => 2,
            Role::Admin => 3,
        }
    }

    /// Returns `true` if this role is at least as privileged as `required`.
    pub const fn satisfies(self, required: Role) -> bool {
        self.ordinal() >= required.ordinal()
    }

    /// Returns `true` for the top tier.
    pub const fn is_admin(self) -> bool {
        self.satisfies(Role::Admin)
    }

    /// Returns `true` if the role may author and edit content.
    pub const fn can_edit(self) -> bool {
        self.satisfies(Role::Editor)
    }

    /// Returns `true` if the role has read-only access and nothing more.
    pub const fn is_viewer_only(self) -> bool {
        !self.satisfies(Role::Editor)
    }

    /// Returns `true` if the role is granted `permission`.
    pub fn has(self, permission: Permission) -> bool {
        permission.roles().contains(&self)
    }

    /// Wire name (`"viewer"`, `"editor"`, `"admin"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    /// Human-readable name.
    pub const fn label(self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Editor => "Editor",
            Role::Admin => "Administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::BadRequest(format!("Unknown role: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_follows_ordinal_order() {
        for actual in Role::ALL {
            for required in Role::ALL {
                assert_eq!(
                    actual.satisfies(required),
                    actual.ordinal() >= required.ordinal(),
                    "{actual} vs {required}"
                );
            }
        }
    }

    #[test]
    fn satisfies_examples() {
        assert!(Role::Admin.satisfies(Role::Editor));
        assert!(Role::Editor.satisfies(Role::Editor));
        assert!(!Role::Viewer.satisfies(Role::Editor));
        assert!(!Role::Editor.satisfies(Role::Admin));
    }

    #[test]
    fn convenience_predicates() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Editor.is_admin());

        assert!(Role::Admin.can_edit());
        assert!(Role::Editor.can_edit());
        assert!(!Role::Viewer.can_edit());

        assert!(Role::Viewer.is_viewer_only());
        assert!(!Role::Editor.is_viewer_only());
    }

    #[test]
    fn ord_matches_hierarchy() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Admin);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("editor".parse::<Role>().unwrap(), Role::Editor);
        assert_eq!("Viewer".parse::<Role>().unwrap(), Role::Viewer);
    }

    #[test]
    fn parse_rejects_unknown_role() {
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(Error::BadRequest(_))
        ));
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(Role::Admin.label(), "Administrator");
        assert_eq!(Role::Editor.label(), "Editor");
        assert_eq!(Role::Viewer.label(), "Viewer");
    }
}
