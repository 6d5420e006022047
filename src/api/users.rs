//! User administration.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::guard;
use crate::module::Module;
use crate::permission::Permission;
use crate::procedure::{Empty, Meta, Procedure};
use crate::role::Role;
use crate::router::{Context, Router};
use crate::users::{self, User};

pub struct List;

impl Procedure for List {
    fn meta() -> Meta {
        Meta::get("/api/users")
            .summary("List users")
            .tag("users")
            .requires(Role::Admin)
    }

    type Input = Empty;
    type Output = Vec<User>;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Vec<User>> {
        guard::require_permission(ctx.require_identity()?, Permission::ViewUsers)?;
        users::list(&ctx.connection()?).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RoleChange {
    pub role: Role,
}

pub struct ChangeRole;

impl Procedure for ChangeRole {
    fn meta() -> Meta {
        Meta::put("/api/users/{id}/role")
            .summary("Change a user's role")
            .tag("users")
            .requires(Role::Admin)
    }

    type Input = RoleChange;
    type Output = User;

    async fn handle(ctx: Context, input: RoleChange) -> crate::Result<User> {
        let admin = ctx.require_identity()?;
        guard::require_permission(admin, Permission::ChangeRoles)?;
        let id = ctx.require_param("id")?;
        tracing::info!(by = %admin.id, user = %id, role = %input.role, "Role change requested");
        users::set_role(&ctx.connection()?, id, input.role).await
    }
}

pub struct UsersModule;

impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<List>();
        router.procedure::<ChangeRole>();
    }
}
