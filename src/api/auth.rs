//! Registration, login and the current identity.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::guard::Identity;
use crate::module::Module;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::users::{self, NewUser, User};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A signed token and the user it was issued to.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct Register;

impl Procedure for Register {
    fn meta() -> Meta {
        Meta::post("/api/auth/register")
            .summary("Create an account")
            .tag("auth")
            .status(201)
            .public()
    }

    type Input = NewUser;
    type Output = Session;

    async fn handle(ctx: Context, input: NewUser) -> crate::Result<Session> {
        let conn = ctx.connection()?;
        let user = users::register(&conn, input).await?;
        let token = auth::create_token(&ctx.config.auth, &user.identity())?;
        Ok(Session { token, user })
    }
}

pub struct Login;

impl Procedure for Login {
    fn meta() -> Meta {
        Meta::post("/api/auth/login")
            .summary("Exchange credentials for a token")
            .tag("auth")
            .public()
    }

    type Input = Credentials;
    type Output = Session;

    async fn handle(ctx: Context, input: Credentials) -> crate::Result<Session> {
        let conn = ctx.connection()?;
        let user = users::authenticate(&conn, &input.email, &input.password).await?;
        let token = auth::create_token(&ctx.config.auth, &user.identity())?;
        tracing::info!(user = %user.id, "Logged in");
        Ok(Session { token, user })
    }
}

pub struct Me;

impl Procedure for Me {
    fn meta() -> Meta {
        Meta::get("/api/auth/me")
            .summary("The caller's identity")
            .tag("auth")
    }

    type Input = Empty;
    type Output = Identity;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Identity> {
        ctx.require_identity().cloned()
    }
}

pub struct AuthModule;

impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<Register>();
        router.procedure::<Login>();
        router.procedure::<Me>();
    }
}
