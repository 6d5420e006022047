//! Content routes.
//!
//! Mutations of a single item look up its owner first and run the ownership
//! and permission checks before touching it.

use schemars::JsonSchema;
use serde::Serialize;

use crate::analytics;
use crate::content::{self, Content, Draft, Stats, Status, Summary};
use crate::guard;
use crate::module::Module;
use crate::permission::Permission;
use crate::procedure::{Empty, Meta, Procedure};
use crate::role::Role;
use crate::router::{Context, Router};

/// Items shown under "recent" on the dashboard.
pub const DASHBOARD_RECENT: u32 = 5;

pub struct Create;

impl Procedure for Create {
    fn meta() -> Meta {
        Meta::post("/api/content")
            .summary("Create content")
            .tag("content")
            .status(201)
            .requires(Role::Editor)
    }

    type Input = Draft;
    type Output = Content;

    async fn handle(ctx: Context, input: Draft) -> crate::Result<Content> {
        let author = ctx.require_identity()?;
        guard::require_permission(author, Permission::CreateContent)?;
        content::create(&ctx.connection()?, &author.id, input).await
    }
}

pub struct ListMine;

impl Procedure for ListMine {
    fn meta() -> Meta {
        Meta::get("/api/content")
            .summary("The caller's drafts and published items")
            .tag("content")
    }

    type Input = Empty;
    type Output = Vec<Content>;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Vec<Content>> {
        let who = ctx.require_identity()?;
        content::list_by_author(&ctx.connection()?, &who.id).await
    }
}

pub struct ListPublished;

impl Procedure for ListPublished {
    fn meta() -> Meta {
        Meta::get("/api/content/published")
            .summary("All published content")
            .tag("content")
    }

    type Input = Empty;
    type Output = Vec<Content>;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Vec<Content>> {
        content::list_published(&ctx.connection()?).await
    }
}

pub struct Read;

impl Procedure for Read {
    fn meta() -> Meta {
        Meta::get("/api/content/{id}")
            .summary("Read one item")
            .tag("content")
    }

    type Input = Empty;
    type Output = Content;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Content> {
        let who = ctx.require_identity()?;
        let id = ctx.require_param("id")?;
        let conn = ctx.connection()?;

        let item = content::get(&conn, id).await?;
        if guard::can_access_resource(who.role, &who.id, &item.author_id) {
            return Ok(item);
        }
        // Unpublished items are invisible to everyone but owner and admins
        if item.status != Status::Published {
            return Err(crate::Error::NotFound(format!("content {id}")));
        }
        analytics::record_view(&conn, &item.id, &who.id).await?;
        Ok(item)
    }
}

pub struct Update;

impl Procedure for Update {
    fn meta() -> Meta {
        Meta::put("/api/content/{id}")
            .summary("Edit an item")
            .tag("content")
            .requires(Role::Editor)
    }

    type Input = Draft;
    type Output = Content;

    async fn handle(ctx: Context, input: Draft) -> crate::Result<Content> {
        let who = ctx.require_identity()?;
        let id = ctx.require_param("id")?;
        let conn = ctx.connection()?;

        let owner = content::owner_of(&conn, id).await?;
        guard::require_owned_or_any(
            who,
            &owner,
            Permission::EditOwnContent,
            Permission::EditAnyContent,
        )?;
        content::update(&conn, id, input).await
    }
}

pub struct Publish;

impl Procedure for Publish {
    fn meta() -> Meta {
        Meta::post("/api/content/{id}/publish")
            .summary("Publish an item")
            .tag("content")
            .requires(Role::Editor)
    }

    type Input = Empty;
    type Output = Content;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Content> {
        let who = ctx.require_identity()?;
        let id = ctx.require_param("id")?;
        let conn = ctx.connection()?;

        let owner = content::owner_of(&conn, id).await?;
        guard::require_resource_access(who, &owner)?;
        guard::require_permission(who, Permission::PublishContent)?;
        content::publish(&conn, id).await
    }
}

pub struct Archive;

impl Procedure for Archive {
    fn meta() -> Meta {
        Meta::delete("/api/content/{id}")
            .summary("Archive an item")
            .tag("content")
            .requires(Role::Editor)
    }

    type Input = Empty;
    type Output = Content;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Content> {
        let who = ctx.require_identity()?;
        let id = ctx.require_param("id")?;
        let conn = ctx.connection()?;

        let owner = content::owner_of(&conn, id).await?;
        guard::require_owned_or_any(
            who,
            &owner,
            Permission::DeleteOwnContent,
            Permission::DeleteAnyContent,
        )?;
        content::archive(&conn, id).await
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Dashboard {
    pub stats: Stats,
    pub recent: Vec<Summary>,
}

pub struct ShowDashboard;

impl Procedure for ShowDashboard {
    fn meta() -> Meta {
        Meta::get("/api/dashboard")
            .summary("Counts and recent items for the caller")
            .tag("content")
    }

    type Input = Empty;
    type Output = Dashboard;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Dashboard> {
        let who = ctx.require_identity()?;
        let conn = ctx.connection()?;
        Ok(Dashboard {
            stats: content::stats(&conn, &who.id).await?,
            recent: content::recent(&conn, &who.id, DASHBOARD_RECENT).await?,
        })
    }
}

pub struct ContentModule;

impl Module for ContentModule {
    fn name(&self) -> &'static str {
        "content"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<Create>();
        router.procedure::<ListMine>();
        router.procedure::<ListPublished>();
        router.procedure::<Read>();
        router.procedure::<Update>();
        router.procedure::<Publish>();
        router.procedure::<Archive>();
        router.procedure::<ShowDashboard>();
    }
}
