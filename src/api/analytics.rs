use crate::analytics::{self, Overview, Totals};
use crate::content::{self, Status};
use crate::guard;
use crate::module::Module;
use crate::permission::Permission;
use crate::procedure::{Empty, Meta, Procedure};
use crate::role::Role;
use crate::router::{Context, Router};

pub struct MyOverview;

impl Procedure for MyOverview {
    fn meta() -> Meta {
        Meta::get("/api/analytics")
            .summary("View totals and top content for the caller")
            .tag("analytics")
            .requires(Role::Editor)
    }

    type Input = Empty;
    type Output = Overview;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Overview> {
        let who = ctx.require_identity()?;
        guard::require_permission(who, Permission::ViewAnalytics)?;
        analytics::overview(&ctx.connection()?, &who.id).await
    }
}

pub struct ForContent;

impl Procedure for ForContent {
    fn meta() -> Meta {
        Meta::get("/api/content/{id}/analytics")
            .summary("View totals for one item")
            .tag("analytics")
    }

    type Input = Empty;
    type Output = Totals;

    async fn handle(ctx: Context, _input: Empty) -> crate::Result<Totals> {
        let who = ctx.require_identity()?;
        let id = ctx.require_param("id")?;
        let conn = ctx.connection()?;

        let item = content::get(&conn, id).await?;
        // Other users' drafts stay hidden, as on the read route
        if item.status != Status::Published
            && !guard::can_access_resource(who.role, &who.id, &item.author_id)
        {
            return Err(crate::Error::NotFound(format!("content {id}")));
        }
        guard::require_resource_access(who, &item.author_id)?;
        analytics::for_content(&conn, id).await
    }
}

pub struct AnalyticsModule;

impl Module for AnalyticsModule {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<MyOverview>();
        router.procedure::<ForContent>();
    }
}
