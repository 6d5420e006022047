//! HTTP API modules.
//!
//! Each submodule is a [`Module`] that registers its routes; [`router`]
//! assembles them together with `/openapi.json`.

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod content;
pub mod health;
pub mod users;

use crate::error::Result;
use crate::module::Module;
use crate::openapi::Info;
use crate::router::Router;

/// Build the full application router.
pub fn router() -> Result<Router> {
    let modules: Vec<Box<dyn Module>> = vec![
        Box::new(health::HealthModule),
        Box::new(auth::AuthModule),
        Box::new(users::UsersModule),
        Box::new(content::ContentModule),
        Box::new(analytics::AnalyticsModule),
        Box::new(ai::AiModule),
    ];

    let mut router = Router::new();
    for module in &modules {
        tracing::debug!(module = module.name(), "Registering routes");
        module.routes(&mut router);
    }

    router.openapi(
        "/openapi.json",
        Info {
            title: "Inkstone",
            version: env!("CARGO_PKG_VERSION"),
        },
    )?;
    Ok(router)
}
