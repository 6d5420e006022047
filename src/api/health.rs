use schemars::JsonSchema;
use serde::Serialize;

use crate::module::Module;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};

#[derive(Debug, Serialize, JsonSchema)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub struct Check;

impl Procedure for Check {
    fn meta() -> Meta {
        Meta::get("/health")
            .summary("Health check")
            .tag("system")
            .public()
    }

    type Input = Empty;
    type Output = Health;

    async fn handle(_ctx: Context, _input: Empty) -> crate::Result<Health> {
        Ok(Health {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        })
    }
}

pub struct HealthModule;

impl Module for HealthModule {
    fn name(&self) -> &'static str {
        "health"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<Check>();
    }
}
