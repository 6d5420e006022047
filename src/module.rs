//! Module trait for pluggable API modules.
//!
//! Modules implement the `Module` trait to register their routes with the server.
//!
//! # Example
//!
//! ```ignore
//! use inkstone::{Empty, Meta, Module, Procedure, Role, Router};
//!
//! pub struct Reports;
//!
//! impl Procedure for Reports {
//!     fn meta() -> Meta {
//!         Meta::get("/api/reports").requires(Role::Admin)
//!     }
//!     type Input = Empty;
//!     type Output = Vec<String>;
//!     async fn handle(_ctx: inkstone::Context, _input: Empty) -> inkstone::Result<Vec<String>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! pub struct ReportsModule;
//!
//! impl Module for ReportsModule {
//!     fn name(&self) -> &'static str {
//!         "reports"
//!     }
//!
//!     fn routes(&self, router: &mut Router) {
//!         router.procedure::<Reports>();
//!     }
//! }
//! ```

use crate::router::Router;

/// A pluggable API module.
///
/// Modules register their routes with the router and can hold their own state.
/// The state is captured in closures when registering routes.
pub trait Module: Send + Sync {
    /// Module name for identification and logging.
    fn name(&self) -> &'static str;

    /// Register routes with the router.
    ///
    /// Modules should register all their routes here.
    fn routes(&self, router: &mut Router);
}
