//! Inkstone - role-gated content management backend.
//!
//! Every protected operation runs behind a two-layer check: the caller's role
//! must satisfy the route's minimum role, and mutations of a single item also
//! require ownership (or the admin role).
//!
//! - **Role**: `viewer < editor < admin` with a fixed permission table
//! - **Guard**: authorize-then-run wrapping, so denied calls never run
//! - **Config**: Layered configuration (file → env → CLI)
//! - **Database**: libsql/Turso storage for users, content and views
//! - **Auth**: Argon2 password hashing and JWT identities
//! - **Router**: HTTP routing with path parameters and per-route access
//! - **Server**: Hyper-based HTTP server
//! - **Module**: Trait for pluggable API modules
//!
//! # Example
//!
//! ```ignore
//! use inkstone::{ConfigLoader, Router, api, config::Overrides};
//!
//! #[tokio::main]
//! async fn main() -> inkstone::Result<()> {
//!     let config = ConfigLoader::new("INKSTONE").load(None, Overrides::default())?;
//!     let db = inkstone::db::connect(&config.database.url).await?;
//!
//!     let router = api::router()?;
//!     let server = inkstone::server::start(config, Some(db), router.into_handle()).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await
//! }
//! ```

pub mod ai;
pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod guard;
pub mod module;
pub mod openapi;
pub mod operation;
pub mod permission;
pub mod procedure;
pub mod rate_limit;
pub mod response;
pub mod role;
pub mod router;
pub mod server;
pub mod users;

// Re-export main types at crate root
pub use config::{Config, ConfigLoader};
pub use db::Handle as DbHandle;
pub use error::{Error, Result};
pub use guard::{Decision, Identity, authorize, can_access_resource};
pub use module::Module;
pub use openapi::Info;
pub use permission::{Permission, has_permission};
pub use procedure::{Access, Empty, Meta, Procedure};
pub use role::Role;
pub use router::{Context, Router};

// Re-export commonly used dependencies for convenience
pub use hyper::Method;
pub use serde_json::json;
