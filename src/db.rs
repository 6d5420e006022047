//! Database connection and schema.
//!
//! Supports multiple backends:
//! - Local SQLite file: `path/to/db.sqlite` or `file:path` or `sqlite://path`
//! - In-memory: `:memory:`
//! - Remote Turso: `libsql://...` or `https://...` (requires TURSO_AUTH_TOKEN env var)

use std::sync::Arc;
use std::time::Duration;

use libsql::{Builder, Connection, Database};

/// Shared database handle.
pub type Handle = Arc<Database>;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS content (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    slug TEXT NOT NULL,
    body TEXT NOT NULL,
    excerpt TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    author_id TEXT NOT NULL REFERENCES users(id),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    published_at INTEGER
);

CREATE INDEX IF NOT EXISTS content_author_idx ON content(author_id, created_at);

CREATE TABLE IF NOT EXISTS content_views (
    content_id TEXT NOT NULL REFERENCES content(id),
    visitor_id TEXT NOT NULL,
    views INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (content_id, visitor_id)
);
"#;

/// Connect to the database.
///
/// # URL formats
/// - Local file: `mydata.db`, `file:path/to/db.sqlite`, `sqlite://path`
/// - In-memory: `:memory:`
/// - Remote Turso: `libsql://your-db.turso.io` (requires `TURSO_AUTH_TOKEN` env var)
pub async fn connect(url: &str) -> crate::Result<Handle> {
    let db = if url.starts_with("libsql://") || url.starts_with("https://") {
        // Remote Turso database
        let token = std::env::var("TURSO_AUTH_TOKEN").map_err(|_| {
            crate::Error::Config("TURSO_AUTH_TOKEN not set for remote database".into())
        })?;
        Builder::new_remote(url.to_string(), token).build().await?
    } else if url == ":memory:" {
        Builder::new_local(":memory:").build().await?
    } else {
        // Local file - strip sqlite:// or file: prefix if present
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        let db = Builder::new_local(path).build().await?;
        // Readers must not block the single writer
        db.connect()?
            .query("PRAGMA journal_mode = WAL", ())
            .await?;
        db
    };

    Ok(Arc::new(db))
}

/// Get a connection from the database.
///
/// Local connections wait up to [`BUSY_TIMEOUT`] for a competing writer
/// instead of failing with `SQLITE_BUSY`.
pub fn connection(db: &Database) -> crate::Result<Connection> {
    let conn = db.connect()?;
    if let Err(e) = conn.busy_timeout(BUSY_TIMEOUT) {
        tracing::debug!("busy timeout not applied: {e}");
    }
    Ok(conn)
}

/// Create tables and indexes if they do not exist.
pub async fn migrate(db: &Database) -> crate::Result<()> {
    let conn = connection(db)?;
    conn.execute_batch(SCHEMA).await?;
    tracing::debug!("Database schema is up to date");
    Ok(())
}

/// Current time as Unix seconds.
pub(crate) fn now() -> i64 {
    jiff::Timestamp::now().as_second()
}

// Re-export commonly used libsql types for convenience
pub use libsql::{Row, params};

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A migrated file-backed database that lives as long as the returned
    /// tempdir.
    pub async fn database() -> (tempfile::TempDir, Handle) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = connect(path.to_str().unwrap()).await.unwrap();
        migrate(&db).await.unwrap();
        (dir, db)
    }
}
