//! Content items and their lifecycle.
//!
//! ```text
//! draft ──publish──▶ published
//!   │                   │
//!   └──────archive──────┴──▶ archived (frozen)
//! ```
//!
//! Functions here do not check authorization; callers run the guard first.
//! [`Status::check_transition`] is the single place lifecycle rules live.

use std::fmt;
use std::str::FromStr;

use libsql::Connection;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::db::{self, Row, params};
use crate::error::{Error, Result};

/// Lifecycle state of a content item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
    Archived,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Archived => "archived",
        }
    }

    /// Whether moving from `self` to `next` is allowed.
    pub const fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Draft, Status::Draft | Status::Published)
                | (Status::Published, Status::Published)
                | (_, Status::Archived)
        )
    }

    pub fn check_transition(self, next: Status) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::Conflict(format!(
                "cannot move content from {self} to {next}"
            )))
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            "archived" => Ok(Status::Archived),
            other => Err(Error::Internal(format!("Stored status is invalid: {other}"))),
        }
    }
}

/// A stored content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Content {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: String,
    pub status: Status,
    /// Fixed at creation.
    pub author_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub published_at: Option<i64>,
}

impl Content {
    fn from_row(row: &Row) -> Result<Self> {
        let status: String = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            body: row.get(3)?,
            excerpt: row.get(4)?,
            status: status.parse()?,
            author_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            published_at: row.get(9)?,
        })
    }
}

/// Brief listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Summary {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub created_at: i64,
}

/// Create or update input.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Draft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// `draft` (default) or `published`.
    #[serde(default)]
    pub status: Option<Status>,
}

impl Draft {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(Error::BadRequest("Title and body are required".into()));
        }
        if slugify(&self.title).is_empty() {
            return Err(Error::BadRequest(
                "Title must contain at least one letter or digit".into(),
            ));
        }
        Ok(())
    }
}

/// Per-status counts for one author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Stats {
    pub total: u64,
    pub drafts: u64,
    pub published: u64,
    pub archived: u64,
}

/// Lowercase the title and collapse every run of non-alphanumeric ASCII into
/// a single `-`, trimming dashes at both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

const COLUMNS: &str =
    "id, title, slug, body, excerpt, status, author_id, created_at, updated_at, published_at";

/// Insert a new item owned by `author_id`.
pub async fn create(conn: &Connection, author_id: &str, input: Draft) -> Result<Content> {
    input.validate()?;
    let status = input.status.unwrap_or(Status::Draft);
    if status == Status::Archived {
        return Err(Error::BadRequest(
            "New content must be draft or published".into(),
        ));
    }

    let now = db::now();
    let content = Content {
        id: uuid::Uuid::new_v4().to_string(),
        slug: slugify(&input.title),
        title: input.title,
        body: input.body,
        excerpt: input.excerpt.unwrap_or_default(),
        status,
        author_id: author_id.to_string(),
        created_at: now,
        updated_at: now,
        published_at: (status == Status::Published).then_some(now),
    };

    conn.execute(
        "INSERT INTO content (id, title, slug, body, excerpt, status, author_id, created_at, updated_at, published_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, CASE WHEN ?6 = 'published' THEN ?8 END)",
        params![
            content.id.as_str(),
            content.title.as_str(),
            content.slug.as_str(),
            content.body.as_str(),
            content.excerpt.as_str(),
            content.status.as_str(),
            content.author_id.as_str(),
            now
        ],
    )
    .await?;

    tracing::info!(content = %content.id, author = %author_id, status = %status, "Created content");
    Ok(content)
}

pub async fn find(conn: &Connection, id: &str) -> Result<Option<Content>> {
    let mut rows = conn
        .query(
            &format!("SELECT {COLUMNS} FROM content WHERE id = ?1"),
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Content::from_row(&row)?)),
        None => Ok(None),
    }
}

/// Like [`find`], but a missing item is `NotFound`.
pub async fn get(conn: &Connection, id: &str) -> Result<Content> {
    find(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("content {id}")))
}

/// Owner id of an item, for guard checks.
pub async fn owner_of(conn: &Connection, id: &str) -> Result<String> {
    let mut rows = conn
        .query("SELECT author_id FROM content WHERE id = ?1", params![id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Err(Error::NotFound(format!("content {id}"))),
    }
}

/// An author's non-archived items, newest first.
pub async fn list_by_author(conn: &Connection, author_id: &str) -> Result<Vec<Content>> {
    collect(
        conn,
        &format!(
            "SELECT {COLUMNS} FROM content WHERE author_id = ?1 AND status != 'archived'
             ORDER BY created_at DESC, id"
        ),
        params![author_id],
    )
    .await
}

/// Every published item, most recently published first.
pub async fn list_published(conn: &Connection) -> Result<Vec<Content>> {
    collect(
        conn,
        &format!(
            "SELECT {COLUMNS} FROM content WHERE status = 'published'
             ORDER BY published_at DESC, id"
        ),
        (),
    )
    .await
}

async fn collect(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<Vec<Content>> {
    let mut rows = conn.query(sql, params).await?;
    let mut items = Vec::new();
    while let Some(row) = rows.next().await? {
        items.push(Content::from_row(&row)?);
    }
    Ok(items)
}

/// Replace title, body, excerpt and (optionally) status.
pub async fn update(conn: &Connection, id: &str, input: Draft) -> Result<Content> {
    input.validate()?;
    let current = get(conn, id).await?;
    if current.status == Status::Archived {
        return Err(Error::Conflict("archived content cannot be edited".into()));
    }
    let next = input.status.unwrap_or(current.status);
    if next == Status::Archived {
        return Err(Error::BadRequest("Use DELETE to archive content".into()));
    }
    current.status.check_transition(next)?;

    let now = db::now();
    let published_at = match (current.published_at, next) {
        (None, Status::Published) => Some(now),
        (existing, _) => existing,
    };
    let updated = Content {
        slug: slugify(&input.title),
        title: input.title,
        body: input.body,
        excerpt: input.excerpt.unwrap_or(current.excerpt),
        status: next,
        updated_at: now,
        published_at,
        ..current
    };

    conn.execute(
        "UPDATE content SET title = ?1, slug = ?2, body = ?3, excerpt = ?4, status = ?5,
         updated_at = ?6, published_at = COALESCE(published_at, CASE WHEN ?5 = 'published' THEN ?6 END)
         WHERE id = ?7",
        params![
            updated.title.as_str(),
            updated.slug.as_str(),
            updated.body.as_str(),
            updated.excerpt.as_str(),
            updated.status.as_str(),
            now,
            id
        ],
    )
    .await?;

    tracing::info!(content = %id, status = %next, "Updated content");
    Ok(updated)
}

/// Move to `next`, stamping `published_at` on first publication.
///
/// Repeating a transition the item already made is a no-op.
pub async fn transition(conn: &Connection, id: &str, next: Status) -> Result<Content> {
    let current = get(conn, id).await?;
    current.status.check_transition(next)?;
    if current.status == next {
        return Ok(current);
    }

    let now = db::now();
    conn.execute(
        "UPDATE content SET status = ?1, updated_at = ?2,
         published_at = COALESCE(published_at, CASE WHEN ?1 = 'published' THEN ?2 END)
         WHERE id = ?3",
        params![next.as_str(), now, id],
    )
    .await?;

    tracing::info!(content = %id, from = %current.status, to = %next, "Content transition");
    get(conn, id).await
}

pub async fn publish(conn: &Connection, id: &str) -> Result<Content> {
    transition(conn, id, Status::Published).await
}

/// Soft delete.
pub async fn archive(conn: &Connection, id: &str) -> Result<Content> {
    transition(conn, id, Status::Archived).await
}

/// Per-status counts for an author.
pub async fn stats(conn: &Connection, author_id: &str) -> Result<Stats> {
    let mut rows = conn
        .query(
            "SELECT status, COUNT(*) FROM content WHERE author_id = ?1 GROUP BY status",
            params![author_id],
        )
        .await?;
    let mut stats = Stats::default();
    while let Some(row) = rows.next().await? {
        let status: String = row.get(0)?;
        let count = row.get::<i64>(1)?.max(0) as u64;
        match status.parse()? {
            Status::Draft => stats.drafts = count,
            Status::Published => stats.published = count,
            Status::Archived => stats.archived = count,
        }
        stats.total += count;
    }
    Ok(stats)
}

/// An author's `limit` most recent non-archived items.
pub async fn recent(conn: &Connection, author_id: &str, limit: u32) -> Result<Vec<Summary>> {
    let mut rows = conn
        .query(
            "SELECT id, title, status, created_at FROM content
             WHERE author_id = ?1 AND status != 'archived'
             ORDER BY created_at DESC, id LIMIT ?2",
            params![author_id, limit as i64],
        )
        .await?;
    let mut items = Vec::new();
    while let Some(row) = rows.next().await? {
        let status: String = row.get(2)?;
        items.push(Summary {
            id: row.get(0)?,
            title: row.get(1)?,
            status: status.parse()?,
            created_at: row.get(3)?,
        });
    }
    Ok(items)
}
