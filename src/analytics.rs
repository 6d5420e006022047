//! View counting.
//!
//! Each `(content, visitor)` pair keeps its own counter, so total views is a
//! sum and unique visitors is a row count.

use libsql::Connection;
use schemars::JsonSchema;
use serde::Serialize;

use crate::db::params;
use crate::error::Result;

/// View totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Totals {
    pub views: u64,
    pub unique_visitors: u64,
}

/// One row of the top-content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Ranked {
    pub id: String,
    pub title: String,
    pub views: u64,
    pub unique_visitors: u64,
}

/// An author's totals and best-performing published items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Overview {
    pub totals: Totals,
    pub top_content: Vec<Ranked>,
}

/// Number of items in [`Overview::top_content`].
pub const TOP_CONTENT_LIMIT: u32 = 10;

fn count(value: i64) -> u64 {
    value.max(0) as u64
}

/// Count one view of `content_id` by `visitor_id`.
pub async fn record_view(conn: &Connection, content_id: &str, visitor_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO content_views (content_id, visitor_id, views) VALUES (?1, ?2, 1)
         ON CONFLICT (content_id, visitor_id) DO UPDATE SET views = views + 1",
        params![content_id, visitor_id],
    )
    .await?;
    Ok(())
}

/// Totals for a single item.
pub async fn for_content(conn: &Connection, content_id: &str) -> Result<Totals> {
    let mut rows = conn
        .query(
            "SELECT COALESCE(SUM(views), 0), COUNT(*) FROM content_views WHERE content_id = ?1",
            params![content_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Totals {
            views: count(row.get(0)?),
            unique_visitors: count(row.get(1)?),
        }),
        None => Ok(Totals::default()),
    }
}

/// Totals across everything `author_id` has written, plus their top
/// published items by views.
pub async fn overview(conn: &Connection, author_id: &str) -> Result<Overview> {
    let mut rows = conn
        .query(
            "SELECT COALESCE(SUM(v.views), 0), COUNT(v.visitor_id)
             FROM content c JOIN content_views v ON v.content_id = c.id
             WHERE c.author_id = ?1",
            params![author_id],
        )
        .await?;
    let totals = match rows.next().await? {
        Some(row) => Totals {
            views: count(row.get(0)?),
            unique_visitors: count(row.get(1)?),
        },
        None => Totals::default(),
    };

    let mut rows = conn
        .query(
            "SELECT c.id, c.title, COALESCE(SUM(v.views), 0) AS views, COUNT(v.visitor_id)
             FROM content c LEFT JOIN content_views v ON v.content_id = c.id
             WHERE c.author_id = ?1 AND c.status = 'published'
             GROUP BY c.id, c.title
             ORDER BY views DESC, c.published_at DESC
             LIMIT ?2",
            params![author_id, TOP_CONTENT_LIMIT as i64],
        )
        .await?;
    let mut top_content = Vec::new();
    while let Some(row) = rows.next().await? {
        top_content.push(Ranked {
            id: row.get(0)?,
            title: row.get(1)?,
            views: count(row.get(2)?),
            unique_visitors: count(row.get(3)?),
        });
    }

    Ok(Overview {
        totals,
        top_content,
    })
}
