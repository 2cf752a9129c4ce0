use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, info, warn};

use super::error::StorageResult;

pub const SEARCH_INDEX_TABLE: &str = "events_fts";

const CREATE_EVENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        location TEXT NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
"#;

/// Value indexes backing the compiler's predicates and sort orders. The
/// lowercased ones match the `LOWER(column)` comparisons it emits.
const CREATE_VALUE_INDEXES: [&str; 5] = [
    "CREATE INDEX IF NOT EXISTS idx_events_date ON events(date)",
    "CREATE INDEX IF NOT EXISTS idx_events_category ON events(LOWER(category))",
    "CREATE INDEX IF NOT EXISTS idx_events_location ON events(LOWER(location))",
    "CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_events_title ON events(LOWER(title))",
];

const CREATE_SEARCH_INDEX: &str =
    "CREATE VIRTUAL TABLE IF NOT EXISTS events_fts USING fts5(title, description)";

/// Outcome of trying to provide the full-text index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIndexSetup {
    Ready,
    Disabled,
    Unsupported,
}

pub async fn create_schema(tx: &mut Transaction<'_, Sqlite>) -> StorageResult<()> {
    sqlx::query(CREATE_EVENTS_TABLE).execute(&mut **tx).await?;
    for ddl in CREATE_VALUE_INDEXES {
        sqlx::query(ddl).execute(&mut **tx).await?;
    }
    debug!("Events table and value indexes ensured");
    Ok(())
}

/// Creates (or drops, when `enabled` is false) the full-text index.
///
/// A missing FTS5 module is not an error: the caller gets
/// [`SearchIndexSetup::Unsupported`] and searches fall back to substring
/// matching for the lifetime of the handle.
pub async fn ensure_search_index(
    tx: &mut Transaction<'_, Sqlite>,
    enabled: bool,
) -> StorageResult<SearchIndexSetup> {
    if !enabled {
        // A stale index left behind would silently diverge from the table.
        sqlx::query("DROP TABLE IF EXISTS events_fts")
            .execute(&mut **tx)
            .await?;
        info!("Full-text search disabled by configuration");
        return Ok(SearchIndexSetup::Disabled);
    }

    let existed = table_exists(&mut **tx, SEARCH_INDEX_TABLE).await?;

    if let Err(err) = sqlx::query(CREATE_SEARCH_INDEX).execute(&mut **tx).await {
        if is_missing_fts5(&err) {
            info!("SQLite FTS5 not available; continuing without full-text index");
            return Ok(SearchIndexSetup::Unsupported);
        }
        return Err(err.into());
    }

    if !existed {
        let backfilled = sqlx::query(
            "INSERT INTO events_fts (rowid, title, description) \
             SELECT id, title, description FROM events",
        )
        .execute(&mut **tx)
        .await?
        .rows_affected();
        info!(backfilled, "Full-text index created");
    } else {
        reconcile_search_index(tx).await?;
    }

    Ok(SearchIndexSetup::Ready)
}

/// Repairs membership drift between the table and the index: missing
/// entries are added and orphans removed.
async fn reconcile_search_index(tx: &mut Transaction<'_, Sqlite>) -> StorageResult<()> {
    let added = sqlx::query(
        "INSERT INTO events_fts (rowid, title, description) \
         SELECT id, title, description FROM events \
         WHERE id NOT IN (SELECT rowid FROM events_fts)",
    )
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let removed = sqlx::query(
        "DELETE FROM events_fts WHERE rowid NOT IN (SELECT id FROM events)",
    )
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if added > 0 || removed > 0 {
        warn!(added, removed, "Full-text index was out of sync and has been reconciled");
    }
    Ok(())
}

pub async fn table_exists(conn: &mut SqliteConnection, name: &str) -> StorageResult<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_optional(conn)
            .await?;
    Ok(found.is_some())
}

fn is_missing_fts5(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| {
            let message = db.message().to_ascii_lowercase();
            message.contains("fts5") || message.contains("no such module")
        })
        .unwrap_or(false)
}
