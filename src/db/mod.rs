//! SQLite storage adapter.
//!
//! Owns the pool, the schema and the optional FTS5 index. Every mutation
//! of the `events` table goes through [`mutations`], which writes the row
//! and its index entry inside the caller's transaction.

use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use tracing::info;

use crate::config::Config;

pub mod error;
pub mod mutations;
pub mod repair;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use mutations::{Column, ColumnAssignments, EventColumns, SearchIndex};
pub use schema::SearchIndexSetup;

/// Bounded wait for a contended write lock or a pooled connection.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

/// Binds a slice of [`SqlValue`]s, in order, onto any sqlx query type.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                $crate::db::SqlValue::Null => query.bind(None::<String>),
                $crate::db::SqlValue::Integer(value) => query.bind(*value),
                $crate::db::SqlValue::Text(value) => query.bind(value.as_str()),
            };
        }
        query
    }};
}
pub(crate) use bind_params;

#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub path: PathBuf,
    pub full_text_search: bool,
    pub autorepair: bool,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl StorageOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            full_text_search: true,
            autorepair: false,
            max_connections: 5,
            busy_timeout: BUSY_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            full_text_search: config.full_text_search,
            autorepair: config.db_autorepair,
            max_connections: config.max_connections,
            ..Self::new(config.database_path.clone())
        }
    }

    pub fn full_text_search(mut self, enabled: bool) -> Self {
        self.full_text_search = enabled;
        self
    }

    pub fn autorepair(mut self, enabled: bool) -> Self {
        self.autorepair = enabled;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true)
    }
}

/// Shared handle to the event store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    search_index: SearchIndex,
}

impl Database {
    /// Opens the store, creating the file and schema as needed.
    ///
    /// Full-text capability is decided here, once, and fixed for the life
    /// of the handle.
    pub async fn open(options: &StorageOptions) -> StorageResult<Self> {
        repair::check_integrity(options).await?;

        if let Some(parent) = options.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.busy_timeout)
            .connect_with(options.connect_options())
            .await?;

        let mut tx = pool.begin().await?;
        schema::create_schema(&mut tx).await?;
        let setup = schema::ensure_search_index(&mut tx, options.full_text_search).await?;
        tx.commit().await?;

        info!(
            path = %options.path.display(),
            search_index = ?setup,
            "Event store ready (WAL journal, busy timeout {:?})",
            options.busy_timeout
        );

        Ok(Self {
            pool,
            search_index: SearchIndex::new(setup == SearchIndexSetup::Ready),
        })
    }

    pub fn search_index(&self) -> SearchIndex {
        self.search_index
    }

    /// Whether a full-text index was available when the store was opened.
    pub fn has_search_index(&self) -> bool {
        self.search_index.is_enabled()
    }

    /// Looks the index table up in the catalog right now.
    pub async fn probe_search_index(&self) -> StorageResult<bool> {
        let mut conn = self.pool.acquire().await?;
        schema::table_exists(&mut *conn, schema::SEARCH_INDEX_TABLE).await
    }

    /// Starts a unit of work. Dropping the transaction without committing
    /// rolls it back and returns the connection to the pool.
    pub async fn begin(&self) -> StorageResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
