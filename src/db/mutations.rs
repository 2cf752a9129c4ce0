use sqlx::{Sqlite, Transaction};

use super::error::StorageResult;
use super::{bind_params, SqlValue};

/// Whether mutations must keep the FTS5 index in step with the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchIndex {
    enabled: bool,
}

impl SearchIndex {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Writable columns of the `events` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    Description,
    Location,
    Category,
    Date,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Description => "description",
            Column::Location => "location",
            Column::Category => "category",
            Column::Date => "date",
        }
    }
}

/// Storage-ready values for a full insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventColumns {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub category: &'static str,
    pub date: String,
}

/// Storage-ready `SET` list for a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAssignments(Vec<(Column, SqlValue)>);

impl ColumnAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: Column, value: SqlValue) {
        self.0.push((column, value));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Column, SqlValue)> {
        self.0.iter()
    }
}

/// Inserts a row and its index entry. Returns the assigned id.
pub async fn insert_event(
    tx: &mut Transaction<'_, Sqlite>,
    index: SearchIndex,
    row: &EventColumns,
) -> StorageResult<i64> {
    let id = sqlx::query(
        "INSERT INTO events (title, description, location, category, date) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&row.title)
    .bind(row.description.as_deref())
    .bind(&row.location)
    .bind(row.category)
    .bind(&row.date)
    .execute(&mut **tx)
    .await?
    .last_insert_rowid();

    if index.is_enabled() {
        sqlx::query("INSERT INTO events_fts (rowid, title, description) VALUES (?, ?, ?)")
            .bind(id)
            .bind(&row.title)
            .bind(row.description.as_deref())
            .execute(&mut **tx)
            .await?;
    }

    Ok(id)
}

/// Applies `assignments` to one row and replaces its index entry with the
/// row's new content. Returns `false` when no such row exists.
pub async fn update_event(
    tx: &mut Transaction<'_, Sqlite>,
    index: SearchIndex,
    id: i64,
    assignments: &ColumnAssignments,
) -> StorageResult<bool> {
    if assignments.is_empty() {
        return row_exists(tx, id).await;
    }

    let set_list: Vec<String> = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column.as_str()))
        .collect();
    let sql = format!("UPDATE events SET {} WHERE id = ?", set_list.join(", "));
    let values: Vec<SqlValue> = assignments
        .iter()
        .map(|(_, value)| value.clone())
        .chain(std::iter::once(SqlValue::Integer(id)))
        .collect();

    let updated = bind_params!(sqlx::query::<Sqlite>(&sql), &values)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    if updated == 0 {
        return Ok(false);
    }

    if index.is_enabled() {
        remove_index_entry(tx, id).await?;
        sqlx::query(
            "INSERT INTO events_fts (rowid, title, description) \
             SELECT id, title, description FROM events WHERE id = ?",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(true)
}

/// Deletes a row and its index entry. Returns `false` when no such row
/// exists.
pub async fn delete_event(
    tx: &mut Transaction<'_, Sqlite>,
    index: SearchIndex,
    id: i64,
) -> StorageResult<bool> {
    let deleted = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if deleted > 0 && index.is_enabled() {
        remove_index_entry(tx, id).await?;
    }

    Ok(deleted > 0)
}

async fn remove_index_entry(tx: &mut Transaction<'_, Sqlite>, id: i64) -> StorageResult<()> {
    sqlx::query("DELETE FROM events_fts WHERE rowid = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn row_exists(tx: &mut Transaction<'_, Sqlite>, id: i64) -> StorageResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM events WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}
