use sqlx::{Sqlite, SqliteConnection};
use tracing::debug;

use super::mapper::{insert_columns, update_assignments, EventRow, EVENT_SELECT_LIST};
use super::query::{compile, CompiledQuery, SearchStrategy};
use crate::db::{bind_params, mutations, Database, StorageError, StorageResult};
use crate::models::{Event, EventChanges, EventQuery, NewEvent};

/// One page of search results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    pub items: Vec<Event>,
    pub total: i64,
}

/// Inserts an event and its search index entry in one transaction.
pub async fn create_event(db: &Database, event: &NewEvent) -> StorageResult<Event> {
    let mut tx = db.begin().await?;
    let id = mutations::insert_event(&mut tx, db.search_index(), &insert_columns(event)).await?;
    let created = fetch_event(&mut tx, id)
        .await?
        .ok_or_else(|| StorageError::Corrupt(format!("event {id} missing right after insert")))?;
    tx.commit().await?;

    debug!(id, "Event created");
    Ok(created)
}

pub async fn get_event(db: &Database, id: i64) -> StorageResult<Option<Event>> {
    let mut tx = db.begin().await?;
    let event = fetch_event(&mut tx, id).await?;
    tx.commit().await?;
    Ok(event)
}

/// Runs the page query and the count query against one read snapshot so
/// `total` always describes the same data as `items`.
pub async fn search_events(db: &Database, query: &EventQuery) -> StorageResult<EventPage> {
    let strategy = SearchStrategy::for_index(db.search_index());
    let compiled = compile(query, strategy);

    let mut tx = db.begin().await?;
    let items = list_events(&mut tx, &compiled.fetch).await?;
    let total = count_events(&mut tx, &compiled.count).await?;
    tx.commit().await?;

    debug!(?strategy, total, returned = items.len(), "Event search");
    Ok(EventPage { items, total })
}

pub async fn list_events(conn: &mut SqliteConnection, fetch: &CompiledQuery) -> StorageResult<Vec<Event>> {
    let rows: Vec<EventRow> = bind_params!(sqlx::query_as::<Sqlite, EventRow>(&fetch.sql), &fetch.params)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(Event::try_from).collect()
}

pub async fn count_events(conn: &mut SqliteConnection, count: &CompiledQuery) -> StorageResult<i64> {
    let total: i64 = bind_params!(sqlx::query_scalar::<Sqlite, i64>(&count.sql), &count.params)
        .fetch_one(conn)
        .await?;
    Ok(total)
}

/// Applies a sparse update. An empty change set returns the stored record
/// untouched; `None` means no event has this id.
pub async fn update_event(
    db: &Database,
    id: i64,
    changes: &EventChanges,
) -> StorageResult<Option<Event>> {
    if changes.is_empty() {
        return get_event(db, id).await;
    }

    let mut tx = db.begin().await?;
    let found =
        mutations::update_event(&mut tx, db.search_index(), id, &update_assignments(changes)).await?;
    if !found {
        return Ok(None);
    }
    let updated = fetch_event(&mut tx, id).await?;
    tx.commit().await?;

    debug!(id, "Event updated");
    Ok(updated)
}

/// Returns whether an event existed and was removed.
pub async fn delete_event(db: &Database, id: i64) -> StorageResult<bool> {
    let mut tx = db.begin().await?;
    let deleted = mutations::delete_event(&mut tx, db.search_index(), id).await?;
    tx.commit().await?;

    if deleted {
        debug!(id, "Event deleted");
    }
    Ok(deleted)
}

async fn fetch_event(conn: &mut SqliteConnection, id: i64) -> StorageResult<Option<Event>> {
    let sql = format!("SELECT {EVENT_SELECT_LIST} FROM events WHERE events.id = ?");
    let row: Option<EventRow> = sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?;
    row.map(Event::try_from).transpose()
}
