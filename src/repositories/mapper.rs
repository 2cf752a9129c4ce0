use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::FromRow;

use crate::db::{Column, ColumnAssignments, EventColumns, SqlValue, StorageError};
use crate::models::{Event, EventChanges, NewEvent, Patch};

/// Qualified select list; the full-text join would otherwise make `title`
/// and `description` ambiguous.
pub const EVENT_SELECT_LIST: &str = "events.id, events.title, events.description, \
     events.location, events.category, events.date, events.created_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// An `events` row exactly as stored.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub category: String,
    pub date: String,
    pub created_at: String,
}

impl TryFrom<EventRow> for Event {
    type Error = StorageError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("event {}: {e}", row.id)))?;
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT).map_err(|e| {
            StorageError::Corrupt(format!("event {}: bad date '{}': {e}", row.id, row.date))
        })?;
        let created_at = parse_timestamp(&row.created_at).ok_or_else(|| {
            StorageError::Corrupt(format!(
                "event {}: bad created_at '{}'",
                row.id, row.created_at
            ))
        })?;

        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            category,
            date,
            created_at,
        })
    }
}

/// RFC 3339 as written by the table default; SQLite's own
/// `CURRENT_TIMESTAMP` layout is accepted too.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ts| ts.and_utc())
        })
}

pub fn date_param(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn insert_columns(event: &NewEvent) -> EventColumns {
    EventColumns {
        title: event.title.clone(),
        description: event.description.clone(),
        location: event.location.clone(),
        category: event.category.as_str(),
        date: date_param(event.date),
    }
}

pub fn update_assignments(changes: &EventChanges) -> ColumnAssignments {
    let mut assignments = ColumnAssignments::new();
    if let Some(title) = &changes.title {
        assignments.set(Column::Title, SqlValue::Text(title.clone()));
    }
    match &changes.description {
        Patch::Absent => {}
        Patch::Null => assignments.set(Column::Description, SqlValue::Null),
        Patch::Value(text) => assignments.set(Column::Description, SqlValue::Text(text.clone())),
    }
    if let Some(location) = &changes.location {
        assignments.set(Column::Location, SqlValue::Text(location.clone()));
    }
    if let Some(category) = changes.category {
        assignments.set(Column::Category, SqlValue::Text(category.as_str().to_string()));
    }
    if let Some(date) = changes.date {
        assignments.set(Column::Date, SqlValue::Text(date_param(date)));
    }
    assignments
}
