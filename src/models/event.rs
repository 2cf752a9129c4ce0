use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::patch::Patch;

/// A persisted event as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub category: Category,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Closed set of event categories. Stored and serialized in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Tech,
    Sports,
    Arts,
    Business,
    Community,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Music,
        Category::Tech,
        Category::Sports,
        Category::Arts,
        Category::Business,
        Category::Community,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Tech => "tech",
            Category::Sports => "sports",
            Category::Arts => "arts",
            Category::Business => "business",
            Category::Community => "community",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Result ordering. Every variant ends with an `id` tie-break in the same
/// direction so pages are stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    DateAsc,
    DateDesc,
    CreatedDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateAsc => "date_asc",
            SortOrder::DateDesc => "date_desc",
            SortOrder::CreatedDesc => "created_desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_asc" => Ok(SortOrder::DateAsc),
            "date_desc" => Ok(SortOrder::DateDesc),
            "created_desc" => Ok(SortOrder::CreatedDesc),
            other => Err(format!(
                "unknown sort '{other}', expected one of date_asc, date_desc, created_desc"
            )),
        }
    }
}

/// A validated event ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub category: Category,
    pub date: NaiveDate,
}

/// A validated sparse update. `description` distinguishes "leave alone"
/// from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Patch<String>,
    pub location: Option<String>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_absent()
            && self.location.is_none()
            && self.category.is_none()
            && self.date.is_none()
    }
}

/// Filters applied to a search. Absent fields add no predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub q: Option<String>,
    pub starts_with: Option<char>,
    pub location: Option<String>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(limit: u32, offset: u64) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub filter: EventFilter,
    pub sort: SortOrder,
    pub page: Page,
}
