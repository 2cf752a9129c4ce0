//! Request payloads and their validation into domain types.
//!
//! Text fields are trimmed before length checks, categories are case-folded
//! into [`Category`], and dates must be strict `YYYY-MM-DD`. Nothing that
//! fails here ever reaches the query compiler.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use super::event::{Category, EventChanges, EventFilter, EventQuery, NewEvent, Page, SortOrder};
use super::patch::Patch;

const TITLE_MAX_CHARS: usize = 200;
const LOCATION_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    pub category: String,
    pub date: String,
}

impl CreateEventRequest {
    pub fn validate(self) -> Result<NewEvent, ValidationError> {
        Ok(NewEvent {
            title: required_text("title", &self.title, TITLE_MAX_CHARS)?,
            description: self
                .description
                .as_deref()
                .map(|d| bounded_text("description", d, DESCRIPTION_MAX_CHARS))
                .transpose()?,
            location: required_text("location", &self.location, LOCATION_MAX_CHARS)?,
            category: parse_category("category", &self.category)?,
            date: parse_date("date", &self.date)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub location: Patch<String>,
    #[serde(default)]
    pub category: Patch<String>,
    #[serde(default)]
    pub date: Patch<String>,
}

impl UpdateEventRequest {
    pub fn validate(self) -> Result<EventChanges, ValidationError> {
        let description = match self.description {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(d) => Patch::Value(bounded_text("description", &d, DESCRIPTION_MAX_CHARS)?),
        };

        Ok(EventChanges {
            title: non_null("title", self.title)?
                .map(|t| required_text("title", &t, TITLE_MAX_CHARS))
                .transpose()?,
            description,
            location: non_null("location", self.location)?
                .map(|l| required_text("location", &l, LOCATION_MAX_CHARS))
                .transpose()?,
            category: non_null("category", self.category)?
                .map(|c| parse_category("category", &c))
                .transpose()?,
            date: non_null("date", self.date)?
                .map(|d| parse_date("date", &d))
                .transpose()?,
        })
    }
}

/// Raw search query string. Every field is taken as text so malformed
/// values surface as validation errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub starts_with: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
}

impl SearchParams {
    pub fn validate(self) -> Result<EventQuery, ValidationError> {
        let filter = EventFilter {
            q: non_blank(self.q),
            starts_with: self
                .starts_with
                .as_deref()
                .map(parse_initial)
                .transpose()?,
            location: non_blank(self.location),
            category: self
                .category
                .as_deref()
                .map(|c| parse_category("category", c))
                .transpose()?,
            date: self
                .date
                .as_deref()
                .map(|d| parse_date("date", d))
                .transpose()?,
            start_date: self
                .start_date
                .as_deref()
                .map(|d| parse_date("start_date", d))
                .transpose()?,
            end_date: self
                .end_date
                .as_deref()
                .map(|d| parse_date("end_date", d))
                .transpose()?,
        };

        let limit = match self.limit.as_deref() {
            None => Page::DEFAULT_LIMIT,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if (1..=Page::MAX_LIMIT).contains(&n) => n,
                _ => {
                    return Err(ValidationError::new(
                        "limit",
                        format!("must be an integer between 1 and {}", Page::MAX_LIMIT),
                    ))
                }
            },
        };

        let offset = match self.offset.as_deref() {
            None => 0,
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| i64::try_from(*n).is_ok())
                .ok_or_else(|| ValidationError::new("offset", "must be a non-negative integer"))?,
        };

        let sort = match self.sort.as_deref() {
            None => SortOrder::default(),
            Some(raw) => raw
                .parse::<SortOrder>()
                .map_err(|e| ValidationError::new("sort", e))?,
        };

        Ok(EventQuery {
            filter,
            sort,
            page: Page::new(limit, offset),
        })
    }
}

fn non_null(field: &'static str, value: Patch<String>) -> Result<Option<String>, ValidationError> {
    match value {
        Patch::Absent => Ok(None),
        Patch::Null => Err(ValidationError::new(field, "may not be null")),
        Patch::Value(v) => Ok(Some(v)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn bounded_text(field: &'static str, value: &str, max_chars: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn required_text(field: &'static str, value: &str, max_chars: usize) -> Result<String, ValidationError> {
    let text = bounded_text(field, value, max_chars)?;
    if text.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(text)
}

fn parse_category(field: &'static str, value: &str) -> Result<Category, ValidationError> {
    value.parse::<Category>().map_err(|_| {
        let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        ValidationError::new(field, format!("must be one of {}", allowed.join(", ")))
    })
}

/// Strict `YYYY-MM-DD`; chrono alone would also accept unpadded fields.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(ValidationError::new(field, "must be a date in YYYY-MM-DD format"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, "is not a valid calendar date"))
}

fn parse_initial(value: &str) -> Result<char, ValidationError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c),
        _ => Err(ValidationError::new("starts_with", "must be a single letter A-Z")),
    }
}
