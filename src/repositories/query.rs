//! Search query compiler.
//!
//! Turns an [`EventQuery`] into a paginated fetch statement and an
//! unpaginated count statement. Both are rendered from one [`FilterClause`],
//! so they always agree on the joined tables, the predicate text and the
//! bound values. User input only ever travels as bound parameters.

use chrono::NaiveDate;

use super::mapper::{date_param, EVENT_SELECT_LIST};
use crate::db::{SearchIndex, SqlValue};
use crate::models::{Category, EventFilter, EventQuery, SortOrder};

const SEARCH_INDEX_JOIN: &str = "JOIN events_fts ON events_fts.rowid = events.id";

/// How the free-text `q` filter is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Prefix match of every token against the FTS5 index.
    FullText,
    /// Case-insensitive substring match on title or description.
    Substring,
}

impl SearchStrategy {
    pub fn for_index(index: SearchIndex) -> Self {
        if index.is_enabled() {
            SearchStrategy::FullText
        } else {
            SearchStrategy::Substring
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSearch {
    pub fetch: CompiledQuery,
    pub count: CompiledQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Matches(String),
    TextContains(String),
    TitleStartsWith(char),
    LocationContains(String),
    CategoryIs(Category),
    DateIs(NaiveDate),
    DateFrom(NaiveDate),
    DateUntil(NaiveDate),
}

impl Predicate {
    fn render(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            Predicate::Matches(expression) => {
                params.push(SqlValue::Text(expression.clone()));
                "events_fts MATCH ?".to_string()
            }
            Predicate::TextContains(needle) => {
                let pattern = contains_pattern(needle);
                params.push(SqlValue::Text(pattern.clone()));
                params.push(SqlValue::Text(pattern));
                "(LOWER(events.title) LIKE ? ESCAPE '\\' \
                 OR LOWER(COALESCE(events.description, '')) LIKE ? ESCAPE '\\')"
                    .to_string()
            }
            Predicate::TitleStartsWith(letter) => {
                params.push(SqlValue::Text(format!("{}%", letter.to_ascii_lowercase())));
                "LOWER(events.title) LIKE ?".to_string()
            }
            Predicate::LocationContains(needle) => {
                params.push(SqlValue::Text(contains_pattern(needle)));
                "LOWER(events.location) LIKE ? ESCAPE '\\'".to_string()
            }
            Predicate::CategoryIs(category) => {
                params.push(SqlValue::Text(category.as_str().to_string()));
                "LOWER(events.category) = ?".to_string()
            }
            Predicate::DateIs(date) => {
                params.push(SqlValue::Text(date_param(*date)));
                "events.date = ?".to_string()
            }
            Predicate::DateFrom(date) => {
                params.push(SqlValue::Text(date_param(*date)));
                "events.date >= ?".to_string()
            }
            Predicate::DateUntil(date) => {
                params.push(SqlValue::Text(date_param(*date)));
                "events.date <= ?".to_string()
            }
        }
    }
}

/// The `FROM … [JOIN …] [WHERE …]` part shared by fetch and count.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterClause {
    sql: String,
    params: Vec<SqlValue>,
}

impl FilterClause {
    fn build(filter: &EventFilter, strategy: SearchStrategy) -> Self {
        let predicates = predicates(filter, strategy);

        let mut sql = String::from("FROM events");
        if predicates
            .iter()
            .any(|p| matches!(p, Predicate::Matches(_)))
        {
            sql.push(' ');
            sql.push_str(SEARCH_INDEX_JOIN);
        }

        let mut params = Vec::new();
        let conditions: Vec<String> = predicates.iter().map(|p| p.render(&mut params)).collect();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        Self { sql, params }
    }
}

/// Absent filters contribute nothing, not even a placeholder.
fn predicates(filter: &EventFilter, strategy: SearchStrategy) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let expression = match strategy {
            SearchStrategy::FullText => full_text_expression(q),
            SearchStrategy::Substring => None,
        };
        predicates.push(match expression {
            Some(expression) => Predicate::Matches(expression),
            None => Predicate::TextContains(q.to_string()),
        });
    }
    if let Some(letter) = filter.starts_with {
        predicates.push(Predicate::TitleStartsWith(letter));
    }
    if let Some(location) = filter.location.as_deref().filter(|l| !l.trim().is_empty()) {
        predicates.push(Predicate::LocationContains(location.to_string()));
    }
    if let Some(category) = filter.category {
        predicates.push(Predicate::CategoryIs(category));
    }
    if let Some(date) = filter.date {
        predicates.push(Predicate::DateIs(date));
    }
    if let Some(start) = filter.start_date {
        predicates.push(Predicate::DateFrom(start));
    }
    if let Some(end) = filter.end_date {
        predicates.push(Predicate::DateUntil(end));
    }

    predicates
}

fn order_by(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::DateAsc => "ORDER BY events.date ASC, events.id ASC",
        SortOrder::DateDesc => "ORDER BY events.date DESC, events.id DESC",
        SortOrder::CreatedDesc => "ORDER BY events.created_at DESC, events.id DESC",
    }
}

pub fn compile(query: &EventQuery, strategy: SearchStrategy) -> CompiledSearch {
    let clause = FilterClause::build(&query.filter, strategy);

    let count = CompiledQuery {
        sql: format!("SELECT COUNT(*) {}", clause.sql),
        params: clause.params.clone(),
    };

    let mut params = clause.params;
    params.push(SqlValue::Integer(i64::from(query.page.limit)));
    params.push(SqlValue::Integer(
        i64::try_from(query.page.offset).unwrap_or(i64::MAX),
    ));
    let fetch = CompiledQuery {
        sql: format!(
            "SELECT {EVENT_SELECT_LIST} {} {} LIMIT ? OFFSET ?",
            clause.sql,
            order_by(query.sort)
        ),
        params,
    };

    CompiledSearch { fetch, count }
}

/// Builds an FTS5 expression requiring every word of `text` as a prefix,
/// e.g. `Lagos tech!` becomes `"lagos"* AND "tech"*`. Returns `None` when
/// the text holds no word characters.
pub fn full_text_expression(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{}\"*", token.to_lowercase()))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" AND "))
    }
}

/// `%needle%` with LIKE wildcards escaped. Lowercased the way SQLite's
/// `LOWER` does it (ASCII only) so both sides fold identically.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c.to_ascii_lowercase());
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn text(value: &str) -> SqlValue {
        SqlValue::Text(value.to_string())
    }

    #[test]
    fn test_no_filters_compiles_to_plain_scan() {
        let compiled = compile(&EventQuery::default(), SearchStrategy::FullText);

        assert_eq!(compiled.count.sql, "SELECT COUNT(*) FROM events");
        assert!(compiled.count.params.is_empty());
        assert_eq!(
            compiled.fetch.sql,
            format!(
                "SELECT {EVENT_SELECT_LIST} FROM events \
                 ORDER BY events.date ASC, events.id ASC LIMIT ? OFFSET ?"
            )
        );
        assert_eq!(
            compiled.fetch.params,
            vec![SqlValue::Integer(20), SqlValue::Integer(0)]
        );
    }

    #[test]
    fn test_full_text_joins_index_and_requires_every_prefix() {
        let query = EventQuery {
            filter: EventFilter {
                q: Some("Lagos  tech!".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let compiled = compile(&query, SearchStrategy::FullText);

        assert_eq!(
            compiled.count.sql,
            "SELECT COUNT(*) FROM events \
             JOIN events_fts ON events_fts.rowid = events.id \
             WHERE events_fts MATCH ?"
        );
        assert_eq!(compiled.count.params, vec![text("\"lagos\"* AND \"tech\"*")]);
    }

    #[test]
    fn test_substring_fallback_without_index() {
        let query = EventQuery {
            filter: EventFilter {
                q: Some("Tech".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let compiled = compile(&query, SearchStrategy::Substring);

        assert!(!compiled.count.sql.contains("events_fts"));
        assert!(compiled.count.sql.contains("LOWER(events.title) LIKE ?"));
        assert_eq!(compiled.count.params, vec![text("%tech%"), text("%tech%")]);
    }

    #[test]
    fn test_text_without_words_falls_back_to_substring() {
        let query = EventQuery {
            filter: EventFilter {
                q: Some("++".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let compiled = compile(&query, SearchStrategy::FullText);
        assert!(!compiled.count.sql.contains("MATCH"));
        assert_eq!(compiled.count.params, vec![text("%++%"), text("%++%")]);
    }

    #[test]
    fn test_filters_are_anded_in_a_fixed_order() {
        let query = EventQuery {
            filter: EventFilter {
                q: None,
                starts_with: Some('L'),
                location: Some("Lagos".to_string()),
                category: Some(Category::Tech),
                date: Some(date("2025-06-01")),
                start_date: Some(date("2025-01-01")),
                end_date: Some(date("2025-12-31")),
            },
            sort: SortOrder::DateDesc,
            page: Page::new(10, 30),
        };
        let compiled = compile(&query, SearchStrategy::FullText);

        assert_eq!(
            compiled.count.sql,
            "SELECT COUNT(*) FROM events WHERE LOWER(events.title) LIKE ? \
             AND LOWER(events.location) LIKE ? ESCAPE '\\' \
             AND LOWER(events.category) = ? \
             AND events.date = ? AND events.date >= ? AND events.date <= ?"
        );
        assert_eq!(
            compiled.count.params,
            vec![
                text("l%"),
                text("%lagos%"),
                text("tech"),
                text("2025-06-01"),
                text("2025-01-01"),
                text("2025-12-31"),
            ]
        );
        assert!(compiled
            .fetch
            .sql
            .ends_with("ORDER BY events.date DESC, events.id DESC LIMIT ? OFFSET ?"));
        assert_eq!(
            compiled.fetch.params[compiled.count.params.len()..],
            [SqlValue::Integer(10), SqlValue::Integer(30)]
        );
    }

    #[test]
    fn test_fetch_and_count_share_the_filter_clause() {
        let query = EventQuery {
            filter: EventFilter {
                q: Some("music festival".to_string()),
                category: Some(Category::Music),
                ..Default::default()
            },
            sort: SortOrder::CreatedDesc,
            ..Default::default()
        };
        for strategy in [SearchStrategy::FullText, SearchStrategy::Substring] {
            let compiled = compile(&query, strategy);
            let clause = compiled.count.sql.trim_start_matches("SELECT COUNT(*) ");
            assert!(compiled.fetch.sql.contains(clause), "{strategy:?}");
            assert_eq!(
                compiled.fetch.params[..compiled.count.params.len()],
                compiled.count.params[..]
            );
            assert!(compiled.fetch.sql.contains("ORDER BY events.created_at DESC, events.id DESC"));
        }
    }

    #[test]
    fn test_user_input_never_reaches_sql_text() {
        let hostile = "x'); DROP TABLE events; --";
        let query = EventQuery {
            filter: EventFilter {
                q: Some(hostile.to_string()),
                location: Some(hostile.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        for strategy in [SearchStrategy::FullText, SearchStrategy::Substring] {
            let compiled = compile(&query, strategy);
            assert!(!compiled.fetch.sql.contains("DROP"));
            assert!(!compiled.count.sql.contains("DROP"));
        }
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("100%_Off\\"), "%100\\%\\_off\\\\%");
    }

    #[test]
    fn test_full_text_expression_tokenizes_words() {
        assert_eq!(
            full_text_expression("Port-Harcourt music_fest 2025").as_deref(),
            Some("\"port\"* AND \"harcourt\"* AND \"music_fest\"* AND \"2025\"*")
        );
        assert_eq!(full_text_expression(" ,.; "), None);
    }

    #[test]
    fn test_strategy_follows_index_capability() {
        assert_eq!(
            SearchStrategy::for_index(SearchIndex::new(true)),
            SearchStrategy::FullText
        );
        assert_eq!(
            SearchStrategy::for_index(SearchIndex::new(false)),
            SearchStrategy::Substring
        );
    }
}
