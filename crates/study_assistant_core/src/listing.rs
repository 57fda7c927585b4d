//! crates/study_assistant_core/src/listing.rs
//!
//! Pagination and filter rules shared by the quiz and flashcard listings.

use crate::domain::Difficulty;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ListQueryError {
    #[error("Invalid date format: {0}. Use YYYY-MM-DD")]
    InvalidDate(String),
}

/// Raw, untrusted listing parameters as they arrive from a query string.
#[derive(Debug, Clone, Default)]
pub struct RawListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub lecture: Option<String>,
    pub difficulty: Option<String>,
    pub date: Option<String>,
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub lecture: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub date: Option<NaiveDate>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            lecture: None,
            difficulty: None,
            date: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListQuery {
    /// Normalizes raw parameters. Out-of-range paging falls back to the defaults;
    /// only a malformed date is an error.
    pub fn from_raw(raw: RawListParams) -> Result<Self, ListQueryError> {
        let page = match raw.page {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => DEFAULT_PAGE,
        };
        let limit = match raw.limit {
            Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u32,
            _ => DEFAULT_LIMIT,
        };

        // "all" is the UI's way of saying "no difficulty filter".
        let difficulty = non_blank(raw.difficulty)
            .filter(|d| !d.eq_ignore_ascii_case("all"))
            .and_then(|d| d.parse::<Difficulty>().ok());

        let date = match non_blank(raw.date) {
            Some(d) => Some(
                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|_| ListQueryError::InvalidDate(d.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            page,
            limit,
            search: non_blank(raw.search),
            lecture: non_blank(raw.lecture),
            difficulty,
            date,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    /// The half-open UTC window `[start, end)` covered by the date filter.
    pub fn date_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(|d| {
            let start = Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap_or_default());
            (start, start + Duration::days(1))
        })
    }

    /// `%term%` for ILIKE, with LIKE metacharacters escaped.
    pub fn like_pattern(term: &str) -> String {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(query: &ListQuery, total_count: u64) -> Self {
        let limit = query.limit.max(1) as u64;
        let total_pages = total_count.div_ceil(limit);
        Self {
            page: query.page,
            limit: query.limit,
            total_count,
            total_pages,
            has_next: (query.page as u64) < total_pages,
            has_prev: query.page > 1,
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &ListQuery, total_count: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(query, total_count),
        }
    }
}
