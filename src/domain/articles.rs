//! Article invariants shared by the service layer and the route loaders.

use time::{format_description::FormatItem, macros::format_description};

use super::error::DomainError;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const HUMAN_DATETIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month repr:long] [day padding:none], [year] [hour]:[minute]"
);

/// Parse a path segment into an article id.
///
/// Only positive integers can name a stored article; anything else is
/// reported as `None` so callers answer with "not found" rather than a
/// malformed-request error.
pub fn parse_article_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

pub fn ensure_non_empty(value: Option<&str>, field: &'static str) -> Result<(), DomainError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(DomainError::validation(format!("{field} must not be empty"))),
    }
}
