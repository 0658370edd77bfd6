pub mod accounts;
pub mod jobs;

use anyhow::Result;
use std::str::FromStr;

/// Trimmed, lowercased search term; blank input means no search.
pub(crate) fn normalize_search(raw: &str) -> Option<String> {
    let term = raw.trim();
    if term.is_empty() {
        None
    } else {
        Some(term.to_lowercase())
    }
}

/// `term` must already be normalized.
pub(crate) fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}

/// Parse an optional query value; blank means unset.
pub(crate) fn parse_optional<T>(raw: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(raw.parse::<T>()?))
}
