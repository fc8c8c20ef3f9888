//! Storage path utilities.
//!
//! Pure functions deriving document addresses from roots and dates.

use chrono::{Datelike, NaiveDate};
use url::Url;

use crate::error::Result;

/// Address of a day's feed: the document and the subject inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLocation {
    /// `{root}YYYY/MM/DD.{ext}`
    pub document: String,
    /// `{document}#this`
    pub subject: String,
}

impl FeedLocation {
    /// Container holding the feed document (`{root}YYYY/MM/`).
    pub fn container(&self) -> Option<String> {
        parent_container(&self.document)
    }
}

/// Document part of a URL (fragment removed).
pub fn document_url(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Ensure a root URL ends with exactly one `/`.
pub fn with_trailing_slash(root: &str) -> String {
    format!("{}/", root.trim_end_matches('/'))
}

/// Address of a listing document.
pub fn listing_url(storage_root: &str, listings_path: &str, id: &str) -> String {
    format!(
        "{}{}{}.json",
        with_trailing_slash(storage_root),
        with_trailing_slash(listings_path.trim_start_matches('/')),
        id
    )
}

/// Address of the listings container in a user's storage.
pub fn listings_container(storage_root: &str, listings_path: &str) -> String {
    format!(
        "{}{}",
        with_trailing_slash(storage_root),
        with_trailing_slash(listings_path.trim_start_matches('/'))
    )
}

/// Feed location for a calendar day (callers pass the UTC date).
pub fn feed_location(registry_root: &str, extension: &str, day: NaiveDate) -> FeedLocation {
    let document = format!(
        "{}{}/{:02}/{:02}.{}",
        with_trailing_slash(registry_root),
        day.year(),
        day.month(),
        day.day(),
        extension
    );
    let subject = format!("{document}#this");
    FeedLocation { document, subject }
}

/// Parent container of a document or container URL.
///
/// Returns `None` at the storage root.
pub fn parent_container(url: &str) -> Option<String> {
    let doc = document_url(url);
    let trimmed = doc.strip_suffix('/').unwrap_or(doc);
    let authority_start = trimmed.find("://")? + 3;
    let idx = trimmed[authority_start..].rfind('/')? + authority_start;
    Some(trimmed[..=idx].to_string())
}

/// Category index document for a feed.
///
/// The feed container is `{root}YYYY/MM/`; dropping its last two segments
/// gives the registry root the index lives in.
pub fn category_index_url(feed: &FeedLocation, index_file: &str) -> Option<String> {
    let container = feed.container()?;
    let month_parent = parent_container(&container)?;
    let root = parent_container(&month_parent)?;
    Some(format!("{root}{index_file}"))
}

/// Subject naming a category term inside the index document.
pub fn category_subject(index_url: &str, term: &str) -> Result<String> {
    let mut url = Url::parse(document_url(index_url))?;
    url.set_fragment(Some(term));
    Ok(url.to_string())
}
