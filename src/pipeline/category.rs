//! Category index writer.
//!
//! A single index document per registry maps each category term to the
//! listings tagged with it:
//!
//! ```text
//! {registry}/categories.ttl#sport    isPartOf  <listing>
//! {registry}/categories.ttl#outdoor  isPartOf  <listing>
//! ```
//!
//! A term's subject exists as soon as one relationship names it.

use crate::error::{AppError, Result};
use crate::models::{split_category_terms, vocab};
use crate::pipeline::feed::ensure_document;
use crate::storage::paths::{FeedLocation, category_index_url, category_subject};
use crate::storage::{DocumentTransport, TripleStore};

/// Appends listings to the category index derived from a feed location.
pub struct CategoryIndexWriter<'a> {
    transport: &'a dyn DocumentTransport,
    triples: &'a dyn TripleStore,
    index_file: &'a str,
}

impl<'a> CategoryIndexWriter<'a> {
    pub fn new(
        transport: &'a dyn DocumentTransport,
        triples: &'a dyn TripleStore,
        index_file: &'a str,
    ) -> Self {
        Self {
            transport,
            triples,
            index_file,
        }
    }

    /// Index document URL for a feed location.
    pub fn index_url(&self, feed: &FeedLocation) -> Result<String> {
        category_index_url(feed, self.index_file).ok_or_else(|| {
            AppError::validation(format!(
                "feed {} is too shallow to derive a category index",
                feed.document
            ))
        })
    }

    /// Link the listing from every term of `category`.
    ///
    /// Returns the terms written, in order, without repeats.
    pub async fn append(
        &self,
        feed: &FeedLocation,
        listing_url: &str,
        category: &str,
    ) -> Result<Vec<String>> {
        let index_url = self.index_url(feed)?;

        // Index creation rides on first-feed-of-day detection.
        ensure_document(self.transport, &feed.document).await?;

        let terms = split_category_terms(category);
        for term in &terms {
            if term.is_empty() {
                log::warn!("Listing {} indexed under an empty category", listing_url);
            }
            let subject = category_subject(&index_url, term)?;
            self.triples
                .add_relationship(&index_url, &subject, vocab::IS_PART_OF, listing_url)
                .await?;
        }

        log::info!(
            "Category index {} references {} under {} term(s)",
            index_url,
            listing_url,
            terms.len()
        );
        Ok(terms)
    }
}
