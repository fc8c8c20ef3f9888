//! Date-partitioned feed writer.
//!
//! One feed document per UTC day under the registry root:
//!
//! ```text
//! {registry}/YYYY/MM/DD.ttl#this  hasPart  <listing>
//! ```

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::vocab;
use crate::storage::paths::{FeedLocation, feed_location};
use crate::storage::{DocumentTransport, TripleStore};

/// Create an empty relationship document at `url` if none exists.
///
/// Two writers may both see the document missing. The create never
/// overwrites, so the loser keeps whatever the winner has appended.
pub async fn ensure_document(transport: &dyn DocumentTransport, url: &str) -> Result<bool> {
    if transport.exists(url).await? {
        log::debug!("Feed document exists: {}", url);
        return Ok(false);
    }
    let created = transport.create_document(url, vocab::TURTLE).await?;
    if created {
        log::info!("Created feed document {}", url);
    }
    Ok(created)
}

/// Appends published listings to the day's feed.
pub struct FeedWriter<'a> {
    transport: &'a dyn DocumentTransport,
    triples: &'a dyn TripleStore,
    registry_root: &'a str,
    extension: &'a str,
}

impl<'a> FeedWriter<'a> {
    pub fn new(
        transport: &'a dyn DocumentTransport,
        triples: &'a dyn TripleStore,
        registry_root: &'a str,
        extension: &'a str,
    ) -> Self {
        Self {
            transport,
            triples,
            registry_root,
            extension,
        }
    }

    /// Feed location for a day.
    pub fn location(&self, day: NaiveDate) -> FeedLocation {
        feed_location(self.registry_root, self.extension, day)
    }

    /// Ensure the feed document exists, then link the listing from it.
    pub async fn append(&self, location: &FeedLocation, listing_url: &str) -> Result<()> {
        ensure_document(self.transport, &location.document).await?;
        self.triples
            .add_relationship(
                &location.document,
                &location.subject,
                vocab::HAS_PART,
                listing_url,
            )
            .await?;
        log::info!("Feed {} now references {}", location.document, listing_url);
        Ok(())
    }
}
