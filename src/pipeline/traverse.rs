//! Index traversal: discovering listings through containers, feeds and
//! the category index.

use chrono::{NaiveDate, Utc};

use crate::error::Result;
use crate::models::{Listing, RegistryConfig, vocab};
use crate::storage::paths::{category_index_url, category_subject, document_url, feed_location};
use crate::storage::{DocumentTransport, TripleStore};

/// Members of a container, in store order.
///
/// A container that does not exist yet has no members.
pub async fn list_members(triples: &dyn TripleStore, container_url: &str) -> Result<Vec<String>> {
    let container = document_url(container_url);
    targets_or_empty(triples, container, container, vocab::LDP_CONTAINS).await
}

async fn targets_or_empty(
    triples: &dyn TripleStore,
    document: &str,
    subject: &str,
    predicate: &str,
) -> Result<Vec<String>> {
    match triples.relationship_targets(document, subject, predicate).await {
        Ok(targets) => Ok(targets),
        Err(e) if e.is_not_found() => {
            log::debug!("No index at {} yet", document);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Read side of a registry: who published what, by day and by category.
pub struct RegistryReader<'a> {
    transport: &'a dyn DocumentTransport,
    triples: &'a dyn TripleStore,
    registry_root: &'a str,
    config: &'a RegistryConfig,
}

impl<'a> RegistryReader<'a> {
    pub fn new(
        transport: &'a dyn DocumentTransport,
        triples: &'a dyn TripleStore,
        registry_root: &'a str,
        config: &'a RegistryConfig,
    ) -> Self {
        Self {
            transport,
            triples,
            registry_root,
            config,
        }
    }

    /// Listing URLs published on a given day.
    pub async fn day_feed(&self, day: NaiveDate) -> Result<Vec<String>> {
        let location = feed_location(self.registry_root, &self.config.feed_extension, day);
        targets_or_empty(
            self.triples,
            &location.document,
            &location.subject,
            vocab::HAS_PART,
        )
        .await
    }

    /// Listing URLs tagged with a category term.
    pub async fn category(&self, term: &str) -> Result<Vec<String>> {
        // Every day's feed resolves to the same index document.
        let anchor = feed_location(
            self.registry_root,
            &self.config.feed_extension,
            Utc::now().date_naive(),
        );
        let Some(index_url) = category_index_url(&anchor, &self.config.category_index) else {
            return Ok(Vec::new());
        };
        let subject = category_subject(&index_url, term.trim())?;
        targets_or_empty(self.triples, &index_url, &subject, vocab::IS_PART_OF).await
    }

    /// Read and parse a listing document.
    pub async fn fetch_listing(&self, url: &str) -> Result<Listing> {
        let bytes = self.transport.read_document(url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Listings published on a day; unreadable or deleted ones are skipped.
    pub async fn day_listings(&self, day: NaiveDate) -> Result<Vec<Listing>> {
        let mut listings = Vec::new();
        for url in self.day_feed(day).await? {
            match self.fetch_listing(&url).await {
                Ok(listing) => listings.push(listing),
                Err(e) => log::warn!("Skipping feed entry {}: {}", url, e),
            }
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingDraft;
    use crate::pipeline::{CategoryIndexWriter, FeedWriter};
    use crate::storage::MemoryPod;

    const ROOT: &str = "https://registry.example/notifs/";

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_list_members_missing_container_is_empty() {
        let pod = MemoryPod::new();
        let members = list_members(&pod, "https://u.example/nothing/").await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn test_list_members_insertion_order() {
        let pod = MemoryPod::new();
        for name in ["zeta.json", "alpha.json"] {
            pod.write_document(&format!("https://u.example/c/{name}"), b"{}", vocab::JSON)
                .await
                .unwrap();
        }
        let members = list_members(&pod, "https://u.example/c/").await.unwrap();
        assert_eq!(
            members,
            vec!["https://u.example/c/zeta.json", "https://u.example/c/alpha.json"]
        );
    }

    #[tokio::test]
    async fn test_reader_finds_feed_and_category_entries() {
        let pod = MemoryPod::new();
        let config = RegistryConfig::default();

        let mut listing = Listing::from_draft(ListingDraft {
            title: "Bike".into(),
            category: "sport".into(),
            ..ListingDraft::default()
        });
        let url = format!("https://u.example/public/annonces/{}.json", listing.id);
        listing.url = Some(url.clone());
        pod.write_document(&url, &serde_json::to_vec(&listing).unwrap(), vocab::JSON)
            .await
            .unwrap();

        let feed = FeedWriter::new(&pod, &pod, ROOT, "ttl");
        let location = feed.location(day());
        feed.append(&location, &url).await.unwrap();
        CategoryIndexWriter::new(&pod, &pod, "categories.ttl")
            .append(&location, &url, "sport")
            .await
            .unwrap();

        let reader = RegistryReader::new(&pod, &pod, ROOT, &config);
        assert_eq!(reader.day_feed(day()).await.unwrap(), vec![url.clone()]);
        assert_eq!(reader.category("sport").await.unwrap(), vec![url.clone()]);
        assert!(reader.category("garden").await.unwrap().is_empty());

        let listings = reader.day_listings(day()).await.unwrap();
        assert_eq!(listings, vec![listing]);
    }

    #[tokio::test]
    async fn test_reader_on_empty_registry() {
        let pod = MemoryPod::new();
        let config = RegistryConfig::default();
        let reader = RegistryReader::new(&pod, &pod, ROOT, &config);

        assert!(reader.day_feed(day()).await.unwrap().is_empty());
        assert!(reader.category("sport").await.unwrap().is_empty());
    }
}
