//! Indexing pipeline run after a listing document is written.
//!
//! - `feed`: link the listing from the day's feed document
//! - `category`: link the listing from each of its category terms
//! - `traverse`: read the feed, the index and containers back
//!
//! The listing write is authoritative. The indexing tasks run strictly in
//! sequence afterwards, and each failure is captured as a warning instead
//! of undoing the write.

pub mod category;
pub mod feed;
pub mod traverse;

use chrono::{DateTime, Utc};

use crate::models::{Listing, RegistryConfig};
use crate::storage::paths::FeedLocation;
use crate::storage::{DocumentTransport, TripleStore};

pub use category::CategoryIndexWriter;
pub use feed::FeedWriter;
pub use traverse::{RegistryReader, list_members};

/// Follow-up tasks dispatched after a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTask {
    Feed,
    Categories,
}

/// A follow-up task that failed; the listing stays published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexWarning {
    pub task: IndexTask,
    pub message: String,
}

/// What the indexing tasks achieved for one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Feed the listing was linked from, if that task succeeded
    pub feed: Option<FeedLocation>,
    /// Category terms the listing was linked from
    pub categories: Vec<String>,
    pub warnings: Vec<IndexWarning>,
}

impl IndexReport {
    /// Whether every task succeeded.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, task: IndexTask, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Indexing task {:?} failed: {}", task, message);
        self.warnings.push(IndexWarning { task, message });
    }
}

/// Indexing work for one freshly written listing.
pub struct IndexJob<'a> {
    registry_root: String,
    listing: &'a Listing,
}

impl<'a> IndexJob<'a> {
    pub fn new(registry_root: impl Into<String>, listing: &'a Listing) -> Self {
        Self {
            registry_root: registry_root.into(),
            listing,
        }
    }

    /// Run the feed task, then the category task, for the UTC day of `at`.
    pub async fn run(
        &self,
        transport: &dyn DocumentTransport,
        triples: &dyn TripleStore,
        registry: &RegistryConfig,
        at: DateTime<Utc>,
    ) -> IndexReport {
        let mut report = IndexReport::default();

        let Some(listing_url) = self.listing.url.as_deref() else {
            report.warn(IndexTask::Feed, format!("listing {} has no url", self.listing.id));
            return report;
        };

        let feed = FeedWriter::new(
            transport,
            triples,
            &self.registry_root,
            &registry.feed_extension,
        );
        let location = feed.location(at.date_naive());

        match feed.append(&location, listing_url).await {
            Ok(()) => report.feed = Some(location.clone()),
            Err(e) => report.warn(IndexTask::Feed, e.to_string()),
        }

        let categories = CategoryIndexWriter::new(transport, triples, &registry.category_index);
        match categories
            .append(&location, listing_url, &self.listing.category)
            .await
        {
            Ok(terms) => report.categories = terms,
            Err(e) => report.warn(IndexTask::Categories, e.to_string()),
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{ListingDraft, vocab};
    use crate::storage::{MemoryPod, Operation};

    const ROOT: &str = "https://registry.example/notifs/";

    fn published(category: &str) -> Listing {
        let mut listing = Listing::from_draft(ListingDraft {
            title: "Bike".into(),
            category: category.into(),
            ..ListingDraft::default()
        });
        listing.url = Some(format!("https://u.example/public/annonces/{}.json", listing.id));
        listing
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_run_writes_feed_then_categories() {
        let pod = MemoryPod::new();
        let listing = published("sport, outdoor");

        let report = IndexJob::new(ROOT, &listing)
            .run(&pod, &pod, &RegistryConfig::default(), at())
            .await;

        assert!(report.is_complete());
        let feed = report.feed.unwrap();
        assert_eq!(feed.document, "https://registry.example/notifs/2026/10/19.ttl");
        assert_eq!(report.categories, vec!["sport", "outdoor"]);

        let relationship_calls: Vec<String> = pod
            .calls()
            .into_iter()
            .filter(|(op, _)| *op == Operation::AddRelationship)
            .map(|(_, url)| url)
            .collect();
        assert_eq!(relationship_calls[0], feed.document);
        assert!(relationship_calls[1..]
            .iter()
            .all(|u| u == "https://registry.example/notifs/categories.ttl"));

        let feed_targets = pod
            .relationship_targets(&feed.document, &feed.subject, vocab::HAS_PART)
            .await
            .unwrap();
        assert_eq!(feed_targets, vec![listing.url.clone().unwrap()]);
    }

    #[tokio::test]
    async fn test_feed_failure_still_indexes_categories() {
        let pod = MemoryPod::new();
        pod.fail_when(
            Operation::AddRelationship,
            "https://registry.example/notifs/2026/",
        )
        .unwrap();
        let listing = published("sport");

        let report = IndexJob::new(ROOT, &listing)
            .run(&pod, &pod, &RegistryConfig::default(), at())
            .await;

        assert!(!report.is_complete());
        assert!(report.feed.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].task, IndexTask::Feed);
        assert_eq!(report.categories, vec!["sport"]);
    }

    #[tokio::test]
    async fn test_interleaved_jobs_both_reach_the_feed() {
        let pod = MemoryPod::new();
        pod.pause_after_exists().unwrap();
        let first = published("sport");
        let second = published("sport");
        let registry = RegistryConfig::default();

        let job_a = IndexJob::new(ROOT, &first);
        let job_b = IndexJob::new(ROOT, &second);
        let (a, b) = tokio::join!(
            job_a.run(&pod, &pod, &registry, at()),
            job_b.run(&pod, &pod, &registry, at())
        );
        assert!(a.is_complete() && b.is_complete());

        let feed = a.feed.unwrap();
        let mut targets = pod
            .relationship_targets(&feed.document, &feed.subject, vocab::HAS_PART)
            .await
            .unwrap();
        targets.sort();
        let mut expected = vec![first.url.clone().unwrap(), second.url.clone().unwrap()];
        expected.sort();
        assert_eq!(targets, expected);
        assert_eq!(pod.triples("https://registry.example/notifs/categories.ttl").len(), 2);
    }

    #[tokio::test]
    async fn test_unpublished_listing_is_not_indexed() {
        let pod = MemoryPod::new();
        let listing = Listing::from_draft(ListingDraft::default());

        let report = IndexJob::new(ROOT, &listing)
            .run(&pod, &pod, &RegistryConfig::default(), at())
            .await;

        assert_eq!(report.warnings.len(), 1);
        assert!(pod.calls().is_empty());
    }
}
