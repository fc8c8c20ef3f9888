// src/services/listings.rs

//! Listing store.
//!
//! Owns the in-memory collection of the user's listings and keeps it in
//! step with the listing documents in their storage. Publishing hands the
//! written listing to the indexing pipeline.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, Listing, ListingDraft, Session, vocab};
use crate::pipeline::{IndexJob, IndexReport};
use crate::services::{FolderBootstrapper, Outcome, SkipReason};
use crate::storage::paths::{listing_url, listings_container};
use crate::storage::{DocumentTransport, TripleStore};

/// A successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    /// The listing as written, with url and timestamps
    pub listing: Listing,
    /// Outcome of the follow-up feed and category tasks
    pub indexing: IndexReport,
}

/// A listing document that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub url: String,
    pub reason: String,
}

/// Summary of a `load_mine` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// CRUD over the user's listing documents.
pub struct ListingStore {
    config: Arc<Config>,
    transport: Arc<dyn DocumentTransport>,
    triples: Arc<dyn TripleStore>,
    listings: Vec<Listing>,
}

impl ListingStore {
    /// Create a store with an empty collection.
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn DocumentTransport>,
        triples: Arc<dyn TripleStore>,
    ) -> Self {
        Self {
            config,
            transport,
            triples,
            listings: Vec::new(),
        }
    }

    /// Listings currently held in memory.
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Look up a listing by id.
    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    /// Start a new listing. Nothing is persisted yet.
    pub fn create(&self, draft: ListingDraft) -> Listing {
        let listing = Listing::from_draft(draft);
        log::debug!("New listing {}", listing.id);
        listing
    }

    /// Write a listing to the user's storage and index it.
    ///
    /// The document write decides success. Feed and category failures end
    /// up as warnings in the receipt.
    pub async fn publish(
        &mut self,
        listing: &Listing,
        session: &Session,
    ) -> Result<Outcome<PublishReceipt>> {
        let Some(storage) = session.storage_root() else {
            log::info!("Not logged in, skipping publish of {}", listing.id);
            return Ok(Outcome::Skipped(SkipReason::Unauthenticated));
        };

        let now = Utc::now();
        let mut stamped = listing.clone();
        let url = match &stamped.url {
            Some(url) => url.clone(),
            None => listing_url(storage, &self.config.storage.listings_path, &stamped.id),
        };
        stamped.url = Some(url.clone());
        stamped.stamp(now, session.web_id.as_deref());

        let body = serde_json::to_vec(&stamped)?;
        self.transport
            .write_document(&url, &body, vocab::JSON)
            .await?;
        log::info!("Published listing {} at {}", stamped.id, url);

        self.upsert(&stamped);

        let registry_root = self.config.registry_root(storage);
        let indexing = IndexJob::new(registry_root, &stamped)
            .run(
                self.transport.as_ref(),
                self.triples.as_ref(),
                &self.config.registry,
                now,
            )
            .await;

        Ok(Outcome::Completed(PublishReceipt {
            listing: stamped,
            indexing,
        }))
    }

    /// Delete a listing document and forget it.
    ///
    /// Feed and category references are left in place.
    pub async fn remove(&mut self, id: &str, session: &Session) -> Result<Outcome<Option<Listing>>> {
        let Some(storage) = session.storage_root() else {
            log::info!("Not logged in, skipping removal of {}", id);
            return Ok(Outcome::Skipped(SkipReason::Unauthenticated));
        };

        let url = self
            .get(id)
            .and_then(|l| l.url.clone())
            .unwrap_or_else(|| listing_url(storage, &self.config.storage.listings_path, id));

        self.transport.delete_document(&url).await?;
        log::info!("Deleted listing {} at {}", id, url);

        let removed = self
            .listings
            .iter()
            .position(|l| l.id == id)
            .map(|idx| self.listings.remove(idx));
        Ok(Outcome::Completed(removed))
    }

    /// Replace the in-memory collection with the listings found in storage.
    ///
    /// Documents that fail to parse are skipped and reported; transport
    /// failures abort the load.
    pub async fn load_mine(&mut self, session: &Session) -> Result<Outcome<LoadReport>> {
        let Some(storage) = session.storage_root() else {
            self.listings.clear();
            return Ok(Outcome::Skipped(SkipReason::Unauthenticated));
        };

        let container = listings_container(storage, &self.config.storage.listings_path);
        FolderBootstrapper::new(self.transport.as_ref())
            .ensure(&container)
            .await?;

        let folder = self.transport.list_folder(&container).await?;
        let mut report = LoadReport::default();
        let mut listings = Vec::with_capacity(folder.files.len());

        for entry in folder.files {
            let bytes = self.transport.read_document(&entry.url).await?;
            match serde_json::from_slice::<Listing>(&bytes) {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    log::warn!("Skipping unreadable listing {}: {}", entry.url, e);
                    report.skipped.push(SkippedDocument {
                        url: entry.url,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.loaded = listings.len();
        self.listings = listings;
        log::info!(
            "Loaded {} listing(s) from {} ({} skipped)",
            report.loaded,
            container,
            report.skipped.len()
        );
        Ok(Outcome::Completed(report))
    }

    /// Insert a new listing or merge into the entry with the same id.
    fn upsert(&mut self, listing: &Listing) {
        match self.listings.iter_mut().find(|l| l.id == listing.id) {
            Some(existing) => existing.merge_from(listing),
            None => self.listings.push(listing.clone()),
        }
    }
}
