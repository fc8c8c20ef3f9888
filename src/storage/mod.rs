//! Storage abstractions consumed by the listing store and the indexers.
//!
//! Two capabilities are kept apart, mirroring how a Solid-style pod is
//! used:
//! - [`DocumentTransport`]: whole-document existence, read, write, delete
//!   and container listing/creation
//! - [`TripleStore`]: append a relationship to a document, enumerate the
//!   objects of a relationship
//!
//! ## Registry Layout
//!
//! ```text
//! {registry}/
//! ├── categories.ttl        # Category index: <#term> isPartOf <listing>
//! └── YYYY/
//!     └── MM/
//!         └── DD.ttl        # Day feed: <#this> hasPart <listing>
//! ```

pub mod http;
pub mod local;
pub mod memory;
pub mod paths;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

// Re-export for convenience
pub use http::HttpPod;
pub use local::LocalStorage;
pub use memory::{MemoryPod, Operation};

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub url: String,
}

/// Contents of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderListing {
    pub files: Vec<FolderEntry>,
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
}

/// A (subject, predicate, object) assertion between IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Reject IRIs that cannot be written between `<` and `>`.
pub fn check_iri(iri: &str) -> Result<()> {
    if iri.is_empty() {
        return Err(AppError::validation("empty IRI"));
    }
    let bad = iri.chars().find(|c| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    });
    match bad {
        Some(c) => Err(AppError::validation(format!(
            "character {c:?} not allowed in IRI {iri:?}"
        ))),
        None => Ok(()),
    }
}

/// Document-level access to a storage space.
///
/// URLs may carry a fragment; implementations address the document part.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    /// Whether a document or container exists at `url`.
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Read a whole document.
    async fn read_document(&self, url: &str) -> Result<Vec<u8>>;

    /// Create or overwrite a document.
    async fn write_document(&self, url: &str, body: &[u8], content_type: &str) -> Result<()>;

    /// Create an empty document unless something already exists at `url`.
    ///
    /// Never overwrites. Returns whether this call created the document.
    async fn create_document(&self, url: &str, content_type: &str) -> Result<bool>;

    /// Delete a document.
    async fn delete_document(&self, url: &str) -> Result<()>;

    /// List the direct members of a container.
    async fn list_folder(&self, url: &str) -> Result<FolderListing>;

    /// Create a container.
    async fn create_folder(&self, url: &str) -> Result<()>;
}

/// Relationship-level access to documents.
#[async_trait]
pub trait TripleStore: Send + Sync {
    /// Append `subject predicate object` to the document at `document_url`.
    ///
    /// The document is created if it does not exist. Existing relationships
    /// are never removed.
    async fn add_relationship(
        &self,
        document_url: &str,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<()>;

    /// Objects of every `subject predicate ?o` relationship in the document,
    /// in store order.
    ///
    /// Fails with a not-found error when the document does not exist.
    async fn relationship_targets(
        &self,
        document_url: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<Vec<String>>;
}
