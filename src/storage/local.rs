//! Local filesystem storage implementation.
//!
//! Maps URLs under a base URL onto files under a root directory, for
//! development and offline use. Production deployments talk to a pod
//! through `HttpPod`.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/                       <=> {base_url}
//! ├── public/annonces/
//! │   └── {id}.json             # Listing documents
//! └── public/annonces/notifs/
//!     ├── categories.ttl        # Category index
//!     └── YYYY/MM/DD.ttl        # Day feeds
//! ```
//!
//! Relationships are appended to documents as N-Triples lines, which keeps
//! the files valid Turtle.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::vocab;
use crate::storage::paths::{document_url, with_trailing_slash};
use crate::storage::{
    DocumentTransport, FolderEntry, FolderListing, Triple, TripleStore, check_iri,
};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    base_url: String,
    /// Serializes read-check-append of relationships
    append_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a LocalStorage serving `base_url` from the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_url: with_trailing_slash(base_url),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the full path for a URL.
    fn path(&self, url: &str) -> Result<PathBuf> {
        let doc = document_url(url);
        let key = doc.strip_prefix(self.base_url.as_str()).ok_or_else(|| {
            AppError::validation(format!("{url} is outside of {}", self.base_url))
        })?;

        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("unsafe path in {url}")));
        }
        Ok(self.root_dir.join(relative))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// Every write gets its own temp file, so concurrent writers of one
    /// document never share one.
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, mapping a missing file to a not-found error.
    async fn read_bytes(&self, url: &str, path: &Path) -> Result<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found(url)),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Relationships stored in a document file.
    async fn read_triples(&self, url: &str, path: &Path) -> Result<Vec<Triple>> {
        let bytes = self.read_bytes(url, path).await?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.lines().filter_map(parse_ntriple).collect())
    }

    /// Members of a directory as URLs, sorted by name.
    async fn folder_entries(&self, url: &str, path: &Path) -> Result<FolderListing> {
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(url));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let folder_url = with_trailing_slash(document_url(url));
        let mut files = Vec::new();
        let mut folders = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_temp_name(&name) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                folders.push(format!("{folder_url}{name}/"));
            } else {
                files.push(format!("{folder_url}{name}"));
            }
        }
        files.sort();
        folders.sort();

        Ok(FolderListing {
            files: files.into_iter().map(|url| FolderEntry { url }).collect(),
            folders: folders.into_iter().map(|url| FolderEntry { url }).collect(),
        })
    }
}

/// Whether a file name is an in-flight write from `write_bytes`.
fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}

/// Serialize a relationship as one N-Triples line.
fn format_ntriple(triple: &Triple) -> String {
    format!(
        "<{}> <{}> <{}> .\n",
        triple.subject, triple.predicate, triple.object
    )
}

/// Parse a line written by `format_ntriple`; other lines are ignored.
fn parse_ntriple(line: &str) -> Option<Triple> {
    let body = line.trim().strip_suffix('.')?.trim_end();
    let mut parts = body.split_whitespace();
    let mut iri = || {
        parts
            .next()?
            .strip_prefix('<')?
            .strip_suffix('>')
            .map(str::to_string)
    };
    let triple = Triple::new(iri()?, iri()?, iri()?);
    if parts.next().is_some() {
        return None;
    }
    Some(triple)
}

#[async_trait]
impl DocumentTransport for LocalStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        let path = self.path(url)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn read_document(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.path(url)?;
        self.read_bytes(url, &path).await
    }

    async fn write_document(&self, url: &str, body: &[u8], _content_type: &str) -> Result<()> {
        let path = self.path(url)?;
        self.write_bytes(&path, body).await?;
        log::debug!("Wrote {} bytes to {}", body.len(), path.display());
        Ok(())
    }

    async fn create_document(&self, url: &str, _content_type: &str) -> Result<bool> {
        let path = self.path(url)?;
        self.ensure_dir(&path).await?;
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn delete_document(&self, url: &str) -> Result<()> {
        let path = self.path(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found(url)),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn list_folder(&self, url: &str) -> Result<FolderListing> {
        let path = self.path(url)?;
        self.folder_entries(url, &path).await
    }

    async fn create_folder(&self, url: &str) -> Result<()> {
        let path = self.path(url)?;
        tokio::fs::create_dir_all(&path).await?;
        Ok(())
    }
}

#[async_trait]
impl TripleStore for LocalStorage {
    async fn add_relationship(
        &self,
        doc_url: &str,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<()> {
        let path = self.path(doc_url)?;
        for iri in [subject, predicate, object] {
            check_iri(iri)?;
        }
        let triple = Triple::new(subject, predicate, object);

        let _guard = self.append_lock.lock().await;
        let existing = match self.read_triples(doc_url, &path).await {
            Ok(triples) => triples,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        if existing.contains(&triple) {
            return Ok(());
        }

        self.ensure_dir(&path).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format_ntriple(&triple).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn relationship_targets(
        &self,
        doc_url: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<Vec<String>> {
        let path = self.path(doc_url)?;

        if tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            if predicate != vocab::LDP_CONTAINS {
                return Ok(Vec::new());
            }
            let listing = self.folder_entries(doc_url, &path).await?;
            return Ok(listing
                .folders
                .into_iter()
                .chain(listing.files)
                .map(|e| e.url)
                .collect());
        }

        Ok(self
            .read_triples(doc_url, &path)
            .await?
            .into_iter()
            .filter(|t| t.subject == subject && t.predicate == predicate)
            .map(|t| t.object)
            .collect())
    }
}
