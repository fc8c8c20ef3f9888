//! In-memory storage implementation.
//!
//! Behaves like a Solid-style pod for development and testing:
//! - Writing a document creates its parent containers implicitly
//! - Appending a relationship creates the document if needed
//! - Relationships have set semantics (re-adding is a no-op)
//! - `ldp:contains` is synthesized for containers
//!
//! Every call is recorded, and failures can be injected per operation and
//! URL prefix.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::vocab;
use crate::storage::paths::{document_url, parent_container};
use crate::storage::{DocumentTransport, FolderEntry, FolderListing, Triple, TripleStore};

/// Kinds of storage calls, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Exists,
    Read,
    Write,
    Create,
    Delete,
    ListFolder,
    CreateFolder,
    AddRelationship,
    ReadRelationships,
}

#[derive(Debug, Clone)]
struct Document {
    body: Vec<u8>,
    content_type: String,
    triples: Vec<Triple>,
}

#[derive(Debug, Default)]
struct PodState {
    documents: HashMap<String, Document>,
    folders: HashSet<String>,
    /// Creation order of documents and folders
    order: Vec<String>,
    calls: Vec<(Operation, String)>,
    failures: Vec<(Operation, String)>,
    /// Yield to the scheduler after answering `exists`
    pause_after_exists: bool,
}

impl PodState {
    /// Record a call and apply any injected failure.
    fn record(&mut self, op: Operation, url: &str) -> Result<()> {
        self.calls.push((op, url.to_string()));
        let injected = self
            .failures
            .iter()
            .any(|(f_op, prefix)| *f_op == op && url.starts_with(prefix.as_str()));
        if injected {
            return Err(AppError::transport(url, format!("injected {op:?} failure")));
        }
        Ok(())
    }

    fn add_folder_chain(&mut self, url: &str) {
        let mut pending = Vec::new();
        let mut current = Some(url.to_string());
        while let Some(folder) = current {
            if self.folders.contains(&folder) {
                break;
            }
            current = parent_container(&folder);
            pending.push(folder);
        }
        for folder in pending.into_iter().rev() {
            self.folders.insert(folder.clone());
            self.order.push(folder);
        }
    }

    fn put_document(&mut self, url: &str, document: Document) {
        if let Some(parent) = parent_container(url) {
            self.add_folder_chain(&parent);
        }
        if self.documents.insert(url.to_string(), document).is_none() {
            self.order.push(url.to_string());
        }
    }

    fn children(&self, folder: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|url| parent_container(url).as_deref() == Some(folder))
            .cloned()
            .collect()
    }
}

/// In-process pod implementing both storage capabilities.
#[derive(Debug, Default)]
pub struct MemoryPod {
    state: Mutex<PodState>,
}

impl MemoryPod {
    /// Create an empty pod.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, PodState>> {
        self.state
            .lock()
            .map_err(|e| AppError::transport("memory://", format!("state lock poisoned: {e}")))
    }

    /// Make every future `op` on a URL starting with `prefix` fail.
    pub fn fail_when(&self, op: Operation, prefix: impl Into<String>) -> Result<()> {
        self.state()?.failures.push((op, prefix.into()));
        Ok(())
    }

    /// Yield to other tasks after every `exists` answer.
    ///
    /// Lets concurrent writers interleave between a check and the action
    /// that follows it.
    pub fn pause_after_exists(&self) -> Result<()> {
        self.state()?.pause_after_exists = true;
        Ok(())
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) -> Result<()> {
        self.state()?.failures.clear();
        Ok(())
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(Operation, String)> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Number of calls of one kind.
    pub fn count(&self, op: Operation) -> usize {
        self.calls().iter().filter(|(o, _)| *o == op).count()
    }

    /// Relationships stored in a document.
    pub fn triples(&self, url: &str) -> Vec<Triple> {
        self.state
            .lock()
            .ok()
            .and_then(|s| {
                s.documents
                    .get(document_url(url))
                    .map(|d| d.triples.clone())
            })
            .unwrap_or_default()
    }

    /// Content type a document was last written with.
    pub fn content_type(&self, url: &str) -> Option<String> {
        self.state.lock().ok().and_then(|s| {
            s.documents
                .get(document_url(url))
                .map(|d| d.content_type.clone())
        })
    }
}

#[async_trait]
impl DocumentTransport for MemoryPod {
    async fn exists(&self, url: &str) -> Result<bool> {
        let (found, pause) = {
            let mut state = self.state()?;
            state.record(Operation::Exists, url)?;
            let doc = document_url(url);
            let found = state.documents.contains_key(doc) || state.folders.contains(doc);
            (found, state.pause_after_exists)
        };
        if pause {
            tokio::task::yield_now().await;
        }
        Ok(found)
    }

    async fn read_document(&self, url: &str) -> Result<Vec<u8>> {
        let mut state = self.state()?;
        state.record(Operation::Read, url)?;
        state
            .documents
            .get(document_url(url))
            .map(|d| d.body.clone())
            .ok_or_else(|| AppError::not_found(url))
    }

    async fn write_document(&self, url: &str, body: &[u8], content_type: &str) -> Result<()> {
        let mut state = self.state()?;
        state.record(Operation::Write, url)?;
        let doc = document_url(url);
        if state.folders.contains(doc) {
            return Err(AppError::transport(url, "a container exists at this address"));
        }
        state.put_document(
            doc,
            Document {
                body: body.to_vec(),
                content_type: content_type.to_string(),
                triples: Vec::new(),
            },
        );
        Ok(())
    }

    async fn create_document(&self, url: &str, content_type: &str) -> Result<bool> {
        let mut state = self.state()?;
        state.record(Operation::Create, url)?;
        let doc = document_url(url);
        if state.documents.contains_key(doc) || state.folders.contains(doc) {
            return Ok(false);
        }
        state.put_document(
            doc,
            Document {
                body: Vec::new(),
                content_type: content_type.to_string(),
                triples: Vec::new(),
            },
        );
        Ok(true)
    }

    async fn delete_document(&self, url: &str) -> Result<()> {
        let mut state = self.state()?;
        state.record(Operation::Delete, url)?;
        let doc = document_url(url);
        if state.documents.remove(doc).is_none() {
            return Err(AppError::not_found(url));
        }
        state.order.retain(|u| u != doc);
        Ok(())
    }

    async fn list_folder(&self, url: &str) -> Result<FolderListing> {
        let mut state = self.state()?;
        state.record(Operation::ListFolder, url)?;
        let folder = document_url(url);
        if !state.folders.contains(folder) {
            return Err(AppError::not_found(url));
        }

        let mut listing = FolderListing::default();
        for child in state.children(folder) {
            let entry = FolderEntry { url: child.clone() };
            if state.folders.contains(&child) {
                listing.folders.push(entry);
            } else {
                listing.files.push(entry);
            }
        }
        Ok(listing)
    }

    async fn create_folder(&self, url: &str) -> Result<()> {
        let mut state = self.state()?;
        state.record(Operation::CreateFolder, url)?;
        let folder = document_url(url);
        if !folder.ends_with('/') {
            return Err(AppError::validation(format!(
                "container URL must end with '/': {url}"
            )));
        }
        if state.folders.contains(folder) || state.documents.contains_key(folder) {
            return Err(AppError::transport(url, "resource already exists"));
        }
        state.add_folder_chain(folder);
        Ok(())
    }
}

#[async_trait]
impl TripleStore for MemoryPod {
    async fn add_relationship(
        &self,
        doc_url: &str,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<()> {
        let mut state = self.state()?;
        state.record(Operation::AddRelationship, doc_url)?;
        let doc = document_url(doc_url);
        if !state.documents.contains_key(doc) {
            state.put_document(
                doc,
                Document {
                    body: Vec::new(),
                    content_type: vocab::TURTLE.to_string(),
                    triples: Vec::new(),
                },
            );
        }

        let triple = Triple::new(subject, predicate, object);
        if let Some(document) = state.documents.get_mut(doc) {
            if !document.triples.contains(&triple) {
                document.triples.push(triple);
            }
        }
        Ok(())
    }

    async fn relationship_targets(
        &self,
        doc_url: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<Vec<String>> {
        let mut state = self.state()?;
        state.record(Operation::ReadRelationships, doc_url)?;
        let doc = document_url(doc_url);

        if state.folders.contains(doc) {
            if predicate == vocab::LDP_CONTAINS && document_url(subject) == doc {
                return Ok(state.children(doc));
            }
            return Ok(Vec::new());
        }

        let document = state
            .documents
            .get(doc)
            .ok_or_else(|| AppError::not_found(doc_url))?;
        Ok(document
            .triples
            .iter()
            .filter(|t| t.subject == subject && t.predicate == predicate)
            .map(|t| t.object.clone())
            .collect())
    }
}
