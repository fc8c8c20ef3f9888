//! Service layer for listing management.
//!
//! This module contains the business logic for:
//! - Listing CRUD against the owner's storage (`ListingStore`)
//! - Container bootstrapping (`FolderBootstrapper`)

mod folders;
mod listings;

pub use folders::FolderBootstrapper;
pub use listings::{ListingStore, LoadReport, PublishReceipt, SkippedDocument};

/// Why an operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The session has no resolved storage root
    Unauthenticated,
}

/// Result of an operation that is silently skipped when not logged in.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }
}
