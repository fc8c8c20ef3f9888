// src/models/mod.rs

//! Domain models for listings and their discovery indexes.
//!
//! This module contains the data structures shared by the store, the
//! storage backends and the indexing pipeline.

mod config;
mod listing;
mod session;
pub mod vocab;

// Re-export all public types
pub use config::{Config, HttpConfig, RegistryConfig, StorageConfig};
pub use listing::{Listing, ListingDraft, split_category_terms};
pub use session::Session;
