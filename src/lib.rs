// src/lib.rs

//! Annonces Library
//!
//! Publishes classified-ad listings into a user's own storage and keeps a
//! shared, date-partitioned feed and category index pointing at them.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
pub use models::{Config, Listing, ListingDraft, Session};
pub use services::{ListingStore, Outcome, SkipReason};
