//! Listing data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::id::new_listing_id;

/// User-supplied fields of a listing before it gets an identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    /// Single category or a comma-delimited list of terms
    pub category: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// A classified-ad record as persisted in the owner's storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique identifier, assigned once at creation
    pub id: String,

    /// Document address, set at first successful write
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub currency: Option<String>,

    /// Set once, on first successful persist
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// One entry per update after creation
    #[serde(default)]
    pub modified: Vec<DateTime<Utc>>,

    /// Identity URL of the publishing user
    #[serde(default)]
    pub creator: Option<String>,
}

impl Listing {
    /// Build a fresh, unpersisted listing from a draft.
    pub fn from_draft(draft: ListingDraft) -> Self {
        Self {
            id: new_listing_id(),
            url: None,
            title: draft.title,
            category: draft.category,
            description: draft.description,
            price: draft.price,
            currency: draft.currency,
            created: None,
            modified: Vec::new(),
            creator: None,
        }
    }

    /// Stamp creation or modification time, and the creator if unknown.
    pub fn stamp(&mut self, now: DateTime<Utc>, creator: Option<&str>) {
        match self.created {
            None => self.created = Some(now),
            Some(_) => self.modified.push(now),
        }
        if self.creator.is_none() {
            self.creator = creator.map(str::to_string);
        }
    }

    /// Copy every field of `other` over this entry.
    pub fn merge_from(&mut self, other: &Listing) {
        self.clone_from(other);
    }

    /// Category terms this listing is indexed under.
    pub fn category_terms(&self) -> Vec<String> {
        split_category_terms(&self.category)
    }
}

/// Split a category field on commas, trim each term, drop repeats.
///
/// An empty field yields a single empty term.
pub fn split_category_terms(category: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in category.split(',').map(str::trim) {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn bike() -> Listing {
        Listing::from_draft(ListingDraft {
            title: "Bike".into(),
            category: "sport, outdoor".into(),
            price: Some(50.0),
            ..ListingDraft::default()
        })
    }

    #[test]
    fn test_from_draft_assigns_id_only() {
        let listing = bike();
        assert!(!listing.id.is_empty());
        assert!(listing.url.is_none());
        assert!(listing.created.is_none());
        assert!(listing.modified.is_empty());
        assert!(listing.creator.is_none());
    }

    #[test]
    fn test_stamp_sets_created_then_appends_modified() {
        let mut listing = bike();
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        listing.stamp(t1, Some("https://u.example/profile/card#me"));
        assert_eq!(listing.created, Some(t1));
        assert!(listing.modified.is_empty());

        listing.stamp(t2, Some("https://other.example/profile/card#me"));
        assert_eq!(listing.created, Some(t1));
        assert_eq!(listing.modified, vec![t2]);
        assert_eq!(
            listing.creator.as_deref(),
            Some("https://u.example/profile/card#me")
        );
    }

    #[test]
    fn test_split_terms_trims_and_dedups() {
        assert_eq!(split_category_terms("sport, outdoor"), vec!["sport", "outdoor"]);
        assert_eq!(
            split_category_terms(" sport ,outdoor, sport"),
            vec!["sport", "outdoor"]
        );
        assert_eq!(split_category_terms("books"), vec!["books"]);
        assert_eq!(bike().category_terms(), vec!["sport", "outdoor"]);
    }

    #[test]
    fn test_split_terms_empty_field() {
        assert_eq!(split_category_terms(""), vec![""]);
    }

    #[test]
    fn test_json_field_names() {
        let mut listing = bike();
        listing.url = Some("https://u.example/public/annonces/x.json".into());
        let value = serde_json::to_value(&listing).unwrap();
        for field in [
            "id",
            "url",
            "title",
            "category",
            "description",
            "price",
            "currency",
            "created",
            "modified",
            "creator",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_parse_minimal_document() {
        let listing: Listing = serde_json::from_str(r#"{"id":"abc","title":"Lamp"}"#).unwrap();
        assert_eq!(listing.id, "abc");
        assert_eq!(listing.title, "Lamp");
        assert!(listing.modified.is_empty());
    }
}
