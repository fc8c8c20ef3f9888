//! Resolved identity handed in by the session collaborator.

use serde::{Deserialize, Serialize};

/// Identity and storage binding of the acting user.
///
/// Every store operation takes the session explicitly. A session without a
/// storage root means "not logged in" and turns operations into skips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identity URL of the user (becomes the listing `creator`)
    pub web_id: Option<String>,

    /// Root URL of the user's storage space
    pub storage: Option<String>,
}

impl Session {
    /// Create a session for a resolved identity and storage root.
    pub fn new(web_id: impl Into<String>, storage: impl Into<String>) -> Self {
        Self {
            web_id: Some(web_id.into()),
            storage: Some(storage.into()),
        }
    }

    /// A session with nothing resolved.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Storage root, if the user is logged in.
    pub fn storage_root(&self) -> Option<&str> {
        self.storage.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_storage() {
        assert_eq!(Session::anonymous().storage_root(), None);
    }

    #[test]
    fn test_blank_storage_counts_as_missing() {
        let session = Session {
            web_id: Some("https://u.example/profile/card#me".into()),
            storage: Some("  ".into()),
        };
        assert_eq!(session.storage_root(), None);
    }
}
