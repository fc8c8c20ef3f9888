//! Listing identifier generation.

use uuid::Uuid;

/// Produce a fresh random (version 4) identifier for a listing.
pub fn new_listing_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_are_v4_and_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| new_listing_id()).collect();
        assert_eq!(ids.len(), 1000);

        let parsed = Uuid::parse_str(ids.iter().next().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}
