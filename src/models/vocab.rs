//! Predicate IRIs used by the feed, the category index and containers.

/// Links a day's feed subject to each listing published that day.
pub const HAS_PART: &str = "http://purl.org/dc/terms/hasPart";

/// Links a category subject to each listing tagged with it.
pub const IS_PART_OF: &str = "http://purl.org/dc/terms/isPartOf";

/// Links a container to its members.
pub const LDP_CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";

/// Content type for documents holding relationships.
pub const TURTLE: &str = "text/turtle";

/// Content type for listing documents.
pub const JSON: &str = "application/json";
