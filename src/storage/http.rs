//! HTTP storage implementation for LDP / Solid servers.
//!
//! - Existence: `HEAD`
//! - Documents: `GET` / `PUT` / `DELETE`
//! - Containers: created with `PUT` on a URL ending in `/`, read as JSON-LD
//! - Relationships: appended with a SPARQL Update `PATCH`, read as JSON-LD
//!
//! Authentication is up to the caller: build a `reqwest::Client` carrying
//! whatever credentials the session provides and hand it to
//! [`HttpPod::with_client`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, IF_NONE_MATCH};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, vocab};
use crate::storage::paths::document_url;
use crate::storage::{DocumentTransport, FolderEntry, FolderListing, TripleStore, check_iri};
use crate::utils::http::create_async_client;

const JSON_LD: &str = "application/ld+json";
const SPARQL_UPDATE: &str = "application/sparql-update";

/// Pod reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPod {
    client: Client,
}

impl HttpPod {
    /// Create a pod client from HTTP settings.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?))
    }

    /// Use a pre-configured (typically authenticated) client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Turn a non-success response into an error.
    fn check(url: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(url));
        }
        Err(AppError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }

    /// Fetch a resource as JSON-LD.
    async fn get_json_ld(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(document_url(url))
            .header(ACCEPT, JSON_LD)
            .send()
            .await?;
        let bytes = Self::check(url, response)?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// SPARQL Update body appending one relationship.
///
/// Fails for IRIs that would break out of their `<...>` delimiters.
pub fn sparql_insert(subject: &str, predicate: &str, object: &str) -> Result<String> {
    for iri in [subject, predicate, object] {
        check_iri(iri)?;
    }
    Ok(format!(
        "INSERT DATA {{ <{subject}> <{predicate}> <{object}> . }}"
    ))
}

/// Object IRIs of `subject predicate ?o` in an expanded JSON-LD document.
///
/// Accepts a top-level node array, a `@graph` wrapper, or a single node.
pub fn json_ld_targets(doc: &Value, subject: &str, predicate: &str) -> Vec<String> {
    let nodes: Vec<&Value> = match doc {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![doc],
        },
        _ => Vec::new(),
    };

    nodes
        .into_iter()
        .filter(|node| node.get("@id").and_then(Value::as_str) == Some(subject))
        .filter_map(|node| node.get(predicate))
        .flat_map(|values| match values {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .filter_map(|value| {
            value
                .get("@id")
                .and_then(Value::as_str)
                .or_else(|| value.as_str())
                .map(str::to_string)
        })
        .collect()
}

#[async_trait]
impl DocumentTransport for HttpPod {
    async fn exists(&self, url: &str) -> Result<bool> {
        let response = self.client.head(document_url(url)).send().await?;
        match Self::check(url, response) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read_document(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(document_url(url)).send().await?;
        Ok(Self::check(url, response)?.bytes().await?.to_vec())
    }

    async fn write_document(&self, url: &str, body: &[u8], content_type: &str) -> Result<()> {
        let response = self
            .client
            .put(document_url(url))
            .header(CONTENT_TYPE, content_type)
            .body(body.to_vec())
            .send()
            .await?;
        Self::check(url, response)?;
        log::debug!("PUT {} ({} bytes)", url, body.len());
        Ok(())
    }

    async fn create_document(&self, url: &str, content_type: &str) -> Result<bool> {
        let response = self
            .client
            .put(document_url(url))
            .header(CONTENT_TYPE, content_type)
            .header(IF_NONE_MATCH, "*")
            .body(Vec::new())
            .send()
            .await?;
        if response.status() == StatusCode::PRECONDITION_FAILED {
            log::debug!("{} already exists", url);
            return Ok(false);
        }
        Self::check(url, response)?;
        Ok(true)
    }

    async fn delete_document(&self, url: &str) -> Result<()> {
        let response = self.client.delete(document_url(url)).send().await?;
        Self::check(url, response)?;
        Ok(())
    }

    async fn list_folder(&self, url: &str) -> Result<FolderListing> {
        let folder = document_url(url);
        let doc = self.get_json_ld(folder).await?;

        let mut listing = FolderListing::default();
        for member in json_ld_targets(&doc, folder, vocab::LDP_CONTAINS) {
            let entry = FolderEntry { url: member };
            if entry.url.ends_with('/') {
                listing.folders.push(entry);
            } else {
                listing.files.push(entry);
            }
        }
        Ok(listing)
    }

    async fn create_folder(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .put(document_url(url))
            .header(CONTENT_TYPE, vocab::TURTLE)
            .body(Vec::new())
            .send()
            .await?;
        Self::check(url, response)?;
        log::debug!("Created container {}", url);
        Ok(())
    }
}

#[async_trait]
impl TripleStore for HttpPod {
    async fn add_relationship(
        &self,
        doc_url: &str,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<()> {
        let response = self
            .client
            .patch(document_url(doc_url))
            .header(CONTENT_TYPE, SPARQL_UPDATE)
            .body(sparql_insert(subject, predicate, object)?)
            .send()
            .await?;
        Self::check(doc_url, response)?;
        Ok(())
    }

    async fn relationship_targets(
        &self,
        doc_url: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<Vec<String>> {
        let doc = self.get_json_ld(doc_url).await?;
        Ok(json_ld_targets(&doc, subject, predicate))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sparql_insert() {
        assert_eq!(
            sparql_insert("https://r.example/1.ttl#this", vocab::HAS_PART, "https://u.example/a.json")
                .unwrap(),
            "INSERT DATA { <https://r.example/1.ttl#this> <http://purl.org/dc/terms/hasPart> <https://u.example/a.json> . }"
        );
    }

    #[test]
    fn test_sparql_insert_rejects_breaking_iris() {
        let injected = "https://u.example/a.json> . } ; DROP ALL ; INSERT DATA { <https://x.example/";
        assert!(sparql_insert("https://r.example/1.ttl#this", vocab::HAS_PART, injected).is_err());
        assert!(sparql_insert("https://r.example/1.ttl#a b", vocab::HAS_PART, "https://u.example/a").is_err());
    }

    #[test]
    fn test_json_ld_targets_expanded_array() {
        let doc = json!([
            {
                "@id": "https://u.example/c/",
                "http://www.w3.org/ns/ldp#contains": [
                    {"@id": "https://u.example/c/a.json"},
                    {"@id": "https://u.example/c/sub/"}
                ]
            },
            {"@id": "https://u.example/c/a.json"}
        ]);
        assert_eq!(
            json_ld_targets(&doc, "https://u.example/c/", vocab::LDP_CONTAINS),
            vec!["https://u.example/c/a.json", "https://u.example/c/sub/"]
        );
    }

    #[test]
    fn test_json_ld_targets_graph_and_single_value() {
        let doc = json!({
            "@graph": [
                {
                    "@id": "https://r.example/categories.ttl#sport",
                    "http://purl.org/dc/terms/isPartOf": {"@id": "https://u.example/a.json"}
                }
            ]
        });
        assert_eq!(
            json_ld_targets(&doc, "https://r.example/categories.ttl#sport", vocab::IS_PART_OF),
            vec!["https://u.example/a.json"]
        );
    }

    #[test]
    fn test_json_ld_targets_missing_subject() {
        let doc = json!([{"@id": "https://u.example/other"}]);
        assert!(json_ld_targets(&doc, "https://u.example/c/", vocab::LDP_CONTAINS).is_empty());
    }

    #[test]
    fn test_new_from_config() {
        assert!(HttpPod::new(&HttpConfig::default()).is_ok());
    }
}
