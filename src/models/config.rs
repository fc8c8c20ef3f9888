//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where listings live inside a user's storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Shared feed and category index location
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let listings = &self.storage.listings_path;
        if listings.trim().is_empty() {
            return Err(AppError::validation("storage.listings_path is empty"));
        }
        if listings.starts_with('/') || !listings.ends_with('/') {
            return Err(AppError::validation(
                "storage.listings_path must be relative and end with '/'",
            ));
        }
        if let Some(root) = &self.registry.root {
            Url::parse(root)
                .map_err(|e| AppError::config(format!("registry.root {root:?}: {e}")))?;
            if !root.ends_with('/') {
                return Err(AppError::validation("registry.root must end with '/'"));
            }
        }
        if self.registry.path.starts_with('/') || !self.registry.path.ends_with('/') {
            return Err(AppError::validation(
                "registry.path must be relative and end with '/'",
            ));
        }
        let ext = &self.registry.feed_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(AppError::validation(
                "registry.feed_extension must be a bare extension like \"ttl\"",
            ));
        }
        let index = &self.registry.category_index;
        if index.is_empty() || index.contains('/') || index.contains('#') {
            return Err(AppError::validation(
                "registry.category_index must be a bare file name",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Registry root used for a publisher with the given storage root.
    ///
    /// A configured root wins; otherwise the registry lives inside the
    /// publisher's own storage.
    pub fn registry_root(&self, storage_root: &str) -> String {
        match &self.registry.root {
            Some(root) => root.clone(),
            None => format!(
                "{}/{}",
                storage_root.trim_end_matches('/'),
                self.registry.path
            ),
        }
    }
}

/// Location of listing documents inside a user's storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Container path relative to the storage root
    #[serde(default = "defaults::listings_path")]
    pub listings_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            listings_path: defaults::listings_path(),
        }
    }
}

/// Shared discovery point settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Absolute registry root; falls back to `{storage}/{path}`
    #[serde(default)]
    pub root: Option<String>,

    /// Registry path inside the publisher's storage when no root is set
    #[serde(default = "defaults::registry_path")]
    pub path: String,

    /// Extension of day feed documents
    #[serde(default = "defaults::feed_extension")]
    pub feed_extension: String,

    /// File name of the category index document
    #[serde(default = "defaults::category_index")]
    pub category_index: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: None,
            path: defaults::registry_path(),
            feed_extension: defaults::feed_extension(),
            category_index: defaults::category_index(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

mod defaults {
    pub fn listings_path() -> String {
        "public/annonces/".into()
    }
    pub fn registry_path() -> String {
        "public/annonces/notifs/".into()
    }
    pub fn feed_extension() -> String {
        "ttl".into()
    }
    pub fn category_index() -> String {
        "categories.ttl".into()
    }

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; annonces/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [registry]
            root = "https://registry.example/notifs/"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.listings_path, "public/annonces/");
        assert_eq!(config.registry.feed_extension, "ttl");
        assert_eq!(
            config.registry.root.as_deref(),
            Some("https://registry.example/notifs/")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_absolute_listings_path() {
        let mut config = Config::default();
        config.storage.listings_path = "/public/annonces/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_registry_root() {
        let mut config = Config::default();
        config.registry.root = Some("not a url".into());
        assert!(config.validate().is_err());

        config.registry.root = Some("https://registry.example/notifs".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_dotted_extension() {
        let mut config = Config::default();
        config.registry.feed_extension = ".ttl".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn registry_root_falls_back_to_storage() {
        let config = Config::default();
        assert_eq!(
            config.registry_root("https://u.example/"),
            "https://u.example/public/annonces/notifs/"
        );

        let mut config = Config::default();
        config.registry.root = Some("https://registry.example/".into());
        assert_eq!(
            config.registry_root("https://u.example/"),
            "https://registry.example/"
        );
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here/config.toml");
        assert_eq!(config.registry.category_index, "categories.ttl");
    }
}
