//! Container bootstrapping.

use crate::error::Result;
use crate::storage::DocumentTransport;

/// Makes sure a container exists before documents are written into it.
pub struct FolderBootstrapper<'a> {
    transport: &'a dyn DocumentTransport,
}

impl<'a> FolderBootstrapper<'a> {
    pub fn new(transport: &'a dyn DocumentTransport) -> Self {
        Self { transport }
    }

    /// Create the container at `url` unless it already exists.
    ///
    /// Returns whether this call created it. Losing a creation race to
    /// another writer counts as success.
    pub async fn ensure(&self, url: &str) -> Result<bool> {
        if self.transport.exists(url).await? {
            return Ok(false);
        }

        match self.transport.create_folder(url).await {
            Ok(()) => {
                log::info!("Created container {}", url);
                Ok(true)
            }
            Err(error) => {
                if self.transport.exists(url).await? {
                    log::debug!("Container {} appeared concurrently: {}", url, error);
                    Ok(false)
                } else {
                    Err(error)
                }
            }
        }
    }
}
