//! Site configuration use-cases.

use std::sync::Arc;

use super::ports::SiteConfigRepository;
use super::repository_errors::map_site_config_error;
use super::{ConfigKey, Error, SiteConfig, SiteConfigUpsert};

/// Message returned when a key does not resolve.
pub const CONFIG_NOT_FOUND_MESSAGE: &str = "Configuración no encontrada";

/// Public reads and admin upserts of configuration entries.
#[derive(Clone)]
pub struct SiteConfigService {
    entries: Arc<dyn SiteConfigRepository>,
}

impl SiteConfigService {
    /// Create the service over a configuration repository.
    pub fn new(entries: Arc<dyn SiteConfigRepository>) -> Self {
        Self { entries }
    }

    /// Every entry, ordered by key.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list(&self) -> Result<Vec<SiteConfig>, Error> {
        self.entries.list().await.map_err(map_site_config_error)
    }

    /// One entry.
    ///
    /// # Errors
    /// `not_found` when the key is absent.
    pub async fn get(&self, key: &ConfigKey) -> Result<SiteConfig, Error> {
        self.entries
            .find(key)
            .await
            .map_err(map_site_config_error)?
            .ok_or_else(|| Error::not_found(CONFIG_NOT_FOUND_MESSAGE))
    }

    /// Create or replace the entry under the upsert's key.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn upsert(&self, entry: SiteConfigUpsert) -> Result<SiteConfig, Error> {
        self.entries
            .upsert(entry)
            .await
            .map_err(map_site_config_error)
    }

    /// Delete an entry.
    ///
    /// # Errors
    /// `not_found` when the key is absent.
    pub async fn delete(&self, key: &ConfigKey) -> Result<(), Error> {
        let deleted = self
            .entries
            .delete(key)
            .await
            .map_err(map_site_config_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(CONFIG_NOT_FOUND_MESSAGE))
        }
    }
}
