//! Port for site configuration persistence.

use async_trait::async_trait;

use crate::domain::{ConfigKey, SiteConfig, SiteConfigUpsert};

use super::define_port_error;

define_port_error! {
    /// Errors raised by site configuration adapters.
    pub enum SiteConfigRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "site config repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "site config repository query failed: {message}",
    }
}

/// Storage for keyed configuration entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SiteConfigRepository: Send + Sync {
    /// Every entry, ordered by key.
    async fn list(&self) -> Result<Vec<SiteConfig>, SiteConfigRepositoryError>;

    /// Fetch one entry.
    async fn find(&self, key: &ConfigKey) -> Result<Option<SiteConfig>, SiteConfigRepositoryError>;

    /// Insert the entry or replace the one stored under the same key.
    async fn upsert(&self, entry: SiteConfigUpsert)
    -> Result<SiteConfig, SiteConfigRepositoryError>;

    /// Delete an entry; `false` when nothing was deleted.
    async fn delete(&self, key: &ConfigKey) -> Result<bool, SiteConfigRepositoryError>;
}
