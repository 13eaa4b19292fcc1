//! `SiteConfigRepository` over the in-memory store.

use async_trait::async_trait;

use crate::domain::ports::{SiteConfigRepository, SiteConfigRepositoryError};
use crate::domain::{ConfigKey, SiteConfig, SiteConfigUpsert};

use super::InMemoryStore;

#[async_trait]
impl SiteConfigRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<SiteConfig>, SiteConfigRepositoryError> {
        let state = self.lock().map_err(SiteConfigRepositoryError::query)?;
        Ok(state.site_configs.values().cloned().collect())
    }

    async fn find(&self, key: &ConfigKey) -> Result<Option<SiteConfig>, SiteConfigRepositoryError> {
        let state = self.lock().map_err(SiteConfigRepositoryError::query)?;
        Ok(state.site_configs.get(key).cloned())
    }

    async fn upsert(
        &self,
        entry: SiteConfigUpsert,
    ) -> Result<SiteConfig, SiteConfigRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(SiteConfigRepositoryError::query)?;
        let created_at = state
            .site_configs
            .get(entry.key())
            .map_or(now, |existing| existing.created_at);
        let stored = SiteConfig {
            key: entry.key().clone(),
            config_type: entry.config_type(),
            value: entry.value().to_owned(),
            label: entry.label().map(str::to_owned),
            description: entry.description().map(str::to_owned),
            created_at,
            updated_at: now,
        };
        state.site_configs.insert(stored.key.clone(), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, key: &ConfigKey) -> Result<bool, SiteConfigRepositoryError> {
        let mut state = self.lock().map_err(SiteConfigRepositoryError::query)?;
        Ok(state.site_configs.remove(key).is_some())
    }
}
