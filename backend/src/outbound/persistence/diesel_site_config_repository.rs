//! PostgreSQL-backed `SiteConfigRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SiteConfigRepository, SiteConfigRepositoryError};
use crate::domain::{ConfigKey, SiteConfig, SiteConfigUpsert};

use super::diesel_error_mapping::StoreFailure;
use super::models::{CorruptRow, SiteConfigRow, SiteConfigRowWrite};
use super::pool::{DbPool, PoolError};
use super::schema::site_configs;

/// Diesel-backed implementation of the `SiteConfigRepository` port.
///
/// Upserts use `ON CONFLICT (key) DO UPDATE`, so concurrent writers of the
/// same key end with the last write and never fail on the primary key.
#[derive(Clone)]
pub struct DieselSiteConfigRepository {
    pool: DbPool,
}

impl DieselSiteConfigRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> SiteConfigRepositoryError {
    match failure {
        StoreFailure::Connection(message) => SiteConfigRepositoryError::connection(message),
        other => SiteConfigRepositoryError::query(other.describe()),
    }
}

fn map_pool_error(error: PoolError) -> SiteConfigRepositoryError {
    map_failure(error.into())
}

fn map_diesel_error(error: diesel::result::Error) -> SiteConfigRepositoryError {
    map_failure(error.into())
}

fn map_corrupt(error: CorruptRow) -> SiteConfigRepositoryError {
    SiteConfigRepositoryError::query(error.to_string())
}

#[async_trait]
impl SiteConfigRepository for DieselSiteConfigRepository {
    async fn list(&self) -> Result<Vec<SiteConfig>, SiteConfigRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<SiteConfigRow> = site_configs::table
            .order(site_configs::key.asc())
            .select(SiteConfigRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(SiteConfig::try_from)
            .collect::<Result<_, _>>()
            .map_err(map_corrupt)
    }

    async fn find(&self, key: &ConfigKey) -> Result<Option<SiteConfig>, SiteConfigRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = site_configs::table
            .find(key.as_str())
            .select(SiteConfigRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(SiteConfig::try_from).transpose().map_err(map_corrupt)
    }

    async fn upsert(
        &self,
        entry: SiteConfigUpsert,
    ) -> Result<SiteConfig, SiteConfigRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let write = SiteConfigRowWrite {
            key: entry.key().as_str(),
            config_type: entry.config_type().as_str(),
            value: entry.value(),
            label: entry.label(),
            description: entry.description(),
        };

        let row = diesel::insert_into(site_configs::table)
            .values(&write)
            .on_conflict(site_configs::key)
            .do_update()
            .set((&write, site_configs::updated_at.eq(Utc::now())))
            .returning(SiteConfigRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        SiteConfig::try_from(row).map_err(map_corrupt)
    }

    async fn delete(&self, key: &ConfigKey) -> Result<bool, SiteConfigRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(site_configs::table.find(key.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
