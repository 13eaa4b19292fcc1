//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Email uniqueness is enforced by the `users_email_key` constraint; the
//! adapter turns violations into `DuplicateEmail` so concurrent sign-ups
//! cannot both succeed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    EmailAddress, NewUser, TimeWindow, User, UserChanges, UserId, UserWithOrderCount,
};

use super::diesel_error_mapping::{StoreFailure, count_to_u64, page_bounds};
use super::models::{CorruptRow, NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{orders, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> UserRepositoryError {
    match failure {
        StoreFailure::Connection(message) => UserRepositoryError::connection(message),
        other => UserRepositoryError::query(other.describe()),
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_failure(error.into())
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_failure(error.into())
}

/// Writes touching `email` translate unique violations into duplicates.
fn map_write_error(error: diesel::result::Error, email: Option<&str>) -> UserRepositoryError {
    match (StoreFailure::from(error), email) {
        (StoreFailure::UniqueViolation { .. }, Some(email)) => {
            UserRepositoryError::duplicate_email(email)
        }
        (other, _) => map_failure(other),
    }
}

fn map_corrupt(error: CorruptRow) -> UserRepositoryError {
    UserRepositoryError::query(error.to_string())
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(User::try_from).transpose().map_err(map_corrupt)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(User::try_from).transpose().map_err(map_corrupt)
    }

    async fn create(&self, user: NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            name: user.name.as_str(),
            email: user.email.as_str(),
            password_hash: user.password_hash.as_str(),
            role: user.role.as_str(),
        };

        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, Some(user.email.as_str())))?;

        User::try_from(row).map_err(map_corrupt)
    }

    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = UserUpdate {
            updated_at: Utc::now(),
            name: changes.name.as_ref().map(|name| name.as_str()),
            email: changes.email.as_ref().map(|email| email.as_str()),
            role: changes.role.map(|role| role.as_str()),
        };

        let row = diesel::update(users::table.find(id.get()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, changeset.email))?;

        row.map(User::try_from).transpose().map_err(map_corrupt)
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Page<UserWithOrderCount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (limit, offset) = page_bounds(page);

        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .limit(limit)
            .offset(offset)
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let order_counts: HashMap<i32, i64> = orders::table
            .filter(orders::user_id.eq_any(ids))
            .group_by(orders::user_id)
            .select((orders::user_id, count_star()))
            .load::<(i32, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        let items = rows
            .into_iter()
            .map(|row| {
                let order_count = order_counts.get(&row.id).copied().unwrap_or_default();
                User::try_from(row).map(|user| UserWithOrderCount {
                    user,
                    order_count: count_to_u64(order_count),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_corrupt)?;

        Ok(Page::new(items, count_to_u64(total), page))
    }

    async fn count(&self) -> Result<u64, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(count_to_u64(total))
    }

    async fn count_created_in(&self, window: TimeWindow) -> Result<u64, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = users::table
            .filter(users::created_at.ge(window.start))
            .into_boxed();
        if let Some(end) = window.end {
            query = query.filter(users::created_at.lt(end));
        }

        let total: i64 = query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(count_to_u64(total))
    }
}
