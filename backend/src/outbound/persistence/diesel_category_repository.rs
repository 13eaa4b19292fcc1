//! PostgreSQL-backed `CategoryRepository` implementation using Diesel ORM.
//!
//! `categories_name_key` guards name uniqueness and the RESTRICT foreign key
//! on `products.category_id` stops a category with products from being
//! deleted; both surface as typed repository errors.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{CategoryRepository, CategoryRepositoryError};
use crate::domain::{
    Category, CategoryChanges, CategoryDetails, CategoryId, CategoryName,
    CategoryWithProductCount, NewCategory, Product,
};

use super::diesel_error_mapping::{StoreFailure, count_to_u64, page_bounds};
use super::models::{CategoryRow, CategoryUpdate, CorruptRow, NewCategoryRow, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::{categories, products};

/// Diesel-backed implementation of the `CategoryRepository` port.
#[derive(Clone)]
pub struct DieselCategoryRepository {
    pool: DbPool,
}

impl DieselCategoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> CategoryRepositoryError {
    match failure {
        StoreFailure::Connection(message) => CategoryRepositoryError::connection(message),
        other => CategoryRepositoryError::query(other.describe()),
    }
}

fn map_pool_error(error: PoolError) -> CategoryRepositoryError {
    map_failure(error.into())
}

fn map_diesel_error(error: diesel::result::Error) -> CategoryRepositoryError {
    map_failure(error.into())
}

fn map_write_error(error: diesel::result::Error, name: Option<&str>) -> CategoryRepositoryError {
    match (StoreFailure::from(error), name) {
        (StoreFailure::UniqueViolation { .. }, Some(name)) => {
            CategoryRepositoryError::duplicate_name(name)
        }
        (other, _) => map_failure(other),
    }
}

fn map_corrupt(error: CorruptRow) -> CategoryRepositoryError {
    CategoryRepositoryError::query(error.to_string())
}

async fn count_products_with<C>(conn: &mut C, id: i32) -> Result<u64, CategoryRepositoryError>
where
    C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    let total: i64 = products::table
        .filter(products::category_id.eq(id))
        .count()
        .get_result(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(count_to_u64(total))
}

#[async_trait]
impl CategoryRepository for DieselCategoryRepository {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Page<CategoryWithProductCount>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (limit, offset) = page_bounds(page);

        let total: i64 = categories::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<CategoryRow> = categories::table
            .order((categories::name.asc(), categories::id.asc()))
            .limit(limit)
            .offset(offset)
            .select(CategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let product_counts: HashMap<i32, i64> = products::table
            .filter(products::category_id.eq_any(ids))
            .group_by(products::category_id)
            .select((products::category_id, count_star()))
            .load::<(i32, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        let items = rows
            .into_iter()
            .map(|row| {
                let product_count = product_counts.get(&row.id).copied().unwrap_or_default();
                Category::try_from(row).map(|category| CategoryWithProductCount {
                    category,
                    product_count: count_to_u64(product_count),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_corrupt)?;

        Ok(Page::new(items, count_to_u64(total), page))
    }

    async fn find_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = categories::table
            .find(id.get())
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(Category::try_from).transpose().map_err(map_corrupt)
    }

    async fn find_details(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryDetails>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(row) = categories::table
            .find(id.get())
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let product_rows: Vec<ProductRow> = products::table
            .filter(products::category_id.eq(id.get()))
            .order(products::id.asc())
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let category = Category::try_from(row).map_err(map_corrupt)?;
        let products = product_rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_corrupt)?;

        Ok(Some(CategoryDetails { category, products }))
    }

    async fn find_by_name(
        &self,
        name: &CategoryName,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = categories::table
            .filter(categories::name.eq(name.as_str()))
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(Category::try_from).transpose().map_err(map_corrupt)
    }

    async fn create(&self, category: NewCategory) -> Result<Category, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewCategoryRow {
            name: category.name.as_str(),
            description: &category.description,
            image: category.image.as_deref(),
        };

        let row = diesel::insert_into(categories::table)
            .values(&new_row)
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, Some(category.name.as_str())))?;

        Category::try_from(row).map_err(map_corrupt)
    }

    async fn update(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = CategoryUpdate {
            updated_at: Utc::now(),
            name: changes.name.as_ref().map(CategoryName::as_str),
            description: changes.description.as_deref(),
            image: changes.image.as_deref(),
        };

        let row = diesel::update(categories::table.find(id.get()))
            .set(&changeset)
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, changeset.name))?;

        row.map(Category::try_from).transpose().map_err(map_corrupt)
    }

    async fn count_products(&self, id: CategoryId) -> Result<u64, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        count_products_with(&mut conn, id.get()).await
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = diesel::delete(categories::table.find(id.get()))
            .execute(&mut conn)
            .await;

        match outcome {
            Ok(deleted) => Ok(deleted > 0),
            Err(error) => match StoreFailure::from(error) {
                StoreFailure::ForeignKeyViolation { .. } => {
                    let product_count = count_products_with(&mut conn, id.get()).await?;
                    Err(CategoryRepositoryError::in_use(product_count))
                }
                other => Err(map_failure(other)),
            },
        }
    }
}
