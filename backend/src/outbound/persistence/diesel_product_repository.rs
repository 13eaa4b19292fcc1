//! PostgreSQL-backed `ProductRepository` implementation using Diesel ORM.
//!
//! Listings filter by category and a case-insensitive name substring; the
//! matching category names are fetched in a second query and stitched onto
//! each product.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{ProductRepository, ProductRepositoryError};
use crate::domain::{
    CategoryRef, NewProduct, Product, ProductChanges, ProductFilter, ProductId,
    ProductWithCategory,
};

use super::diesel_error_mapping::{StoreFailure, count_to_u64, page_bounds};
use super::models::{CategoryRefRow, CorruptRow, NewProductRow, ProductRow, ProductUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{categories, products};

/// Diesel-backed implementation of the `ProductRepository` port.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> ProductRepositoryError {
    match failure {
        StoreFailure::Connection(message) => ProductRepositoryError::connection(message),
        other => ProductRepositoryError::query(other.describe()),
    }
}

fn map_pool_error(error: PoolError) -> ProductRepositoryError {
    map_failure(error.into())
}

fn map_diesel_error(error: diesel::result::Error) -> ProductRepositoryError {
    map_failure(error.into())
}

/// Inserts and updates fail the category foreign key when it dangles.
fn map_write_error(
    error: diesel::result::Error,
    category_id: Option<i32>,
) -> ProductRepositoryError {
    match (StoreFailure::from(error), category_id) {
        (StoreFailure::ForeignKeyViolation { .. }, Some(category_id)) => {
            ProductRepositoryError::missing_category(category_id)
        }
        (other, _) => map_failure(other),
    }
}

/// Deletes fail the `order_items` foreign key once the product was ordered.
fn map_delete_error(error: diesel::result::Error) -> ProductRepositoryError {
    match StoreFailure::from(error) {
        StoreFailure::ForeignKeyViolation { .. } => ProductRepositoryError::referenced(),
        other => map_failure(other),
    }
}

fn map_corrupt(error: CorruptRow) -> ProductRepositoryError {
    ProductRepositoryError::query(error.to_string())
}

/// `%term%` with LIKE metacharacters escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn filtered(filter: &ProductFilter) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table.into_boxed();
    if let Some(category_id) = filter.category_id {
        query = query.filter(products::category_id.eq(category_id.get()));
    }
    if let Some(term) = filter.search.as_deref() {
        query = query.filter(products::name.ilike(contains_pattern(term)));
    }
    query
}

async fn attach_categories<C>(
    conn: &mut C,
    rows: Vec<ProductRow>,
) -> Result<Vec<ProductWithCategory>, ProductRepositoryError>
where
    C: diesel_async::AsyncConnection<Backend = Pg> + Send,
{
    let ids: BTreeSet<i32> = rows.iter().map(|row| row.category_id).collect();
    let refs: HashMap<i32, CategoryRef> = categories::table
        .filter(categories::id.eq_any(ids.into_iter().collect::<Vec<_>>()))
        .select(CategoryRefRow::as_select())
        .load::<CategoryRefRow>(conn)
        .await
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|row| CategoryRef::try_from(row).map(|category| (category.id.get(), category)))
        .collect::<Result<_, _>>()
        .map_err(map_corrupt)?;

    rows.into_iter()
        .map(|row| {
            let category = refs.get(&row.category_id).cloned().ok_or_else(|| {
                ProductRepositoryError::query(format!(
                    "product {} references missing category {}",
                    row.id, row.category_id
                ))
            })?;
            let product = Product::try_from(row).map_err(map_corrupt)?;
            Ok(ProductWithCategory { product, category })
        })
        .collect()
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn list(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductWithCategory>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (limit, offset) = page_bounds(page);

        let total: i64 = filtered(&filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<ProductRow> = filtered(&filter)
            .order(products::id.asc())
            .limit(limit)
            .offset(offset)
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let items = attach_categories(&mut conn, rows).await?;
        Ok(Page::new(items, count_to_u64(total), page))
    }

    async fn find_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithCategory>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(row) = products::table
            .find(id.get())
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let mut found = attach_categories(&mut conn, vec![row]).await?;
        Ok(found.pop())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewProductRow {
            name: product.name.as_str(),
            description: &product.description,
            price: product.price.amount(),
            stock: product.stock.units(),
            image: product.image.as_deref(),
            category_id: product.category_id.get(),
        };

        let row = diesel::insert_into(products::table)
            .values(&new_row)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, Some(new_row.category_id)))?;

        Product::try_from(row).map_err(map_corrupt)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = ProductUpdate {
            updated_at: Utc::now(),
            name: changes.name.as_ref().map(|name| name.as_str()),
            description: changes.description.as_deref(),
            price: changes.price.map(|price| price.amount()),
            stock: changes.stock.map(|stock| stock.units()),
            image: changes.image.as_deref(),
            category_id: changes.category_id.map(|category_id| category_id.get()),
        };

        let row = diesel::update(products::table.find(id.get()))
            .set(&changeset)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, changeset.category_id))?;

        row.map(Product::try_from).transpose().map_err(map_corrupt)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(products::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_delete_error)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::diesel_error_mapping::database_error;
    use diesel::result::DatabaseErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case("lamp", "%lamp%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("c:\\x", "%c:\\\\x%")]
    fn search_terms_are_escaped(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(term), expected);
    }

    #[rstest]
    fn dangling_category_is_typed() {
        let error = database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "products_category_id_fkey",
        );
        assert_eq!(
            map_write_error(error, Some(9)),
            ProductRepositoryError::missing_category(9)
        );
    }

    #[rstest]
    fn ordered_products_cannot_be_deleted() {
        let error = database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "order_items_product_id_fkey",
        );
        assert_eq!(map_delete_error(error), ProductRepositoryError::referenced());
    }
}
