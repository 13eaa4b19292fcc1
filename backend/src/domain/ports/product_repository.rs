//! Port for product persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    NewProduct, Product, ProductChanges, ProductFilter, ProductId, ProductWithCategory,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by product repository adapters.
    pub enum ProductRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "product repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "product repository query failed: {message}",
        /// The referenced category does not exist.
        MissingCategory { category_id: i32 } => "category {category_id} does not exist",
        /// Order items still reference the product.
        Referenced => "product is referenced by existing orders",
    }
}

/// Storage for catalogue products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Page of products matching `filter`, ordered by id.
    async fn list(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductWithCategory>, ProductRepositoryError>;

    /// Fetch a product with its category reference.
    async fn find_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithCategory>, ProductRepositoryError>;

    /// Insert a product.
    async fn create(&self, product: NewProduct) -> Result<Product, ProductRepositoryError>;

    /// Apply a partial update; `None` when the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, ProductRepositoryError>;

    /// Delete a product; `false` when nothing was deleted.
    ///
    /// Fails with [`ProductRepositoryError::Referenced`] once it has been
    /// ordered.
    async fn delete(&self, id: ProductId) -> Result<bool, ProductRepositoryError>;
}
