//! Port for category persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    Category, CategoryChanges, CategoryDetails, CategoryId, CategoryName,
    CategoryWithProductCount, NewCategory,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by category repository adapters.
    pub enum CategoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "category repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "category repository query failed: {message}",
        /// The name unique constraint rejected the write.
        DuplicateName { name: String } => "category name already taken: {name}",
        /// Products still reference the category.
        InUse { product_count: u64 } => "category still has {product_count} products",
    }
}

/// Storage for product categories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Page of categories ordered by name, each with its product count.
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Page<CategoryWithProductCount>, CategoryRepositoryError>;

    /// Fetch a category by identifier.
    async fn find_by_id(&self, id: CategoryId)
    -> Result<Option<Category>, CategoryRepositoryError>;

    /// Fetch a category together with its products.
    async fn find_details(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryDetails>, CategoryRepositoryError>;

    /// Fetch a category by exact name.
    async fn find_by_name(
        &self,
        name: &CategoryName,
    ) -> Result<Option<Category>, CategoryRepositoryError>;

    /// Insert a category.
    async fn create(&self, category: NewCategory) -> Result<Category, CategoryRepositoryError>;

    /// Apply a partial update; `None` when the category does not exist.
    async fn update(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, CategoryRepositoryError>;

    /// Number of products filed under the category.
    async fn count_products(&self, id: CategoryId) -> Result<u64, CategoryRepositoryError>;

    /// Delete a category; `false` when nothing was deleted.
    ///
    /// Fails with [`CategoryRepositoryError::InUse`] while products reference
    /// it.
    async fn delete(&self, id: CategoryId) -> Result<bool, CategoryRepositoryError>;
}
