//! Category use-cases.

use std::sync::Arc;

use pagination::{Page, PageRequest};

use super::ports::{CategoryRepository, CategoryRepositoryError};
use super::repository_errors::{category_in_use, map_category_error};
use super::{
    Category, CategoryChanges, CategoryDetails, CategoryId, CategoryWithProductCount, Error,
    NewCategory,
};

/// Message returned when a category id does not resolve.
pub const CATEGORY_NOT_FOUND_MESSAGE: &str = "Categoría no encontrada";
const DUPLICATE_NAME_MESSAGE: &str = "Ya existe una categoría con este nombre";

/// Category reads and admin writes.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create the service over a category repository.
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// Page of categories ordered by name.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list(&self, page: PageRequest) -> Result<Page<CategoryWithProductCount>, Error> {
        self.categories.list(page).await.map_err(map_category_error)
    }

    /// One category with its products.
    ///
    /// # Errors
    /// `not_found` when the id does not resolve.
    pub async fn get(&self, id: CategoryId) -> Result<CategoryDetails, Error> {
        self.categories
            .find_details(id)
            .await
            .map_err(map_category_error)?
            .ok_or_else(|| Error::not_found(CATEGORY_NOT_FOUND_MESSAGE))
    }

    /// Create a category with a unique name.
    ///
    /// # Errors
    /// `conflict` when the name is taken.
    pub async fn create(&self, category: NewCategory) -> Result<Category, Error> {
        let existing = self
            .categories
            .find_by_name(&category.name)
            .await
            .map_err(map_category_error)?;
        if existing.is_some() {
            return Err(Error::conflict(DUPLICATE_NAME_MESSAGE));
        }
        self.categories
            .create(category)
            .await
            .map_err(map_category_error)
    }

    /// Merge `changes` into the stored category.
    ///
    /// # Errors
    /// `not_found` for unknown ids, `conflict` when a new name is taken.
    pub async fn update(&self, id: CategoryId, changes: CategoryChanges) -> Result<Category, Error> {
        let current = self.require(id).await?;
        if let Some(name) = changes.name.as_ref().filter(|name| **name != current.name) {
            let clash = self
                .categories
                .find_by_name(name)
                .await
                .map_err(map_category_error)?;
            if clash.is_some_and(|other| other.id != id) {
                return Err(Error::conflict(DUPLICATE_NAME_MESSAGE));
            }
        }
        self.categories
            .update(id, changes)
            .await
            .map_err(map_category_error)?
            .ok_or_else(|| Error::not_found(CATEGORY_NOT_FOUND_MESSAGE))
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    /// `not_found` for unknown ids, `conflict` while products reference it.
    pub async fn delete(&self, id: CategoryId) -> Result<(), Error> {
        self.require(id).await?;
        let product_count = self
            .categories
            .count_products(id)
            .await
            .map_err(map_category_error)?;
        if product_count > 0 {
            return Err(category_in_use(product_count));
        }
        match self.categories.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::not_found(CATEGORY_NOT_FOUND_MESSAGE)),
            Err(CategoryRepositoryError::InUse { product_count }) => {
                Err(category_in_use(product_count))
            }
            Err(other) => Err(map_category_error(other)),
        }
    }

    /// Fetch a category or fail with `not_found`.
    ///
    /// # Errors
    /// `not_found` when the id does not resolve.
    pub async fn require(&self, id: CategoryId) -> Result<Category, Error> {
        self.categories
            .find_by_id(id)
            .await
            .map_err(map_category_error)?
            .ok_or_else(|| Error::not_found(CATEGORY_NOT_FOUND_MESSAGE))
    }
}

#[cfg(test)]
#[path = "category_service_tests.rs"]
mod tests;
