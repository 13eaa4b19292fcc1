//! Product use-cases.

use std::sync::Arc;

use pagination::{Page, PageRequest};

use super::ports::{CategoryRepository, ProductRepository};
use super::repository_errors::{map_category_error, map_product_error};
use super::{
    CategoryId, Error, NewProduct, Product, ProductChanges, ProductFilter, ProductId,
    ProductWithCategory,
};

/// Message returned when a product id does not resolve.
pub const PRODUCT_NOT_FOUND_MESSAGE: &str = "Product not found";
const CATEGORY_MISSING_MESSAGE: &str = "Category not found.";

/// Product reads and admin writes.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ProductService {
    /// Create the service; categories are consulted to validate references.
    pub fn new(
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// Page of products matching `filter`.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductWithCategory>, Error> {
        self.products
            .list(filter, page)
            .await
            .map_err(map_product_error)
    }

    /// One product with its category.
    ///
    /// # Errors
    /// `not_found` when the id does not resolve.
    pub async fn get(&self, id: ProductId) -> Result<ProductWithCategory, Error> {
        self.products
            .find_by_id(id)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| Error::not_found(PRODUCT_NOT_FOUND_MESSAGE))
    }

    /// Create a product in an existing category.
    ///
    /// # Errors
    /// `not_found` when the category does not exist; nothing is inserted.
    pub async fn create(&self, product: NewProduct) -> Result<Product, Error> {
        self.ensure_category(product.category_id).await?;
        self.products
            .create(product)
            .await
            .map_err(map_product_error)
    }

    /// Merge `changes` into the stored product.
    ///
    /// # Errors
    /// `not_found` for unknown products or a missing new category.
    pub async fn update(&self, id: ProductId, changes: ProductChanges) -> Result<Product, Error> {
        let current = self.get(id).await?;
        if let Some(category_id) = changes
            .category_id
            .filter(|category_id| *category_id != current.product.category_id)
        {
            self.ensure_category(category_id).await?;
        }
        self.products
            .update(id, changes)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| Error::not_found(PRODUCT_NOT_FOUND_MESSAGE))
    }

    /// Delete a product.
    ///
    /// # Errors
    /// `not_found` when the id does not resolve.
    pub async fn delete(&self, id: ProductId) -> Result<(), Error> {
        let deleted = self.products.delete(id).await.map_err(map_product_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(PRODUCT_NOT_FOUND_MESSAGE))
        }
    }

    async fn ensure_category(&self, id: CategoryId) -> Result<(), Error> {
        let category = self
            .categories
            .find_by_id(id)
            .await
            .map_err(map_category_error)?;
        if category.is_none() {
            return Err(Error::not_found(CATEGORY_MISSING_MESSAGE));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "product_service_tests.rs"]
mod tests;
