//! Forward an uploaded image to the host and link it to its entity.
//!
//! The sequence is not transactional: if linking fails after the upload
//! succeeded, the hosted image stays orphaned. Callers own the local file
//! and remove it once this service returns, whatever the outcome.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::ports::{
    CategoryRepository, HostedImage, ImageFolder, ImageStore, ProductRepository,
};
use super::repository_errors::{map_category_error, map_image_error, map_product_error};
use super::{
    CATEGORY_NOT_FOUND_MESSAGE, Category, CategoryChanges, CategoryId, Error, Product,
    ProductChanges, ProductId,
};

const PRODUCT_NOT_FOUND_MESSAGE: &str = "Producto no encontrado";

/// Entity updated with its freshly hosted image.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedImage<T> {
    /// The hosted image.
    pub image: HostedImage,
    /// The entity after its image field was patched.
    pub entity: T,
}

/// Image upload use-cases.
#[derive(Clone)]
pub struct ImageAttachmentService {
    images: Arc<dyn ImageStore>,
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ImageAttachmentService {
    /// Create the service over the image host and the entity stores.
    pub fn new(
        images: Arc<dyn ImageStore>,
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            images,
            products,
            categories,
        }
    }

    /// Upload `file` and set it as the product's image.
    ///
    /// # Errors
    /// `not_found` before uploading when the product does not exist;
    /// `service_unavailable` when no image host is configured.
    pub async fn attach_to_product(
        &self,
        id: ProductId,
        file: &Path,
    ) -> Result<AttachedImage<Product>, Error> {
        let existing = self
            .products
            .find_by_id(id)
            .await
            .map_err(map_product_error)?;
        if existing.is_none() {
            return Err(Error::not_found(PRODUCT_NOT_FOUND_MESSAGE));
        }

        let image = self.upload(file, ImageFolder::Products).await?;
        let changes = ProductChanges {
            image: Some(image.url.clone()),
            ..ProductChanges::default()
        };
        let entity = self
            .products
            .update(id, changes)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| orphaned(&image, PRODUCT_NOT_FOUND_MESSAGE))?;
        info!(product_id = %id, url = %image.url, "product image attached");
        Ok(AttachedImage { image, entity })
    }

    /// Upload `file` and set it as the category's image.
    ///
    /// # Errors
    /// `not_found` before uploading when the category does not exist;
    /// `service_unavailable` when no image host is configured.
    pub async fn attach_to_category(
        &self,
        id: CategoryId,
        file: &Path,
    ) -> Result<AttachedImage<Category>, Error> {
        let existing = self
            .categories
            .find_by_id(id)
            .await
            .map_err(map_category_error)?;
        if existing.is_none() {
            return Err(Error::not_found(CATEGORY_NOT_FOUND_MESSAGE));
        }

        let image = self.upload(file, ImageFolder::Categories).await?;
        let changes = CategoryChanges {
            image: Some(image.url.clone()),
            ..CategoryChanges::default()
        };
        let entity = self
            .categories
            .update(id, changes)
            .await
            .map_err(map_category_error)?
            .ok_or_else(|| orphaned(&image, CATEGORY_NOT_FOUND_MESSAGE))?;
        info!(category_id = %id, url = %image.url, "category image attached");
        Ok(AttachedImage { image, entity })
    }

    async fn upload(&self, file: &Path, folder: ImageFolder) -> Result<HostedImage, Error> {
        self.images
            .upload(file, folder)
            .await
            .map_err(map_image_error)
    }
}

fn orphaned(image: &HostedImage, message: &str) -> Error {
    warn!(public_id = %image.public_id, "entity vanished after image upload");
    Error::not_found(message)
}

#[cfg(test)]
#[path = "image_attachment_service_tests.rs"]
mod tests;
