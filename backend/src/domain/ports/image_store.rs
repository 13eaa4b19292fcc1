//! Port for the external image host.

use std::path::Path;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image hosting adapters.
    pub enum ImageStoreError {
        /// No credentials were configured for the host.
        NotConfigured => "image storage is not configured",
        /// The request never reached the host or the response was unreadable.
        Transport { message: String } => "image upload transport failed: {message}",
        /// The host answered with an error.
        Rejected { status: u16, message: String } => "image host rejected upload ({status}): {message}",
    }
}

/// Remote folder an image is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    /// Product photos.
    Products,
    /// Category banners.
    Categories,
}

impl ImageFolder {
    /// Folder path on the image host.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "ecommerce/products",
            Self::Categories => "ecommerce/categories",
        }
    }
}

/// Image accepted by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    /// Public HTTPS URL.
    pub url: String,
    /// Host-side identifier.
    pub public_id: String,
}

/// Forwards local image files to the image host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload the file at `path` into `folder`.
    async fn upload(&self, path: &Path, folder: ImageFolder)
    -> Result<HostedImage, ImageStoreError>;
}

/// Image store used when no host is configured; every upload fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredImageStore;

#[async_trait]
impl ImageStore for UnconfiguredImageStore {
    async fn upload(
        &self,
        _path: &Path,
        _folder: ImageFolder,
    ) -> Result<HostedImage, ImageStoreError> {
        Err(ImageStoreError::not_configured())
    }
}
