//! Shared translation of port failures into API errors.
//!
//! Connection failures become `service_unavailable` and query failures
//! become `internal`. Constraint variants that carry business meaning are
//! matched by the calling service first; anything left over is treated as
//! an internal failure.

use tracing::error;

use super::Error;
use super::ports::{
    CategoryRepositoryError, CredentialHasherError, ImageStoreError, OrderRepositoryError,
    ProductRepositoryError, SiteConfigRepositoryError, TokenCodecError, UserRepositoryError,
};

fn unavailable(store: &str, message: &str) -> Error {
    error!(store, %message, "store connection failed");
    Error::service_unavailable(format!("{store} store unavailable"))
}

fn failed(store: &str, message: &str) -> Error {
    Error::internal(format!("{store} store error: {message}"))
}

pub(crate) fn map_user_error(err: UserRepositoryError) -> Error {
    match err {
        UserRepositoryError::Connection { message } => unavailable("user", &message),
        UserRepositoryError::Query { message } => failed("user", &message),
        UserRepositoryError::DuplicateEmail { .. } => {
            Error::conflict("Ya existe un usuario con este email")
        }
    }
}

pub(crate) fn map_category_error(err: CategoryRepositoryError) -> Error {
    match err {
        CategoryRepositoryError::Connection { message } => unavailable("category", &message),
        CategoryRepositoryError::Query { message } => failed("category", &message),
        CategoryRepositoryError::DuplicateName { .. } => {
            Error::conflict("Ya existe una categoría con este nombre")
        }
        CategoryRepositoryError::InUse { product_count } => category_in_use(product_count),
    }
}

pub(crate) fn category_in_use(product_count: u64) -> Error {
    Error::conflict("No se puede eliminar la categoría porque tiene productos asociados")
        .with_details(serde_json::json!({ "productCount": product_count }))
}

pub(crate) fn map_product_error(err: ProductRepositoryError) -> Error {
    match err {
        ProductRepositoryError::Connection { message } => unavailable("product", &message),
        ProductRepositoryError::Query { message } => failed("product", &message),
        ProductRepositoryError::MissingCategory { .. } => Error::not_found("Category not found."),
        ProductRepositoryError::Referenced => Error::conflict(
            "No se puede eliminar el producto porque tiene pedidos asociados",
        ),
    }
}

pub(crate) fn map_order_error(err: OrderRepositoryError) -> Error {
    match err {
        OrderRepositoryError::Connection { message } => unavailable("order", &message),
        OrderRepositoryError::Query { message } => failed("order", &message),
    }
}

pub(crate) fn map_site_config_error(err: SiteConfigRepositoryError) -> Error {
    match err {
        SiteConfigRepositoryError::Connection { message } => unavailable("site config", &message),
        SiteConfigRepositoryError::Query { message } => failed("site config", &message),
    }
}

pub(crate) fn map_hasher_error(err: CredentialHasherError) -> Error {
    Error::internal(err.to_string())
}

pub(crate) fn map_token_error(err: TokenCodecError) -> Error {
    Error::internal(err.to_string())
}

pub(crate) fn map_image_error(err: ImageStoreError) -> Error {
    match err {
        ImageStoreError::NotConfigured => {
            Error::service_unavailable("Image storage is not configured")
        }
        other => Error::internal(other.to_string()),
    }
}
