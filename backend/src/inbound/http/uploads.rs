//! Multipart image uploads for products and categories.
//!
//! The `image` part is buffered in memory up to [`MAX_IMAGE_BYTES`], written
//! to a named temporary file under the configured upload directory and
//! handed to the image attachment service. The temporary file is removed
//! when the handler returns, on success and on failure alike.

use std::path::Path;

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpResponse, post, web};
use futures_util::TryStreamExt;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::{CategoryId, Error, ProductId};

use super::ApiResult;
use super::dto::{CategoryResponse, ProductResponse};
use super::envelope;
use super::schemas::FailureEnvelopeSchema;
use super::session::AdminUser;
use super::state::HttpState;
use super::validation::parse_id;

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_FIELD: &str = "image";
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];
const ALLOWED_SUBTYPES: [&str; 4] = ["jpeg", "png", "gif", "webp"];

const UPLOADED_MESSAGE: &str = "Imagen subida correctamente";
const MISSING_IMAGE_MESSAGE: &str = "No se ha proporcionado ninguna imagen";
const WRONG_TYPE_MESSAGE: &str = "Solo se permiten archivos de imagen (jpeg, jpg, png, gif, webp)";
const TOO_LARGE_MESSAGE: &str = "La imagen supera el tamaño máximo de 5MB";
const INVALID_PRODUCT_ID_MESSAGE: &str = "ID de producto inválido";
const INVALID_CATEGORY_ID_MESSAGE: &str = "ID de categoría inválido";

/// Response data after a product image upload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageResponse {
    pub image_url: String,
    pub product: ProductResponse,
}

/// Response data after a category image upload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryImageResponse {
    pub image_url: String,
    pub category: CategoryResponse,
}

fn multipart_error(err: MultipartError) -> Error {
    debug!(error = %err, "unreadable multipart body");
    Error::invalid_request(format!("Formulario multipart inválido: {err}"))
}

/// Lower-cased extension of `filename`, when it is an allowed image type.
fn image_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn accepted_field(field: &Field) -> Result<String, Error> {
    let extension = field
        .content_disposition()
        .and_then(|disposition| disposition.get_filename())
        .and_then(image_extension);
    let mime_ok = field.content_type().is_some_and(|mime| {
        mime.type_() == "image" && ALLOWED_SUBTYPES.contains(&mime.subtype().as_str())
    });
    match extension {
        Some(extension) if mime_ok => Ok(extension),
        _ => Err(Error::invalid_request(WRONG_TYPE_MESSAGE)),
    }
}

async fn read_limited(field: &mut Field) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(Error::invalid_request(TOO_LARGE_MESSAGE));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Pull the `image` part out of the form into a temporary file.
///
/// Other parts are drained and ignored.
async fn receive_image(mut payload: Multipart, upload_dir: &Path) -> Result<NamedTempFile, Error> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            while field.try_next().await.map_err(multipart_error)?.is_some() {}
            continue;
        }
        let extension = accepted_field(&field)?;
        let bytes = read_limited(&mut field).await?;
        return spool(&bytes, &extension, upload_dir).await;
    }
    Err(Error::invalid_request(MISSING_IMAGE_MESSAGE))
}

async fn spool(bytes: &[u8], extension: &str, upload_dir: &Path) -> Result<NamedTempFile, Error> {
    let io_failure = |err: std::io::Error| {
        warn!(error = %err, dir = %upload_dir.display(), "failed to stage upload");
        Error::internal("Error al subir la imagen")
    };
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(io_failure)?;
    let file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(upload_dir)
        .map_err(io_failure)?;
    tokio::fs::write(file.path(), bytes)
        .await
        .map_err(io_failure)?;
    Ok(file)
}

/// Upload a product photo and set it as the product image.
#[utoipa::path(
    post,
    path = "/api/products/{id}/image",
    params(("id" = i32, Path, description = "Product id")),
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file part"),
    responses(
        (status = 200, description = "Image uploaded", body = ProductImageResponse),
        (status = 400, description = "Missing, oversized or non-image file", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Product not found", body = FailureEnvelopeSchema),
        (status = 503, description = "Image storage not configured", body = FailureEnvelopeSchema)
    ),
    tags = ["products"],
    operation_id = "uploadProductImage"
)]
#[post("/products/{id}/image")]
pub async fn upload_product_image(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, INVALID_PRODUCT_ID_MESSAGE)?;
    let file = receive_image(payload, &state.settings.upload_dir).await?;
    let attached = state.images.attach_to_product(id, file.path()).await?;
    Ok(envelope::ok(
        UPLOADED_MESSAGE,
        ProductImageResponse {
            image_url: attached.image.url,
            product: attached.entity.into(),
        },
    ))
}

/// Upload a category banner and set it as the category image.
#[utoipa::path(
    post,
    path = "/api/categories/{id}/image",
    params(("id" = i32, Path, description = "Category id")),
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file part"),
    responses(
        (status = 200, description = "Image uploaded", body = CategoryImageResponse),
        (status = 400, description = "Missing, oversized or non-image file", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Category not found", body = FailureEnvelopeSchema),
        (status = 503, description = "Image storage not configured", body = FailureEnvelopeSchema)
    ),
    tags = ["categories"],
    operation_id = "uploadCategoryImage"
)]
#[post("/categories/{id}/image")]
pub async fn upload_category_image(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, INVALID_CATEGORY_ID_MESSAGE)?;
    let file = receive_image(payload, &state.settings.upload_dir).await?;
    let attached = state.images.attach_to_category(id, file.path()).await?;
    Ok(envelope::ok(
        UPLOADED_MESSAGE,
        CategoryImageResponse {
            image_url: attached.image.url,
            category: attached.entity.into(),
        },
    ))
}
