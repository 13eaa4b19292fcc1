//! Product catalogue handlers.
//!
//! ```text
//! GET    /api/products?categoryId=2&search=boot&page=1&limit=10
//! GET    /api/products/{id}
//! POST   /api/products       {"name":"Boot","price":"59.90","stock":3,"category_id":2}
//! PUT    /api/products/{id}  {"stock":0}
//! DELETE /api/products/{id}
//! ```
//!
//! Form clients post numbers as strings, so `price`, `stock` and
//! `category_id` accept either representation.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CategoryId, Error, NewProduct, Price, ProductChanges, ProductFilter, ProductId, ProductName,
    Stock,
};
use crate::middleware::RateLimit;

use super::ApiResult;
use super::dto::ProductResponse;
use super::envelope;
use super::schemas::{FailureEnvelopeSchema, MessageEnvelopeSchema};
use super::session::AdminUser;
use super::state::HttpState;
use super::validation::{
    FieldName, NumericInput, PageQuery, invalid_field_error, invalid_number_error,
    missing_field_error, parse_id,
};

const INVALID_ID_MESSAGE: &str = "ID de producto inválido";
const INVALID_CATEGORY_ID_MESSAGE: &str = "ID de categoría inválido";
const MISSING_FIELDS_MESSAGE: &str = "Missing required fields (name, price, stock, category_id).";
const INVALID_NUMBERS_MESSAGE: &str = "Invalid price or stock value. They must be numbers.";

/// Filters accepted by `GET /api/products`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Restrict to one category.
    #[param(example = "2")]
    pub category_id: Option<String>,
    /// Case-insensitive substring of the product name.
    #[param(example = "boot")]
    pub search: Option<String>,
}

impl ProductQuery {
    fn to_filter(&self) -> Result<ProductFilter, Error> {
        let category_id = self
            .category_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_id::<CategoryId>(raw, INVALID_CATEGORY_ID_MESSAGE))
            .transpose()?;
        Ok(ProductFilter::new(category_id, self.search.clone()))
    }
}

/// Body for creating and updating products.
///
/// On create `name`, `price`, `stock` and `category_id` are required; on
/// update every field is optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductRequest {
    #[schema(example = "Trail runner")]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Number or numeric string, not negative.
    #[schema(value_type = Option<f64>, example = 59.9)]
    pub price: Option<NumericInput>,
    /// Whole number or numeric string, not negative.
    #[schema(value_type = Option<i32>, example = 12)]
    pub stock: Option<NumericInput>,
    pub image: Option<String>,
    /// Also accepted as `categoryId`.
    #[serde(alias = "categoryId")]
    #[schema(value_type = Option<i32>, example = 2)]
    pub category_id: Option<NumericInput>,
}

fn product_name(raw: &str) -> Result<ProductName, Error> {
    ProductName::new(raw).map_err(|err| invalid_field_error(FieldName::new("name"), err.to_string()))
}

fn price(input: &NumericInput) -> Result<Price, Error> {
    input
        .to_decimal()
        .and_then(|amount| Price::new(amount).ok())
        .ok_or_else(|| {
            invalid_number_error(FieldName::new("price"), INVALID_NUMBERS_MESSAGE, &input.describe())
        })
}

fn stock(input: &NumericInput) -> Result<Stock, Error> {
    input
        .to_integer()
        .and_then(|units| Stock::new(units).ok())
        .ok_or_else(|| {
            invalid_number_error(FieldName::new("stock"), INVALID_NUMBERS_MESSAGE, &input.describe())
        })
}

fn category_id(input: &NumericInput) -> Result<CategoryId, Error> {
    input
        .to_integer()
        .filter(|raw| *raw > 0)
        .map(CategoryId::new)
        .ok_or_else(|| {
            invalid_number_error(
                FieldName::new("category_id"),
                INVALID_CATEGORY_ID_MESSAGE,
                &input.describe(),
            )
        })
}

fn missing(field: &'static str) -> Error {
    missing_field_error(FieldName::new(field), MISSING_FIELDS_MESSAGE)
}

impl ProductRequest {
    fn into_new(self) -> Result<NewProduct, Error> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| missing("name"))?;
        let price_input = self.price.ok_or_else(|| missing("price"))?;
        let stock_input = self.stock.ok_or_else(|| missing("stock"))?;
        let category_input = self.category_id.ok_or_else(|| missing("category_id"))?;
        Ok(NewProduct {
            name: product_name(&name)?,
            description: self.description.unwrap_or_default(),
            price: price(&price_input)?,
            stock: stock(&stock_input)?,
            image: self.image,
            category_id: category_id(&category_input)?,
        })
    }

    fn into_changes(self) -> Result<ProductChanges, Error> {
        Ok(ProductChanges {
            name: self.name.as_deref().map(product_name).transpose()?,
            description: self.description,
            price: self.price.as_ref().map(price).transpose()?,
            stock: self.stock.as_ref().map(stock).transpose()?,
            image: self.image,
            category_id: self.category_id.as_ref().map(category_id).transpose()?,
        })
    }
}

/// Paged products ordered by id, each with its category.
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery, PageQuery),
    responses(
        (status = 200, description = "Products retrieved successfully", body = [ProductResponse]),
        (status = 400, description = "Invalid filter or pagination", body = FailureEnvelopeSchema)
    ),
    tags = ["products"],
    operation_id = "listProducts",
    security([])
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<HttpState>,
    filter: web::Query<ProductQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let products = state
        .products
        .list(filter.to_filter()?, page.to_request()?)
        .await?;
    Ok(envelope::ok(
        "Products retrieved successfully",
        products.map(ProductResponse::from),
    ))
}

/// One product with its category.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ProductResponse),
        (status = 400, description = "Invalid id", body = FailureEnvelopeSchema),
        (status = 404, description = "Product not found", body = FailureEnvelopeSchema)
    ),
    tags = ["products"],
    operation_id = "getProduct",
    security([])
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let product = state.products.get(id).await?;
    Ok(envelope::ok(
        "Product retrieved successfully",
        ProductResponse::from(product),
    ))
}

/// Create a product in an existing category.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, description = "Missing or invalid fields", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Category not found", body = FailureEnvelopeSchema),
        (status = 429, description = "Too many product operations from this IP", body = FailureEnvelopeSchema)
    ),
    tags = ["products"],
    operation_id = "createProduct"
)]
#[post("/products", wrap = "RateLimit::product_writes()")]
pub async fn create_product(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let product = state
        .products
        .create(payload.into_inner().into_new()?)
        .await?;
    Ok(envelope::created(
        "Product created successfully",
        ProductResponse::from(product),
    ))
}

/// Merge the supplied fields into a product.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 400, description = "Invalid id or fields", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Product or category not found", body = FailureEnvelopeSchema),
        (status = 429, description = "Too many product operations from this IP", body = FailureEnvelopeSchema)
    ),
    tags = ["products"],
    operation_id = "updateProduct"
)]
#[put("/products/{id}", wrap = "RateLimit::product_writes()")]
pub async fn update_product(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let changes = payload.into_inner().into_changes()?;
    let product = state.products.update(id, changes).await?;
    Ok(envelope::ok(
        "Product updated successfully",
        ProductResponse::from(product),
    ))
}

/// Delete a product.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted successfully", body = MessageEnvelopeSchema),
        (status = 400, description = "Invalid id or product has orders", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Product not found", body = FailureEnvelopeSchema),
        (status = 429, description = "Too many product operations from this IP", body = FailureEnvelopeSchema)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/products/{id}", wrap = "RateLimit::product_writes()")]
pub async fn delete_product(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, INVALID_ID_MESSAGE)?;
    state.products.delete(id).await?;
    Ok(envelope::done("Product deleted successfully"))
}
