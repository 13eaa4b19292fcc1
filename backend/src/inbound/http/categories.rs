//! Category catalogue handlers.
//!
//! ```text
//! GET    /api/categories?page=1&limit=10
//! GET    /api/categories/{id}
//! POST   /api/categories        {"name":"Shoes","description":"..."}
//! PUT    /api/categories/{id}   {"description":"..."}
//! DELETE /api/categories/{id}
//! ```
//!
//! Reads are public; writes require an admin.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CategoryChanges, CategoryDetails, CategoryId, CategoryName, CategoryWithProductCount, Error,
    NewCategory, Product,
};

use super::ApiResult;
use super::dto::CategoryResponse;
use super::envelope;
use super::schemas::{FailureEnvelopeSchema, MessageEnvelopeSchema};
use super::session::AdminUser;
use super::state::HttpState;
use super::validation::{FieldName, PageQuery, invalid_field_error, missing_field_error, parse_id};

const INVALID_ID_MESSAGE: &str = "ID de categoría inválido";
const NAME_REQUIRED_MESSAGE: &str = "El nombre de la categoría es obligatorio";

/// Category row in the paged list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListItem {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub product_count: u64,
}

impl From<CategoryWithProductCount> for CategoryListItem {
    fn from(row: CategoryWithProductCount) -> Self {
        Self {
            category: row.category.into(),
            product_count: row.product_count,
        }
    }
}

/// Product summary embedded in a category.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryProduct {
    pub id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
}

impl From<Product> for CategoryProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.get(),
            name: product.name.to_string(),
            price: product.price.amount(),
            stock: product.stock.units(),
            image: product.image,
        }
    }
}

/// Category with its products.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetailResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub products: Vec<CategoryProduct>,
}

impl From<CategoryDetails> for CategoryDetailResponse {
    fn from(details: CategoryDetails) -> Self {
        let CategoryDetails { category, products } = details;
        Self {
            id: category.id.get(),
            name: category.name.to_string(),
            description: category.description,
            image: category.image,
            created_at: category.created_at,
            updated_at: category.updated_at,
            products: products.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body for creating and updating categories.
///
/// Every field is optional on update; `name` is required on create.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Shoes")]
    pub name: Option<String>,
    #[schema(example = "Running and trail shoes")]
    pub description: Option<String>,
    pub image: Option<String>,
}

fn category_name(raw: &str) -> Result<CategoryName, Error> {
    CategoryName::new(raw).map_err(|err| invalid_field_error(FieldName::new("name"), err.to_string()))
}

impl CategoryRequest {
    fn into_new(self) -> Result<NewCategory, Error> {
        let raw = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| missing_field_error(FieldName::new("name"), NAME_REQUIRED_MESSAGE))?;
        Ok(NewCategory {
            name: category_name(&raw)?,
            description: self.description.unwrap_or_default(),
            image: self.image,
        })
    }

    fn into_changes(self) -> Result<CategoryChanges, Error> {
        Ok(CategoryChanges {
            name: self.name.as_deref().map(category_name).transpose()?,
            description: self.description,
            image: self.image,
        })
    }
}

/// Paged categories ordered by name, with product counts.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(PageQuery),
    responses(
        (status = 200, description = "Categories page", body = [CategoryListItem]),
        (status = 400, description = "Invalid pagination", body = FailureEnvelopeSchema)
    ),
    tags = ["categories"],
    operation_id = "listCategories",
    security([])
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let page = state.categories.list(query.to_request()?).await?;
    Ok(envelope::ok(
        "Categorías obtenidas correctamente",
        page.map(CategoryListItem::from),
    ))
}

/// One category with its products.
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryDetailResponse),
        (status = 400, description = "Invalid id", body = FailureEnvelopeSchema),
        (status = 404, description = "Category not found", body = FailureEnvelopeSchema)
    ),
    tags = ["categories"],
    operation_id = "getCategory",
    security([])
)]
#[get("/categories/{id}")]
pub async fn get_category(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let details = state.categories.get(id).await?;
    Ok(envelope::ok(
        "Categoría obtenida correctamente",
        CategoryDetailResponse::from(details),
    ))
}

/// Create a category with a unique name.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Missing name or duplicate", body = FailureEnvelopeSchema),
        (status = 401, description = "Unauthenticated", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["categories"],
    operation_id = "createCategory"
)]
#[post("/categories")]
pub async fn create_category(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    payload: web::Json<CategoryRequest>,
) -> ApiResult<HttpResponse> {
    let category = state
        .categories
        .create(payload.into_inner().into_new()?)
        .await?;
    Ok(envelope::created(
        "Categoría creada correctamente",
        CategoryResponse::from(category),
    ))
}

/// Merge the supplied fields into a category.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Invalid id or duplicate name", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Category not found", body = FailureEnvelopeSchema)
    ),
    tags = ["categories"],
    operation_id = "updateCategory"
)]
#[put("/categories/{id}")]
pub async fn update_category(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CategoryRequest>,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let changes = payload.into_inner().into_changes()?;
    let category = state.categories.update(id, changes).await?;
    Ok(envelope::ok(
        "Categoría actualizada correctamente",
        CategoryResponse::from(category),
    ))
}

/// Delete a category that no product references.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = MessageEnvelopeSchema),
        (status = 400, description = "Invalid id or products still reference it", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Category not found", body = FailureEnvelopeSchema)
    ),
    tags = ["categories"],
    operation_id = "deleteCategory"
)]
#[delete("/categories/{id}")]
pub async fn delete_category(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, INVALID_ID_MESSAGE)?;
    state.categories.delete(id).await?;
    Ok(envelope::done("Categoría eliminada exitosamente"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{TestContext, read_json};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[actix_web::test]
    async fn list_is_public_and_counts_products() {
        let ctx = TestContext::new();
        let shoes = ctx.category("Shoes").await;
        ctx.category("Accessories").await;
        ctx.product("Runner", 60, &shoes).await;
        let app = actix_test::init_service(ctx.app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/categories").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        let data = &body["data"];
        assert_eq!(data["totalCount"], json!(2));
        assert_eq!(data["currentPage"], json!(1));
        assert_eq!(data["totalPages"], json!(1));
        assert_eq!(data["items"][0]["name"], json!("Accessories"));
        assert_eq!(data["items"][1]["productCount"], json!(1));
    }

    #[rstest]
    #[case("abc", StatusCode::BAD_REQUEST, INVALID_ID_MESSAGE)]
    #[case("0", StatusCode::BAD_REQUEST, INVALID_ID_MESSAGE)]
    #[case("999", StatusCode::NOT_FOUND, "Categoría no encontrada")]
    #[actix_web::test]
    async fn get_rejects_bad_or_unknown_ids(
        #[case] id: &str,
        #[case] status: StatusCode,
        #[case] message: &str,
    ) {
        let ctx = TestContext::new();
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/categories/{id}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), status);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!(message));
    }

    #[rstest]
    #[actix_web::test]
    async fn get_embeds_products() {
        let ctx = TestContext::new();
        let shoes = ctx.category("Shoes").await;
        ctx.product("Runner", 60, &shoes).await;
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/categories/{}", shoes.id))
                .to_request(),
        )
        .await;
        let body = read_json(res).await;
        assert_eq!(body["data"]["products"][0]["name"], json!("Runner"));
        assert_eq!(body["data"]["products"][0]["price"], json!(60.0));
    }

    #[rstest]
    #[actix_web::test]
    async fn create_requires_admin() {
        let ctx = TestContext::new();
        let user = ctx.user("Ana", "ana@example.com", Role::User).await;
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/categories")
                .insert_header(ctx.bearer(&user))
                .set_json(json!({"name": "Shoes"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn create_then_duplicate_is_rejected() {
        let ctx = TestContext::new();
        let admin = ctx.admin().await;
        let app = actix_test::init_service(ctx.app()).await;
        let create = || {
            actix_test::TestRequest::post()
                .uri("/api/categories")
                .insert_header(ctx.bearer(&admin))
                .set_json(json!({"name": "Shoes"}))
                .to_request()
        };

        let first = actix_test::call_service(&app, create()).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let body = read_json(first).await;
        assert_eq!(body["message"], json!("Categoría creada correctamente"));
        assert_eq!(body["data"]["description"], json!(""));

        let second = actix_test::call_service(&app, create()).await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        let body = read_json(second).await;
        assert_eq!(body["message"], json!("Ya existe una categoría con este nombre"));
    }

    #[rstest]
    #[actix_web::test]
    async fn create_requires_name() {
        let ctx = TestContext::new();
        let admin = ctx.admin().await;
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/categories")
                .insert_header(ctx.bearer(&admin))
                .set_json(json!({"description": "no name"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!(NAME_REQUIRED_MESSAGE));
    }

    #[rstest]
    #[actix_web::test]
    async fn update_merges_fields() {
        let ctx = TestContext::new();
        let admin = ctx.admin().await;
        let shoes = ctx.category("Shoes").await;
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/categories/{}", shoes.id))
                .insert_header(ctx.bearer(&admin))
                .set_json(json!({"description": "Footwear"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body["data"]["name"], json!("Shoes"));
        assert_eq!(body["data"]["description"], json!("Footwear"));
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_refuses_categories_with_products() {
        let ctx = TestContext::new();
        let admin = ctx.admin().await;
        let shoes = ctx.category("Shoes").await;
        ctx.product("Runner", 60, &shoes).await;
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/categories/{}", shoes.id))
                .insert_header(ctx.bearer(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["details"]["productCount"], json!(1));
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_removes_empty_category() {
        let ctx = TestContext::new();
        let admin = ctx.admin().await;
        let shoes = ctx.category("Shoes").await;
        let app = actix_test::init_service(ctx.app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/categories/{}", shoes.id))
                .insert_header(ctx.bearer(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("Categoría eliminada exitosamente"));
    }
}
