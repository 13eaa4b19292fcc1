//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api` handler, the response DTOs and the two
//! accepted credentials: an `Authorization: Bearer` header and the `token`
//! cookie set on sign-in. The document backs Swagger UI in debug builds and
//! is exported by `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{ConfigType, ErrorCode, OrderStatus, Role};
use crate::inbound::http::auth::{ProfileResponse, SessionResponse, SignInRequest, SignUpRequest};
use crate::inbound::http::categories::{
    CategoryDetailResponse, CategoryListItem, CategoryProduct, CategoryRequest,
};
use crate::inbound::http::dto::{
    CategoryRefResponse, CategoryResponse, OrderItemResponse, OrderResponse, PaymentResponse,
    ProductResponse, SiteConfigResponse, UserListItem, UserResponse,
};
use crate::inbound::http::orders::{OrderStatsResponse, StatusRequest};
use crate::inbound::http::products::ProductRequest;
use crate::inbound::http::schemas::{
    DataEnvelopeSchema, FailureEnvelopeSchema, MessageEnvelopeSchema,
};
use crate::inbound::http::site_config::SiteConfigRequest;
use crate::inbound::http::uploads::{CategoryImageResponse, ProductImageResponse};
use crate::inbound::http::users::{UserStatsResponse, UserUpdateRequest};

/// Name of the bearer-token security scheme.
pub const BEARER_SCHEME: &str = "BearerAuth";
/// Name of the cookie security scheme.
pub const COOKIE_SCHEME: &str = "TokenCookie";

/// Enrich the generated document with both credential schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            COOKIE_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "token",
                "HTTP-only cookie issued by POST /api/auth/sign-in.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        description = "Catalogue, ordering and administration endpoints for the storefront.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = []), ("TokenCookie" = [])),
    paths(
        crate::inbound::http::auth::sign_up,
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::auth::me,
        crate::inbound::http::categories::list_categories,
        crate::inbound::http::categories::get_category,
        crate::inbound::http::categories::create_category,
        crate::inbound::http::categories::update_category,
        crate::inbound::http::categories::delete_category,
        crate::inbound::http::uploads::upload_category_image,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::update_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::uploads::upload_product_image,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::order_stats,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::update_order_status,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::user_stats,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::user_orders,
        crate::inbound::http::site_config::list_site_config,
        crate::inbound::http::site_config::get_site_config,
        crate::inbound::http::site_config::upsert_site_config,
        crate::inbound::http::site_config::put_site_config,
        crate::inbound::http::site_config::delete_site_config,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        FailureEnvelopeSchema,
        MessageEnvelopeSchema,
        DataEnvelopeSchema,
        ErrorCode,
        Role,
        OrderStatus,
        ConfigType,
        SignUpRequest,
        SignInRequest,
        SessionResponse,
        ProfileResponse,
        UserResponse,
        UserListItem,
        UserUpdateRequest,
        UserStatsResponse,
        CategoryResponse,
        CategoryListItem,
        CategoryProduct,
        CategoryDetailResponse,
        CategoryRequest,
        CategoryRefResponse,
        ProductResponse,
        ProductRequest,
        ProductImageResponse,
        CategoryImageResponse,
        OrderResponse,
        OrderItemResponse,
        PaymentResponse,
        OrderStatsResponse,
        StatusRequest,
        SiteConfigResponse,
        SiteConfigRequest,
    )),
    tags(
        (name = "auth", description = "Sign-up, sign-in and the current profile"),
        (name = "categories", description = "Catalogue categories"),
        (name = "products", description = "Catalogue products"),
        (name = "orders", description = "Order management and statistics"),
        (name = "users", description = "Account administration"),
        (name = "site-config", description = "Storefront settings"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
