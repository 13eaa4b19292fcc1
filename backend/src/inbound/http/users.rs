//! Account administration handlers.
//!
//! ```text
//! GET    /api/users?page=1&limit=10
//! GET    /api/users/stats
//! GET    /api/users/{id}
//! PUT    /api/users/{id}        {"role":"admin"}
//! DELETE /api/users/{id}
//! GET    /api/users/{id}/orders
//! ```
//!
//! A customer may read their own account and orders; everything else is
//! admin-only.

use actix_web::{HttpResponse, delete, get, put, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    EmailAddress, Error, Role, UserChanges, UserId, UserName, UserStats, UserValidationError,
};

use super::ApiResult;
use super::dto::{OrderResponse, UserListItem, UserResponse};
use super::envelope;
use super::schemas::{FailureEnvelopeSchema, MessageEnvelopeSchema};
use super::session::{AdminUser, AuthenticatedUser};
use super::state::HttpState;
use super::validation::{FieldName, PageQuery, invalid_field_error, parse_id};

const INVALID_ID_MESSAGE: &str = "ID de usuario inválido";

/// Partial account update for `PUT /api/users/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UserUpdateRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    /// `user` or `admin`.
    #[schema(example = "admin")]
    pub role: Option<String>,
}

impl UserUpdateRequest {
    fn into_changes(self) -> Result<UserChanges, Error> {
        let invalid = |field: &'static str| {
            move |err: UserValidationError| {
                invalid_field_error(FieldName::new(field), err.to_string())
            }
        };
        Ok(UserChanges {
            name: self
                .name
                .map(UserName::new)
                .transpose()
                .map_err(invalid("name"))?,
            email: self
                .email
                .map(EmailAddress::new)
                .transpose()
                .map_err(invalid("email"))?,
            role: self
                .role
                .as_deref()
                .map(Role::parse)
                .transpose()
                .map_err(invalid("role"))?,
        })
    }
}

/// Sign-up figures for the current and previous calendar months.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub total_users: u64,
    pub new_users_this_month: u64,
    pub new_users_last_month: u64,
    /// Percentage change, rounded to two decimals.
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub user_growth: Decimal,
}

impl From<UserStats> for UserStatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            total_users: stats.total_users,
            new_users_this_month: stats.new_users_this_month,
            new_users_last_month: stats.new_users_last_month,
            user_growth: stats.user_growth,
        }
    }
}

/// Paged accounts ordered by id, with order counts.
#[utoipa::path(
    get,
    path = "/api/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users page", body = [UserListItem]),
        (status = 400, description = "Invalid pagination", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let users = state.users.list(page.to_request()?).await?;
    Ok(envelope::private(
        "Usuarios obtenidos correctamente",
        users.map(UserListItem::from),
    ))
}

/// Sign-up statistics.
#[utoipa::path(
    get,
    path = "/api/users/stats",
    responses(
        (status = 200, description = "User statistics", body = UserStatsResponse),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "userStats"
)]
#[get("/users/stats")]
pub async fn user_stats(
    _admin: AdminUser,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let stats = state.users.stats().await?;
    Ok(envelope::ok(
        "Estadísticas de usuarios obtenidas correctamente",
        UserStatsResponse::from(stats),
    ))
}

/// One account; visible to itself and to admins.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid id", body = FailureEnvelopeSchema),
        (status = 403, description = "Another customer's account", body = FailureEnvelopeSchema),
        (status = 404, description = "User not found", body = FailureEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    caller: AuthenticatedUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: UserId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let user = state.users.get(&caller.actor(), id).await?;
    Ok(envelope::private(
        "Usuario obtenido correctamente",
        UserResponse::from(&user),
    ))
}

/// Merge name, email or role into an account.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid id, role or duplicate email", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "User not found", body = FailureEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UserUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let id: UserId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let changes = payload.into_inner().into_changes()?;
    let user = state.users.update(id, changes).await?;
    Ok(envelope::ok(
        "Usuario actualizado correctamente",
        UserResponse::from(&user),
    ))
}

/// Delete another account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageEnvelopeSchema),
        (status = 400, description = "Invalid id or own account", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "User not found", body = FailureEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: UserId = parse_id(&path, INVALID_ID_MESSAGE)?;
    state.users.delete(&admin.actor(), id).await?;
    Ok(envelope::done("Usuario eliminado exitosamente"))
}

/// Paged orders of one customer.
#[utoipa::path(
    get,
    path = "/api/users/{id}/orders",
    params(("id" = i32, Path, description = "User id"), PageQuery),
    responses(
        (status = 200, description = "User orders page", body = [OrderResponse]),
        (status = 400, description = "Invalid id or pagination", body = FailureEnvelopeSchema),
        (status = 403, description = "Another customer's orders", body = FailureEnvelopeSchema),
        (status = 404, description = "User not found", body = FailureEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "userOrders"
)]
#[get("/users/{id}/orders")]
pub async fn user_orders(
    caller: AuthenticatedUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let id: UserId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let orders = state
        .orders
        .for_user(&caller.actor(), id, page.to_request()?)
        .await?;
    Ok(envelope::private(
        "Pedidos del usuario obtenidos correctamente",
        orders.map(OrderResponse::from),
    ))
}
