//! Order administration handlers.
//!
//! ```text
//! GET /api/orders?status=pending&page=1&limit=10
//! GET /api/orders/stats
//! GET /api/orders/{id}
//! PUT /api/orders/{id}/status {"status":"shipped"}
//! ```
//!
//! Orders are created by checkout, which lives outside this service; these
//! endpoints only read them and move them through their lifecycle.

use actix_web::{HttpResponse, get, put, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, OrderFilter, OrderId, OrderStats, OrderStatus};

use super::ApiResult;
use super::dto::OrderResponse;
use super::envelope;
use super::schemas::FailureEnvelopeSchema;
use super::session::{AdminUser, AuthenticatedUser};
use super::state::HttpState;
use super::validation::{FieldName, PageQuery, invalid_field_error, missing_field_error, parse_id};

const INVALID_ID_MESSAGE: &str = "ID de orden inválido";
const STATUS_REQUIRED_MESSAGE: &str = "El estado es obligatorio";

fn parse_status(raw: &str) -> Result<OrderStatus, Error> {
    OrderStatus::parse(raw)
        .map_err(|err| invalid_field_error(FieldName::new("status"), err.to_string()))
}

/// Optional filter for `GET /api/orders`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    /// One of `pending`, `processing`, `shipped`, `delivered`, `cancelled`.
    #[param(example = "pending")]
    pub status: Option<String>,
}

impl OrderQuery {
    fn to_filter(&self) -> Result<OrderFilter, Error> {
        let status = self
            .status
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_status)
            .transpose()?;
        Ok(OrderFilter {
            status,
            user_id: None,
        })
    }
}

/// Body for `PUT /api/orders/{id}/status`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct StatusRequest {
    #[schema(example = "shipped")]
    pub status: Option<String>,
}

/// Dashboard figures over the trailing month and the month before it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatsResponse {
    pub total_orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_revenue: Decimal,
    pub orders_this_month: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue_this_month: Decimal,
    /// Percentage change against the previous month.
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub order_growth: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue_growth: Decimal,
    pub recent_orders: Vec<OrderResponse>,
}

impl From<OrderStats> for OrderStatsResponse {
    fn from(stats: OrderStats) -> Self {
        Self {
            total_orders: stats.total_orders,
            total_revenue: stats.total_revenue,
            orders_this_month: stats.orders_this_month,
            revenue_this_month: stats.revenue_this_month,
            order_growth: stats.order_growth,
            revenue_growth: stats.revenue_growth,
            recent_orders: stats.recent_orders.into_iter().map(Into::into).collect(),
        }
    }
}

/// Paged orders, newest first.
#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderQuery, PageQuery),
    responses(
        (status = 200, description = "Orders page", body = [OrderResponse]),
        (status = 400, description = "Invalid status or pagination", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    filter: web::Query<OrderQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let orders = state
        .orders
        .list(filter.to_filter()?, page.to_request()?)
        .await?;
    Ok(envelope::ok(
        "Órdenes obtenidas correctamente",
        orders.map(OrderResponse::from),
    ))
}

/// Order count, revenue and growth.
#[utoipa::path(
    get,
    path = "/api/orders/stats",
    responses(
        (status = 200, description = "Order statistics", body = OrderStatsResponse),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "orderStats"
)]
#[get("/orders/stats")]
pub async fn order_stats(
    _admin: AdminUser,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let stats = state.orders.stats().await?;
    Ok(envelope::ok(
        "Estadísticas obtenidas correctamente",
        OrderStatsResponse::from(stats),
    ))
}

/// One order; visible to its customer and to admins.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 400, description = "Invalid id", body = FailureEnvelopeSchema),
        (status = 403, description = "Order belongs to another customer", body = FailureEnvelopeSchema),
        (status = 404, description = "Order not found", body = FailureEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/orders/{id}")]
pub async fn get_order(
    caller: AuthenticatedUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let order = state.orders.get(&caller.actor(), id).await?;
    Ok(envelope::private(
        "Orden obtenida correctamente",
        OrderResponse::from(order),
    ))
}

/// Move an order to another status.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Invalid id or status", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Order not found", body = FailureEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "updateOrderStatus"
)]
#[put("/orders/{id}/status")]
pub async fn update_order_status(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<HttpResponse> {
    let id: OrderId = parse_id(&path, INVALID_ID_MESSAGE)?;
    let raw = payload
        .into_inner()
        .status
        .ok_or_else(|| missing_field_error(FieldName::new("status"), STATUS_REQUIRED_MESSAGE))?;
    let status = parse_status(&raw)?;
    let order = state.orders.update_status(id, status).await?;
    Ok(envelope::ok(
        "Estado de la orden actualizado",
        OrderResponse::from(order),
    ))
}
