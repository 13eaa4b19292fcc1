//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Orders are loaded in two passes: the page of order rows first, then the
//! customers, line items and payments for exactly those ids. Line items carry
//! the product's current name and image.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Numeric;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};
use rust_decimal::Decimal;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{
    Order, OrderCustomer, OrderFilter, OrderId, OrderItem, OrderStatus, TimeWindow, UserId,
};

use super::diesel_error_mapping::{StoreFailure, count_to_u64, page_bounds};
use super::models::{CorruptRow, CustomerRow, OrderItemRow, OrderRow, PaymentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{order_items, orders, payments, products, users};

/// Diesel-backed implementation of the `OrderRepository` port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> OrderRepositoryError {
    match failure {
        StoreFailure::Connection(message) => OrderRepositoryError::connection(message),
        other => OrderRepositoryError::query(other.describe()),
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_failure(error.into())
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_failure(error.into())
}

fn map_corrupt(error: CorruptRow) -> OrderRepositoryError {
    OrderRepositoryError::query(error.to_string())
}

fn filtered(filter: OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(user_id) = filter.user_id {
        query = query.filter(orders::user_id.eq(user_id.get()));
    }
    query
}

/// Attach customers, line items and payments to `rows`, keeping their order.
async fn hydrate<C>(conn: &mut C, rows: Vec<OrderRow>) -> Result<Vec<Order>, OrderRepositoryError>
where
    C: diesel_async::AsyncConnection<Backend = Pg> + Send,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let user_ids: Vec<i32> = rows
        .iter()
        .map(|row| row.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let customers: HashMap<i32, CustomerRow> = users::table
        .filter(users::id.eq_any(user_ids))
        .select(CustomerRow::as_select())
        .load::<CustomerRow>(conn)
        .await
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

    let item_rows: Vec<OrderItemRow> = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq_any(order_ids.clone()))
        .order(order_items::id.asc())
        .select((
            order_items::id,
            order_items::order_id,
            order_items::product_id,
            order_items::quantity,
            order_items::price,
            products::name,
            products::image,
        ))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut items: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        items.entry(row.order_id).or_default().push(row.into());
    }

    let mut payments: HashMap<i32, PaymentRow> = payments::table
        .filter(payments::order_id.eq_any(order_ids))
        .select(PaymentRow::as_select())
        .load::<PaymentRow>(conn)
        .await
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|row| (row.order_id, row))
        .collect();

    rows.into_iter()
        .map(|row| {
            let status = row.status().map_err(map_corrupt)?;
            let customer = customers.get(&row.user_id).ok_or_else(|| {
                OrderRepositoryError::query(format!(
                    "order {} references missing user {}",
                    row.id, row.user_id
                ))
            })?;
            Ok(Order {
                id: OrderId::new(row.id),
                user_id: UserId::new(row.user_id),
                status,
                created_at: row.created_at,
                updated_at: row.updated_at,
                customer: OrderCustomer {
                    name: customer.name.clone(),
                    email: customer.email.clone(),
                },
                items: items.remove(&row.id).unwrap_or_default(),
                payment: payments.remove(&row.id).map(Into::into),
            })
        })
        .collect()
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (limit, offset) = page_bounds(page);

        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<OrderRow> = filtered(filter)
            .order((orders::created_at.desc(), orders::id.desc()))
            .limit(limit)
            .offset(offset)
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let items = hydrate(&mut conn, rows).await?;
        Ok(Page::new(items, count_to_u64(total), page))
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<OrderRow> = orders::table
            .find(id.get())
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(hydrate(&mut conn, rows).await?.pop())
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<OrderRow> = diesel::update(orders::table.find(id.get()))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(hydrate(&mut conn, rows).await?.pop())
    }

    async fn count(&self) -> Result<u64, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = orders::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(count_to_u64(total))
    }

    async fn revenue(&self) -> Result<Decimal, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        order_items::table
            .select(sql::<Numeric>("COALESCE(SUM(price * quantity), 0)"))
            .get_result::<Decimal>(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn created_in(&self, window: TimeWindow) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = orders::table
            .filter(orders::created_at.ge(window.start))
            .into_boxed();
        if let Some(end) = window.end {
            query = query.filter(orders::created_at.lt(end));
        }

        let rows: Vec<OrderRow> = query
            .order((orders::created_at.desc(), orders::id.desc()))
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        hydrate(&mut conn, rows).await
    }
}
