//! Order reads, status updates and dashboard statistics.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};

use super::ports::{OrderRepository, UserRepository};
use super::repository_errors::{map_order_error, map_user_error};
use super::{
    Actor, Error, MonthWindows, Order, OrderFilter, OrderId, OrderStats, OrderStatus, UserId,
};

/// Message returned when an order id does not resolve.
pub const ORDER_NOT_FOUND_MESSAGE: &str = "Orden no encontrada";
const ORDER_FORBIDDEN_MESSAGE: &str = "No tiene permiso para ver esta orden";
const USER_ORDERS_FORBIDDEN_MESSAGE: &str = "No tienes permiso para ver estos pedidos";
const USER_NOT_FOUND_MESSAGE: &str = "Usuario no encontrado";

/// Order use-cases.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    /// Create the service; `clock` anchors the statistics windows.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            users,
            clock,
        }
    }

    /// Page of orders, newest first.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list(&self, filter: OrderFilter, page: PageRequest) -> Result<Page<Order>, Error> {
        self.orders
            .list(filter, page)
            .await
            .map_err(map_order_error)
    }

    /// One order, visible to its owner and to admins.
    ///
    /// # Errors
    /// `not_found` for unknown ids, `forbidden` for other customers.
    pub async fn get(&self, actor: &Actor, id: OrderId) -> Result<Order, Error> {
        let order = self
            .orders
            .find_by_id(id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(|| Error::not_found(ORDER_NOT_FOUND_MESSAGE))?;
        actor.require_access(order.user_id, ORDER_FORBIDDEN_MESSAGE)?;
        Ok(order)
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    /// `not_found` for unknown ids.
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, Error> {
        self.orders
            .update_status(id, status)
            .await
            .map_err(map_order_error)?
            .ok_or_else(|| Error::not_found(ORDER_NOT_FOUND_MESSAGE))
    }

    /// Totals plus trailing month-over-month growth.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn stats(&self) -> Result<OrderStats, Error> {
        let windows = MonthWindows::trailing(self.clock.utc());
        let total_orders = self.orders.count().await.map_err(map_order_error)?;
        let total_revenue = self.orders.revenue().await.map_err(map_order_error)?;
        let current = self
            .orders
            .created_in(windows.current)
            .await
            .map_err(map_order_error)?;
        let previous = self
            .orders
            .created_in(windows.previous)
            .await
            .map_err(map_order_error)?;
        Ok(OrderStats::summarise(
            total_orders,
            total_revenue,
            current,
            &previous,
        ))
    }

    /// Page of one customer's orders.
    ///
    /// # Errors
    /// `forbidden` unless the caller is the customer or an admin;
    /// `not_found` when the customer does not exist.
    pub async fn for_user(
        &self,
        actor: &Actor,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, Error> {
        actor.require_access(user_id, USER_ORDERS_FORBIDDEN_MESSAGE)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?;
        if user.is_none() {
            return Err(Error::not_found(USER_NOT_FOUND_MESSAGE));
        }
        self.list(OrderFilter::for_user(user_id), page).await
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;
