//! Port for order reads and status updates.

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use rust_decimal::Decimal;

use crate::domain::{Order, OrderFilter, OrderId, OrderStatus, TimeWindow};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "order repository query failed: {message}",
    }
}

/// Storage for orders with their items, customer and payment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Page of orders matching `filter`, newest first.
    async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, OrderRepositoryError>;

    /// Fetch one order.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError>;

    /// Set the status; `None` when the order does not exist.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, OrderRepositoryError>;

    /// Number of orders.
    async fn count(&self) -> Result<u64, OrderRepositoryError>;

    /// Sum of `price × quantity` over every order item.
    async fn revenue(&self) -> Result<Decimal, OrderRepositoryError>;

    /// Orders created inside `window`, newest first.
    async fn created_in(&self, window: TimeWindow) -> Result<Vec<Order>, OrderRepositoryError>;
}
