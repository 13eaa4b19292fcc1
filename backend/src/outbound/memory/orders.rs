//! `OrderRepository` over the in-memory store.

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use rust_decimal::Decimal;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{Order, OrderFilter, OrderId, OrderStatus, TimeWindow};

use super::{InMemoryStore, State, StoredOrder, paginate, tally};

impl State {
    /// Orders passing `keep`, newest first.
    fn orders_where(&self, keep: impl Fn(&StoredOrder) -> bool) -> Vec<Order> {
        let mut stored: Vec<&StoredOrder> = self.orders.values().filter(|order| keep(order)).collect();
        stored.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        stored.into_iter().map(|order| self.materialise(order)).collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, OrderRepositoryError> {
        let state = self.lock().map_err(OrderRepositoryError::query)?;
        let rows = state
            .orders_where(|_| true)
            .into_iter()
            .filter(|order| filter.matches(order))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let state = self.lock().map_err(OrderRepositoryError::query)?;
        Ok(state.orders.get(&id).map(|order| state.materialise(order)))
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(OrderRepositoryError::query)?;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = now;
        let updated = order.clone();
        Ok(Some(state.materialise(&updated)))
    }

    async fn count(&self) -> Result<u64, OrderRepositoryError> {
        let state = self.lock().map_err(OrderRepositoryError::query)?;
        Ok(tally(state.orders.len()))
    }

    async fn revenue(&self) -> Result<Decimal, OrderRepositoryError> {
        let state = self.lock().map_err(OrderRepositoryError::query)?;
        Ok(state
            .orders
            .values()
            .flat_map(|order| order.items.iter())
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum())
    }

    async fn created_in(&self, window: TimeWindow) -> Result<Vec<Order>, OrderRepositoryError> {
        let state = self.lock().map_err(OrderRepositoryError::query)?;
        Ok(state.orders_where(|order| window.contains(order.created_at)))
    }
}
