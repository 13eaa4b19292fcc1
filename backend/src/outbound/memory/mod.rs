//! In-memory implementations of every repository port.
//!
//! [`InMemoryStore`] backs the server when no database is configured and
//! drives the HTTP integration suite. It enforces the same constraints as
//! the PostgreSQL schema: unique emails and category names, RESTRICT on
//! categories with products and on ordered products, and CASCADE from users
//! to their orders. Order reads join the current customer and product
//! details, as the SQL adapter does.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use pagination::{Page, PageRequest};
use rust_decimal::Decimal;

use crate::domain::{
    Category, CategoryId, ConfigKey, Order, OrderCustomer, OrderId, OrderItem, OrderStatus,
    Payment, Product, ProductId, SiteConfig, User, UserId,
};

mod catalogue;
mod orders;
mod site_config;
mod users;

#[derive(Debug, Clone)]
struct StoredItem {
    id: i32,
    product_id: ProductId,
    quantity: i32,
    price: Decimal,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    items: Vec<StoredItem>,
    payment: Option<Payment>,
}

#[derive(Debug, Default)]
struct Sequences {
    user: i32,
    category: i32,
    product: i32,
    order: i32,
    item: i32,
    payment: i32,
}

fn advance(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct State {
    sequences: Sequences,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, StoredOrder>,
    site_configs: BTreeMap<ConfigKey, SiteConfig>,
}

impl State {
    fn materialise(&self, stored: &StoredOrder) -> Order {
        let customer = self
            .users
            .get(&stored.user_id)
            .map(|user| OrderCustomer {
                name: user.name.as_str().to_owned(),
                email: user.email.as_str().to_owned(),
            })
            .unwrap_or_else(|| OrderCustomer {
                name: String::new(),
                email: String::new(),
            });
        let items = stored
            .items
            .iter()
            .map(|item| {
                let product = self.products.get(&item.product_id);
                OrderItem {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                    product_name: product
                        .map(|product| product.name.as_str().to_owned())
                        .unwrap_or_default(),
                    product_image: product.and_then(|product| product.image.clone()),
                }
            })
            .collect();
        Order {
            id: stored.id,
            user_id: stored.user_id,
            status: stored.status,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            customer,
            items,
            payment: stored.payment.clone(),
        }
    }

    fn product_is_ordered(&self, id: ProductId) -> bool {
        self.orders
            .values()
            .any(|order| order.items.iter().any(|item| item.product_id == id))
    }
}

/// Failure to seed an order directly into the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// The customer does not exist.
    #[error("user {0} does not exist")]
    MissingUser(UserId),
    /// A line references an unknown product.
    #[error("product {0} does not exist")]
    MissingProduct(ProductId),
    /// The order to pay does not exist.
    #[error("order {0} does not exist")]
    MissingOrder(OrderId),
    /// Quantities must be positive.
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),
    /// The store mutex was poisoned by a panicking writer.
    #[error("in-memory store lock poisoned")]
    Poisoned,
}

/// Shared, cloneable in-memory store.
///
/// Clones share state, so one store can be handed to every service.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store stamping rows with the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Empty store stamping rows with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }

    /// Insert an order for `user_id`, pricing each `(product, quantity)` line
    /// at the product's current price.
    ///
    /// Orders have no creation endpoint; this seeds demo and test data.
    ///
    /// # Errors
    /// [`SeedError`] when the user or a product is unknown or a quantity is
    /// not positive.
    pub fn seed_order(
        &self,
        user_id: UserId,
        lines: &[(ProductId, i32)],
        created_at: DateTime<Utc>,
    ) -> Result<OrderId, SeedError> {
        let mut state = self.state.lock().map_err(|_| SeedError::Poisoned)?;
        if !state.users.contains_key(&user_id) {
            return Err(SeedError::MissingUser(user_id));
        }
        let mut items = Vec::with_capacity(lines.len());
        for &(product_id, quantity) in lines {
            if quantity <= 0 {
                return Err(SeedError::InvalidQuantity(quantity));
            }
            let price = state
                .products
                .get(&product_id)
                .map(|product| product.price.amount())
                .ok_or(SeedError::MissingProduct(product_id))?;
            items.push(StoredItem {
                id: advance(&mut state.sequences.item),
                product_id,
                quantity,
                price,
            });
        }
        let id = OrderId::new(advance(&mut state.sequences.order));
        state.orders.insert(
            id,
            StoredOrder {
                id,
                user_id,
                status: OrderStatus::Pending,
                created_at,
                updated_at: created_at,
                items,
                payment: None,
            },
        );
        Ok(id)
    }

    /// Attach a payment covering the order total.
    ///
    /// # Errors
    /// [`SeedError::MissingOrder`] when the order is unknown.
    pub fn seed_payment(
        &self,
        order_id: OrderId,
        method: &str,
        status: &str,
    ) -> Result<(), SeedError> {
        let now = self.now();
        let mut state = self.state.lock().map_err(|_| SeedError::Poisoned)?;
        let payment_id = advance(&mut state.sequences.payment);
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(SeedError::MissingOrder(order_id))?;
        let amount = order
            .items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        order.payment = Some(Payment {
            id: payment_id,
            amount,
            method: method.to_owned(),
            status: status.to_owned(),
            created_at: now,
        });
        Ok(())
    }
}

fn tally(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = tally(items.len());
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = items.into_iter().skip(offset).take(limit).collect();
    Page::new(items, total, page)
}

#[cfg(test)]
mod tests;
