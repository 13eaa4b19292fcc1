//! Customer orders, their line items and payments.
//!
//! Orders are created by an external checkout flow; this service only reads
//! them and lets administrators advance the status. The order total is never
//! stored: [`Order::total`] recomputes it from the line items on every read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{OrderId, ProductId, UserId};

/// Validation errors raised while parsing order values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    /// Status outside the five accepted literals.
    #[error("Estado inválido. Debe ser uno de: pending, processing, shipped, delivered, cancelled")]
    InvalidStatus { value: String },
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting processing.
    Pending,
    /// Being prepared.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Abandoned.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Lowercase literal stored and returned over the API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a status, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    /// Returns [`OrderValidationError::InvalidStatus`] for anything else.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::OrderStatus;
    ///
    /// assert_eq!(OrderStatus::parse("SHIPPED").unwrap(), OrderStatus::Shipped);
    /// assert!(OrderStatus::parse("lost").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, OrderValidationError> {
        let normalised = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalised)
            .ok_or_else(|| OrderValidationError::InvalidStatus {
                value: raw.to_owned(),
            })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Line item captured at purchase time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// Store-assigned identifier.
    pub id: i32,
    /// Purchased product.
    pub product_id: ProductId,
    /// Units purchased.
    pub quantity: i32,
    /// Unit price at purchase.
    pub price: Decimal,
    /// Current product name.
    pub product_name: String,
    /// Current product image URL.
    pub product_image: Option<String>,
}

impl OrderItem {
    /// `price × quantity`.
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Payment recorded against an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    /// Store-assigned identifier.
    pub id: i32,
    /// Amount charged.
    pub amount: Decimal,
    /// Payment method label.
    pub method: String,
    /// Processor status label.
    pub status: String,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

/// Name and email of the customer who placed an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCustomer {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

/// Order with items, customer and payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Store-assigned identifier.
    pub id: OrderId,
    /// Owner of the order.
    pub user_id: UserId,
    /// Current status.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Customer contact details.
    pub customer: OrderCustomer,
    /// Purchased lines, ordered by id.
    pub items: Vec<OrderItem>,
    /// Payment, when one has been recorded.
    pub payment: Option<Payment>,
}

impl Order {
    /// Sum of `price × quantity` across the line items.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }
}

/// Listing filter for orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Restrict to one status.
    pub status: Option<OrderStatus>,
    /// Restrict to one customer.
    pub user_id: Option<UserId>,
}

impl OrderFilter {
    /// Orders placed by `user_id`.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            status: None,
            user_id: Some(user_id),
        }
    }

    /// Whether `order` satisfies the filter.
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status == status)
            && self.user_id.is_none_or(|user_id| order.user_id == user_id)
    }
}
