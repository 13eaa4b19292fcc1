//! Response bodies shared across handlers.
//!
//! Domain entities stay free of wire concerns; these types fix the camelCase
//! JSON shape and render decimals as JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Category, CategoryRef, ConfigType, Order, OrderItem, OrderStatus, Payment, Product,
    ProductWithCategory, Role, SiteConfig, User, UserWithOrderCount,
};

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Account row in the admin user list.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserResponse,
    pub order_count: u64,
}

impl From<UserWithOrderCount> for UserListItem {
    fn from(row: UserWithOrderCount) -> Self {
        Self {
            user: UserResponse::from(&row.user),
            order_count: row.order_count,
        }
    }
}

/// Category without its products.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Shoes")]
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.get(),
            name: category.name.to_string(),
            description: category.description,
            image: category.image,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Category reference embedded in products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryRefResponse {
    pub id: i32,
    pub name: String,
}

impl From<CategoryRef> for CategoryRefResponse {
    fn from(category: CategoryRef) -> Self {
        Self {
            id: category.id.get(),
            name: category.name.to_string(),
        }
    }
}

/// Catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Trail runner")]
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 59.9)]
    pub price: Decimal,
    #[schema(example = 12)]
    pub stock: i32,
    pub image: Option<String>,
    pub category_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRefResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.get(),
            name: product.name.to_string(),
            description: product.description,
            price: product.price.amount(),
            stock: product.stock.units(),
            image: product.image,
            category_id: product.category_id.get(),
            category: None,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<ProductWithCategory> for ProductResponse {
    fn from(row: ProductWithCategory) -> Self {
        Self {
            category: Some(row.category.into()),
            ..Self::from(row.product)
        }
    }
}

/// Line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    /// Unit price at purchase time.
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub product_name: String,
    pub product_image: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id.get(),
            quantity: item.quantity,
            price: item.price,
            product_name: item.product_name,
            product_image: item.product_image,
        }
    }
}

/// Payment attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount,
            method: payment.method,
            status: payment.status,
            created_at: payment.created_at,
        }
    }
}

/// Order with its customer, lines and derived total.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: OrderStatus,
    /// Sum of `price * quantity` over the items.
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<OrderItemResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total = order.total();
        Self {
            id: order.id.get(),
            user_id: order.user_id.get(),
            status: order.status,
            total,
            created_at: order.created_at,
            updated_at: order.updated_at,
            user_name: order.customer.name,
            user_email: order.customer.email,
            items: order.items.into_iter().map(Into::into).collect(),
            payment: order.payment.map(Into::into),
        }
    }
}

/// Site configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfigResponse {
    #[schema(example = "site_name")]
    pub key: String,
    #[serde(rename = "type")]
    pub config_type: ConfigType,
    #[schema(example = "Tienda")]
    pub value: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SiteConfig> for SiteConfigResponse {
    fn from(entry: SiteConfig) -> Self {
        Self {
            key: entry.key.to_string(),
            config_type: entry.config_type,
            value: entry.value,
            label: entry.label,
            description: entry.description,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}
