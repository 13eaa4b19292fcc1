//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types re-validate
//! stored values; a row that no longer satisfies the domain invariants is
//! reported as a query failure.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::domain::{
    Category, CategoryId, CategoryName, CategoryRef, ConfigKey, ConfigType, EmailAddress,
    OrderItem, OrderStatus, PasswordHash, Payment, Price, Product, ProductId, ProductName, Role,
    SiteConfig, Stock, User, UserId, UserName,
};

use super::schema::{categories, orders, payments, products, site_configs, users};

/// Stored value that fails domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {table} row: {message}")]
pub(crate) struct CorruptRow {
    table: &'static str,
    message: String,
}

impl CorruptRow {
    fn new(table: &'static str, message: impl ToString) -> Self {
        Self {
            table,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CorruptRow;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |err| CorruptRow::new("users", err);
        Ok(Self {
            id: UserId::new(row.id),
            name: UserName::new(row.name).map_err(corrupt)?,
            email: EmailAddress::new(&row.email).map_err(corrupt)?,
            password_hash: PasswordHash::new(row.password_hash),
            role: Role::parse(&row.role).map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

/// Changeset struct for partial user updates; `None` columns are untouched
/// and `updated_at` is always stamped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserUpdate<'a> {
    pub updated_at: DateTime<Utc>,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Row struct for reading from the categories table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = CorruptRow;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(row.id),
            name: CategoryName::new(&row.name).map_err(|err| CorruptRow::new("categories", err))?,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable struct for creating new category records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub(crate) struct NewCategoryRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub image: Option<&'a str>,
}

/// Changeset struct for partial category updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = categories)]
pub(crate) struct CategoryUpdate<'a> {
    pub updated_at: DateTime<Utc>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub image: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Row struct for reading from the products table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = CorruptRow;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |err| CorruptRow::new("products", err);
        Ok(Self {
            id: ProductId::new(row.id),
            name: ProductName::new(&row.name).map_err(corrupt)?,
            description: row.description,
            price: Price::new(row.price).map_err(corrupt)?,
            stock: Stock::new(row.stock).map_err(corrupt)?,
            image: row.image,
            category_id: CategoryId::new(row.category_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `(id, name)` projection used to attach category names to products.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CategoryRefRow {
    pub id: i32,
    pub name: String,
}

impl TryFrom<CategoryRefRow> for CategoryRef {
    type Error = CorruptRow;

    fn try_from(row: CategoryRefRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(row.id),
            name: CategoryName::new(&row.name).map_err(|err| CorruptRow::new("categories", err))?,
        })
    }
}

/// Insertable struct for creating new product records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub(crate) struct NewProductRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<&'a str>,
    pub category_id: i32,
}

/// Changeset struct for partial product updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = products)]
pub(crate) struct ProductUpdate<'a> {
    pub updated_at: DateTime<Utc>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image: Option<&'a str>,
    pub category_id: Option<i32>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Row struct for reading from the orders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: i32,
    pub user_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub(crate) fn status(&self) -> Result<OrderStatus, CorruptRow> {
        OrderStatus::parse(&self.status).map_err(|err| CorruptRow::new("orders", err))
    }
}

/// Customer columns shown alongside an order.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CustomerRow {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Order item joined with the product's current name and image.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct OrderItemRow {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub product_name: String,
    pub product_image: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price: row.price,
            product_name: row.product_name,
            product_image: row.product_image,
        }
    }
}

/// Row struct for reading from the payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: i32,
    pub order_id: i32,
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            amount: row.amount,
            method: row.method,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Site configuration
// ---------------------------------------------------------------------------

/// Row struct for reading from the site_configs table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = site_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SiteConfigRow {
    pub key: String,
    pub config_type: String,
    pub value: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SiteConfigRow> for SiteConfig {
    type Error = CorruptRow;

    fn try_from(row: SiteConfigRow) -> Result<Self, Self::Error> {
        let corrupt = |err| CorruptRow::new("site_configs", err);
        Ok(Self {
            key: ConfigKey::new(&row.key).map_err(corrupt)?,
            config_type: ConfigType::parse(&row.config_type).map_err(corrupt)?,
            value: row.value,
            label: row.label,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable and changeset struct for site configuration upserts.
///
/// `treat_none_as_null` makes a missing label or description clear the
/// stored one, matching replace semantics.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = site_configs)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SiteConfigRowWrite<'a> {
    pub key: &'a str,
    pub config_type: &'a str,
    pub value: &'a str,
    pub label: Option<&'a str>,
    pub description: Option<&'a str>,
}
