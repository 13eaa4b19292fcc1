//! Catalogue products and their validated values.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{CategoryId, CategoryName, ProductId};

/// Maximum length of a product name, in characters.
pub const PRODUCT_NAME_MAX: usize = 150;

/// Validation errors raised while building product values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductValidationError {
    /// Name missing or blank.
    #[error("product name must not be empty")]
    EmptyName,
    /// Name longer than [`PRODUCT_NAME_MAX`].
    #[error("product name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// Price below zero.
    #[error("price must not be negative")]
    NegativePrice,
    /// Stock below zero.
    #[error("stock must not be negative")]
    NegativeStock,
}

/// Trimmed product name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductName(String);

impl ProductName {
    /// Validate and trim a product name.
    ///
    /// # Errors
    /// Rejects blank names and names over [`PRODUCT_NAME_MAX`] characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProductValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        if trimmed.chars().count() > PRODUCT_NAME_MAX {
            return Err(ProductValidationError::NameTooLong {
                max: PRODUCT_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative unit price, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    /// Validate a price.
    ///
    /// # Errors
    /// Returns [`ProductValidationError::NegativePrice`] below zero.
    ///
    /// # Examples
    /// ```
    /// use rust_decimal::Decimal;
    /// use storefront::domain::Price;
    ///
    /// let price = Price::new(Decimal::new(19_999, 3)).unwrap();
    /// assert_eq!(price.amount(), Decimal::new(2_000, 2));
    /// ```
    pub fn new(amount: Decimal) -> Result<Self, ProductValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ProductValidationError::NegativePrice);
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// Amount as a decimal.
    pub fn amount(self) -> Decimal {
        self.0
    }
}

/// Units on hand; never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stock(i32);

impl Stock {
    /// Validate a stock level.
    ///
    /// # Errors
    /// Returns [`ProductValidationError::NegativeStock`] below zero.
    pub fn new(units: i32) -> Result<Self, ProductValidationError> {
        if units < 0 {
            return Err(ProductValidationError::NegativeStock);
        }
        Ok(Self(units))
    }

    /// Units as an integer.
    pub fn units(self) -> i32 {
        self.0
    }
}

/// Persisted product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Store-assigned identifier.
    pub id: ProductId,
    /// Display name.
    pub name: ProductName,
    /// Free-form description; empty when not provided.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Units on hand.
    pub stock: Stock,
    /// Hosted image URL, once uploaded.
    pub image: Option<String>,
    /// Owning category.
    pub category_id: CategoryId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Identifier and name of the category a product belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRef {
    /// Category identifier.
    pub id: CategoryId,
    /// Category name.
    pub name: CategoryName,
}

/// Product joined with its category reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithCategory {
    /// The product.
    pub product: Product,
    /// Its category.
    pub category: CategoryRef,
}

/// Values required to insert a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    /// Display name.
    pub name: ProductName,
    /// Description; empty when not provided.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Units on hand.
    pub stock: Stock,
    /// Optional image URL supplied at creation.
    pub image: Option<String>,
    /// Owning category; must exist.
    pub category_id: CategoryId,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    /// New name.
    pub name: Option<ProductName>,
    /// New description.
    pub description: Option<String>,
    /// New price.
    pub price: Option<Price>,
    /// New stock level.
    pub stock: Option<Stock>,
    /// New image URL.
    pub image: Option<String>,
    /// New owning category; must exist.
    pub category_id: Option<CategoryId>,
}

/// Listing filter for products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Restrict to one category.
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl ProductFilter {
    /// Build a filter, dropping blank search terms.
    pub fn new(category_id: Option<CategoryId>, search: Option<String>) -> Self {
        let search = search
            .map(|term| term.trim().to_owned())
            .filter(|term| !term.is_empty());
        Self {
            category_id,
            search,
        }
    }

    /// Whether `product` satisfies the filter.
    ///
    /// Used by adapters that filter in process.
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self
            .category_id
            .is_none_or(|category_id| product.category_id == category_id);
        let search_ok = self.search.as_ref().is_none_or(|term| {
            product
                .name
                .as_str()
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        category_ok && search_ok
    }
}
