//! Domain primitives, services and ports.
//!
//! Purpose: define the storefront's entities and use-cases independently of
//! HTTP and storage. Inbound adapters call the services; outbound adapters
//! implement the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable code.
//! - Entities: users, categories, products, orders, site configuration.
//! - Services: one per resource plus authentication, image attachment and
//!   administrator bootstrap.

pub mod ports;

mod access;
mod admin_bootstrap;
mod auth_service;
mod category;
mod category_service;
mod error;
mod ids;
mod image_attachment_service;
mod order;
mod order_service;
mod product;
mod product_service;
mod repository_errors;
mod site_config;
mod site_config_service;
mod stats;
#[cfg(test)]
mod test_fixtures;
mod trace_id;
mod user;
mod user_service;

pub use self::access::{ADMIN_REQUIRED_MESSAGE, Actor};
pub use self::admin_bootstrap::{AdminAccount, AdminBootstrap, BootstrapOutcome};
pub use self::auth_service::{
    AuthService, Session, SignUp, TOKEN_INVALID_MESSAGE, TOKEN_MISSING_MESSAGE,
    TOKEN_USER_MISSING_MESSAGE,
};
pub use self::category::{
    CATEGORY_NAME_MAX, Category, CategoryChanges, CategoryDetails, CategoryName,
    CategoryValidationError, CategoryWithProductCount, NewCategory,
};
pub use self::category_service::{CATEGORY_NOT_FOUND_MESSAGE, CategoryService};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{CategoryId, OrderId, ParseIdError, ProductId, UserId};
pub use self::image_attachment_service::{AttachedImage, ImageAttachmentService};
pub use self::order::{
    Order, OrderCustomer, OrderFilter, OrderItem, OrderStatus, OrderValidationError, Payment,
};
pub use self::order_service::{ORDER_NOT_FOUND_MESSAGE, OrderService};
pub use self::product::{
    CategoryRef, NewProduct, PRODUCT_NAME_MAX, Price, Product, ProductChanges, ProductFilter,
    ProductName, ProductValidationError, ProductWithCategory, Stock,
};
pub use self::product_service::{PRODUCT_NOT_FOUND_MESSAGE, ProductService};
pub use self::site_config::{
    CONFIG_KEY_MAX, ConfigKey, ConfigType, SiteConfig, SiteConfigUpsert,
    SiteConfigValidationError,
};
pub use self::site_config_service::{CONFIG_NOT_FOUND_MESSAGE, SiteConfigService};
pub use self::stats::{MonthWindows, OrderStats, TimeWindow, UserStats, growth_percentage};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, NewUser, PASSWORD_MIN, Password, PasswordHash, Role, USER_NAME_MAX, User,
    UserChanges, UserName, UserValidationError, UserWithOrderCount,
};
pub use self::user_service::{USER_NOT_FOUND_MESSAGE, UserService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use storefront::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
