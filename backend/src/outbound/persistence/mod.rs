//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the storefront's
//! repository ports backed by PostgreSQL via the Diesel ORM with async
//! support through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Constraints as errors**: unique and foreign key violations become the
//!   typed variants each port declares.
//!
//! # Example
//!
//! ```ignore
//! use storefront::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/storefront")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_category_repository;
mod diesel_error_mapping;
mod diesel_order_repository;
mod diesel_product_repository;
mod diesel_site_config_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_category_repository::DieselCategoryRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_product_repository::DieselProductRepository;
pub use diesel_site_config_repository::DieselSiteConfigRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
