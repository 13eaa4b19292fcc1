//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-memory repositories used when no database is configured
//! - **security**: Argon2 password hashing and JWT access tokens
//! - **images**: Cloudinary image hosting
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod images;
pub mod memory;
pub mod persistence;
pub mod security;
