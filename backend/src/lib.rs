//! Storefront backend library.
//!
//! Layout follows ports and adapters: [`domain`] holds entities, services
//! and port traits; [`inbound`] adapts HTTP requests onto the services;
//! [`outbound`] implements the ports for PostgreSQL, the in-memory store,
//! credential handling and image hosting.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
