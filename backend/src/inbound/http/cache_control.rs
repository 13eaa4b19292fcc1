//! Cache-control policies for HTTP responses.

/// Account-specific responses must always be revalidated before reuse.
pub const PRIVATE_NO_CACHE_MUST_REVALIDATE: &str = "private, no-cache, must-revalidate";

/// Health check responses must never be cached.
pub const NO_STORE: &str = "no-store";

/// Header tuple for account-specific API responses.
pub const fn private_no_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_NO_CACHE_MUST_REVALIDATE)
}
