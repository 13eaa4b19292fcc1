//! Request middleware.
//!
//! Purpose: request lifecycle concerns shared by every route: trace
//! correlation with access logging, and per-client request quotas.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::{Quota, RateLimit, RateLimits, RatePolicies, RatePolicy, Verdict};
pub use trace::Trace;
