//! Per-IP request quotas over fixed windows.
//!
//! Counters live in [`RateLimits`], which [`HttpState`] owns, so every worker
//! of a process shares them. [`RateLimit`] selects one quota and is attached
//! to a scope or resource with `wrap`; nested limiters each count the request.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use actix_web::{ResponseError, web};
use chrono::{DateTime, Utc};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use mockable::Clock;
use tracing::warn;

use crate::domain::Error;
use crate::inbound::http::state::HttpState;

const LIMIT_HEADER: &str = "ratelimit-limit";
const REMAINING_HEADER: &str = "ratelimit-remaining";
const RESET_HEADER: &str = "ratelimit-reset";
const UNKNOWN_CLIENT: &str = "unknown";
// Expired windows are swept once a bucket tracks this many clients.
const SWEEP_THRESHOLD: usize = 4096;

/// Request budget for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    /// Requests allowed per client within `window`.
    pub max_requests: u32,
    /// Length of a window, counted from the client's first request.
    pub window: Duration,
}

impl RatePolicy {
    /// Allow `max_requests` per `window`.
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Budgets for each limiter the API applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicies {
    /// Every `/api` request.
    pub api: RatePolicy,
    /// Sign-up and sign-in.
    pub auth: RatePolicy,
    /// Product create, update and delete.
    pub product_writes: RatePolicy,
}

impl Default for RatePolicies {
    fn default() -> Self {
        Self {
            api: RatePolicy::new(100, Duration::from_secs(15 * 60)),
            auth: RatePolicy::new(20, Duration::from_secs(60 * 60)),
            product_writes: RatePolicy::new(50, Duration::from_secs(60 * 60)),
        }
    }
}

/// Which budget a request is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quota {
    Api,
    Auth,
    ProductWrites,
}

impl Quota {
    /// Message returned once the budget is spent.
    pub fn exhausted_message(self) -> &'static str {
        match self {
            Self::Api => "Too many API requests from this IP, please try again after 15 minutes",
            Self::Auth => {
                "Too many authentication attempts from this IP, please try again after an hour"
            }
            Self::ProductWrites => {
                "Too many product operations from this IP, please try again after an hour"
            }
        }
    }
}

/// Outcome of charging one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window closes.
    pub reset_after: Duration,
}

impl Verdict {
    fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs.saturating_add(1)
        } else {
            secs
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    hits: u32,
}

impl Window {
    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started).to_std().unwrap_or(Duration::ZERO)
    }

    fn expired(&self, now: DateTime<Utc>, length: Duration) -> bool {
        self.elapsed(now) >= length
    }
}

#[derive(Debug)]
struct Bucket {
    policy: RatePolicy,
    windows: Mutex<HashMap<String, Window>>,
}

impl Bucket {
    fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn charge(&self, client: &str, now: DateTime<Utc>) -> Verdict {
        let length = self.policy.window;
        // A poisoned lock still guards whole counters.
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, window| !window.expired(now, length));
        }

        let window = windows.entry(client.to_owned()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if window.expired(now, length) {
            *window = Window {
                started: now,
                hits: 0,
            };
        }
        window.hits = window.hits.saturating_add(1);

        let limit = self.policy.max_requests;
        Verdict {
            allowed: window.hits <= limit,
            limit,
            remaining: limit.saturating_sub(window.hits),
            reset_after: length.saturating_sub(window.elapsed(now)),
        }
    }
}

/// Shared counters for every [`Quota`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use storefront::middleware::{Quota, RateLimits, RatePolicies};
///
/// let limits = RateLimits::new(RatePolicies::default(), Arc::new(DefaultClock));
/// let verdict = limits.charge(Quota::Auth, "203.0.113.7");
/// assert!(verdict.allowed);
/// assert_eq!(verdict.remaining, 19);
/// ```
#[derive(Clone)]
pub struct RateLimits {
    clock: Arc<dyn Clock>,
    api: Arc<Bucket>,
    auth: Arc<Bucket>,
    product_writes: Arc<Bucket>,
}

impl RateLimits {
    /// Empty counters enforcing `policies`, timed by `clock`.
    pub fn new(policies: RatePolicies, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            api: Arc::new(Bucket::new(policies.api)),
            auth: Arc::new(Bucket::new(policies.auth)),
            product_writes: Arc::new(Bucket::new(policies.product_writes)),
        }
    }

    /// Count one request from `client` against `quota`.
    pub fn charge(&self, quota: Quota, client: &str) -> Verdict {
        let bucket = match quota {
            Quota::Api => &self.api,
            Quota::Auth => &self.auth,
            Quota::ProductWrites => &self.product_writes,
        };
        bucket.charge(client, self.clock.utc())
    }
}

/// Middleware charging each request against one [`Quota`].
///
/// Requests over budget are answered with 429 in the failure envelope and a
/// `Retry-After` header; the wrapped service is not called.
///
/// # Examples
/// ```
/// use actix_web::{App, HttpResponse, web};
/// use storefront::middleware::RateLimit;
///
/// let app = App::new().service(
///     web::scope("/api")
///         .wrap(RateLimit::api())
///         .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    quota: Quota,
}

impl RateLimit {
    /// General quota for the whole API.
    pub fn api() -> Self {
        Self { quota: Quota::Api }
    }

    /// Quota for credential submissions.
    pub fn auth() -> Self {
        Self { quota: Quota::Auth }
    }

    /// Quota for product mutations.
    pub fn product_writes() -> Self {
        Self {
            quota: Quota::ProductWrites,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            quota: self.quota,
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    quota: Quota,
}

fn client_key(req: &ServiceRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: u64, overwrite: bool) {
    if overwrite || !headers.contains_key(&name) {
        headers.insert(name, HeaderValue::from(value));
    }
}

// Inner limiters run first on the way out, so the most specific quota's
// figures are kept.
fn advertise(headers: &mut HeaderMap, verdict: &Verdict) {
    set_header(
        headers,
        HeaderName::from_static(LIMIT_HEADER),
        u64::from(verdict.limit),
        false,
    );
    set_header(
        headers,
        HeaderName::from_static(REMAINING_HEADER),
        u64::from(verdict.remaining),
        false,
    );
    set_header(
        headers,
        HeaderName::from_static(RESET_HEADER),
        verdict.reset_secs(),
        false,
    );
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let quota = self.quota;
        // Charged inside the future so rejections carry the request's trace id.
        Box::pin(async move {
            let limits = req
                .app_data::<web::Data<HttpState>>()
                .map(|state| state.rate_limits.clone());
            let Some(limits) = limits else {
                warn!(?quota, "rate limiter has no shared state; request not counted");
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            };

            let client = client_key(&req);
            let verdict = limits.charge(quota, &client);
            if !verdict.allowed {
                warn!(?quota, client = %client, "request quota exhausted");
                let mut response = Error::too_many_requests(quota.exhausted_message()).error_response();
                let headers = response.headers_mut();
                advertise(headers, &verdict);
                set_header(headers, RETRY_AFTER, verdict.reset_secs(), true);
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            advertise(res.headers_mut(), &verdict);
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::state::HttpSettings;
    use crate::inbound::http::test_utils::{TestContext, read_json};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use chrono::TimeZone;
    use rstest::rstest;
    use std::net::SocketAddr;

    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl SteppingClock {
        fn starting_at(at: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(at)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().expect("clock lock");
            *now += chrono::TimeDelta::from_std(by).expect("representable step");
        }
    }

    impl Clock for SteppingClock {
        fn local(&self) -> DateTime<chrono::Local> {
            self.utc().with_timezone(&chrono::Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock lock")
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn tight(max_requests: u32) -> RatePolicies {
        let policy = RatePolicy::new(max_requests, Duration::from_secs(60));
        RatePolicies {
            api: policy,
            auth: policy,
            product_writes: policy,
        }
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn peer(ip: &str) -> SocketAddr {
        format!("{ip}:40000").parse().expect("socket address")
    }

    #[rstest]
    fn defaults_follow_the_published_quotas() {
        let policies = RatePolicies::default();
        assert_eq!(policies.api, RatePolicy::new(100, Duration::from_secs(900)));
        assert_eq!(policies.auth, RatePolicy::new(20, Duration::from_secs(3600)));
        assert_eq!(
            policies.product_writes,
            RatePolicy::new(50, Duration::from_secs(3600))
        );
    }

    #[rstest]
    fn windows_reopen_once_their_length_has_passed() {
        let clock = SteppingClock::starting_at(noon());
        let limits = RateLimits::new(tight(2), clock.clone());

        assert!(limits.charge(Quota::Api, "198.51.100.1").allowed);
        clock.advance(Duration::from_secs(20));
        let second = limits.charge(Quota::Api, "198.51.100.1");
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);
        assert_eq!(second.reset_after, Duration::from_secs(40));

        let third = limits.charge(Quota::Api, "198.51.100.1");
        assert!(!third.allowed);

        clock.advance(Duration::from_secs(40));
        let reopened = limits.charge(Quota::Api, "198.51.100.1");
        assert!(reopened.allowed);
        assert_eq!(reopened.remaining, 1);
        assert_eq!(reopened.reset_after, Duration::from_secs(60));
    }

    #[rstest]
    fn clients_and_quotas_are_counted_separately() {
        let limits = RateLimits::new(tight(1), SteppingClock::starting_at(noon()));

        assert!(limits.charge(Quota::Auth, "198.51.100.1").allowed);
        assert!(!limits.charge(Quota::Auth, "198.51.100.1").allowed);
        assert!(limits.charge(Quota::Auth, "198.51.100.2").allowed);
        assert!(limits.charge(Quota::ProductWrites, "198.51.100.1").allowed);
    }

    #[rstest]
    fn stale_windows_are_swept_from_crowded_buckets() {
        let clock = SteppingClock::starting_at(noon());
        let bucket = Bucket::new(RatePolicy::new(5, Duration::from_secs(60)));
        for n in 0..SWEEP_THRESHOLD {
            bucket.charge(&format!("client-{n}"), clock.utc());
        }
        clock.advance(Duration::from_secs(61));
        bucket.charge("late", clock.utc());

        let windows = bucket.windows.lock().expect("bucket lock");
        assert_eq!(windows.len(), 1);
        assert!(windows.contains_key("late"));
    }

    #[actix_web::test]
    async fn api_quota_rejects_with_the_failure_envelope() {
        let ctx = TestContext::with_settings(HttpSettings {
            rate_limits: tight(2),
            ..HttpSettings::default()
        });
        let app = actix_test::init_service(
            App::new().app_data(ctx.state()).service(
                web::scope("/api")
                    .wrap(RateLimit::api())
                    .route("/ping", web::get().to(ok)),
            ),
        )
        .await;
        let ping = || {
            actix_test::TestRequest::get()
                .uri("/api/ping")
                .peer_addr(peer("203.0.113.9"))
                .to_request()
        };

        let first = actix_test::call_service(&app, ping()).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(REMAINING_HEADER).and_then(|v| v.to_str().ok()),
            Some("1")
        );
        actix_test::call_service(&app, ping()).await;

        let res = actix_test::call_service(&app, ping()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            res.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
            Some("60")
        );
        let body = read_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "too_many_requests");
        assert_eq!(body["message"], Quota::Api.exhausted_message());

        let other = actix_test::TestRequest::get()
            .uri("/api/ping")
            .peer_addr(peer("203.0.113.10"))
            .to_request();
        let res = actix_test::call_service(&app, other).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn every_api_route_shares_the_general_quota() {
        let ctx = TestContext::with_settings(HttpSettings {
            rate_limits: RatePolicies {
                api: RatePolicy::new(2, Duration::from_secs(900)),
                ..RatePolicies::default()
            },
            ..HttpSettings::default()
        });
        let app = actix_test::init_service(ctx.app()).await;

        for uri in ["/api/categories", "/api/products"] {
            let req = actix_test::TestRequest::get().uri(uri).to_request();
            assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);
        }
        let req = actix_test::TestRequest::get()
            .uri("/api/site-config")
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = read_json(res).await;
        assert_eq!(body["message"], Quota::Api.exhausted_message());
    }

    #[actix_web::test]
    async fn missing_shared_state_lets_requests_through() {
        let app = actix_test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(RateLimit::api())
                    .route("/ping", web::get().to(ok)),
            ),
        )
        .await;
        let req = actix_test::TestRequest::get().uri("/api/ping").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(LIMIT_HEADER).is_none());
    }
}
