//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services, which in turn only see ports. Tests build it
//! over the in-memory store.

use std::path::PathBuf;
use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CategoryRepository, CredentialHasher, ImageStore, OrderRepository, ProductRepository,
    SiteConfigRepository, TokenCodec, UserRepository,
};
use crate::domain::{
    AuthService, CategoryService, ImageAttachmentService, OrderService, ProductService,
    SiteConfigService, UserService,
};
use crate::middleware::{RateLimits, RatePolicies};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub site_configs: Arc<dyn SiteConfigRepository>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenCodec>,
    pub images: Arc<dyn ImageStore>,
    pub clock: Arc<dyn Clock>,
}

/// Transport settings consumed by handlers rather than services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Mark the `token` cookie `Secure`.
    pub cookie_secure: bool,
    /// Directory receiving transient upload files.
    pub upload_dir: PathBuf,
    /// Per-IP request quotas.
    pub rate_limits: RatePolicies,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            upload_dir: std::env::temp_dir(),
            rate_limits: RatePolicies::default(),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub users: UserService,
    pub categories: CategoryService,
    pub products: ProductService,
    pub orders: OrderService,
    pub site_config: SiteConfigService,
    pub images: ImageAttachmentService,
    /// Request counters shared by every worker.
    pub rate_limits: RateLimits,
    pub settings: HttpSettings,
}

impl HttpState {
    /// Wire every service over the supplied ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// use mockable::DefaultClock;
    /// use storefront::domain::ports::UnconfiguredImageStore;
    /// use storefront::inbound::http::state::{HttpSettings, HttpState, HttpStatePorts};
    /// use storefront::outbound::memory::InMemoryStore;
    /// use storefront::outbound::security::{Argon2CredentialHasher, JwtTokenCodec};
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let state = HttpState::new(
    ///     HttpStatePorts {
    ///         users: store.clone(),
    ///         categories: store.clone(),
    ///         products: store.clone(),
    ///         orders: store.clone(),
    ///         site_configs: store,
    ///         hasher: Arc::new(Argon2CredentialHasher::new()),
    ///         tokens: Arc::new(JwtTokenCodec::new(b"secret", Duration::from_secs(60))),
    ///         images: Arc::new(UnconfiguredImageStore),
    ///         clock: Arc::new(DefaultClock),
    ///     },
    ///     HttpSettings::default(),
    /// );
    /// assert!(!state.settings.cookie_secure);
    /// ```
    pub fn new(ports: HttpStatePorts, settings: HttpSettings) -> Self {
        let HttpStatePorts {
            users,
            categories,
            products,
            orders,
            site_configs,
            hasher,
            tokens,
            images,
            clock,
        } = ports;

        Self {
            auth: AuthService::new(users.clone(), hasher, tokens),
            users: UserService::new(users.clone(), clock.clone()),
            categories: CategoryService::new(categories.clone()),
            products: ProductService::new(products.clone(), categories.clone()),
            orders: OrderService::new(orders, users, clock.clone()),
            site_config: SiteConfigService::new(site_configs),
            images: ImageAttachmentService::new(images, products, categories),
            rate_limits: RateLimits::new(settings.rate_limits, clock),
            settings,
        }
    }
}
