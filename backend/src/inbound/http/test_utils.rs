//! Test helpers for inbound HTTP components.
//!
//! Handler tests run against the in-memory store with a real JWT codec and
//! Argon2 hasher, so requests exercise the same services as production.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use mockable::DefaultClock;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::ports::{
    CategoryRepository, ImageStore, ProductRepository, TokenCodec, UnconfiguredImageStore,
    UserRepository,
};
use crate::domain::{
    Category, CategoryName, EmailAddress, NewCategory, NewProduct, NewUser, OrderId, PasswordHash,
    Price, Product, ProductId, ProductName, Role, Stock, User, UserName,
};
use crate::outbound::memory::InMemoryStore;
use crate::outbound::security::{Argon2CredentialHasher, JwtTokenCodec};

use super::state::{HttpSettings, HttpState, HttpStatePorts};

const TEST_SECRET: &[u8] = b"handler-test-secret-handler-test-secret";

/// In-memory wiring shared by handler tests.
pub(crate) struct TestContext {
    store: Arc<InMemoryStore>,
    tokens: Arc<JwtTokenCodec>,
    state: web::Data<HttpState>,
}

impl TestContext {
    /// Context whose image host is unconfigured.
    pub(crate) fn new() -> Self {
        Self::with_images(Arc::new(UnconfiguredImageStore))
    }

    /// Context forwarding uploads to `images`.
    pub(crate) fn with_images(images: Arc<dyn ImageStore>) -> Self {
        Self::build(images, HttpSettings::default())
    }

    /// Context with custom transport settings, such as tighter quotas.
    pub(crate) fn with_settings(settings: HttpSettings) -> Self {
        Self::build(Arc::new(UnconfiguredImageStore), settings)
    }

    fn build(images: Arc<dyn ImageStore>, settings: HttpSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let tokens = Arc::new(JwtTokenCodec::new(
            TEST_SECRET,
            Duration::from_secs(24 * 60 * 60),
        ));
        let state = HttpState::new(
            HttpStatePorts {
                users: store.clone(),
                categories: store.clone(),
                products: store.clone(),
                orders: store.clone(),
                site_configs: store.clone(),
                hasher: Arc::new(Argon2CredentialHasher::new()),
                tokens: tokens.clone(),
                images,
                clock: Arc::new(DefaultClock),
            },
            settings,
        );
        Self {
            store,
            tokens,
            state: web::Data::new(state),
        }
    }

    pub(crate) fn state(&self) -> web::Data<HttpState> {
        self.state.clone()
    }

    pub(crate) fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Full `/api` application over this context.
    pub(crate) fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state())
            .configure(super::configure)
    }

    /// Insert an account directly; its password is unusable.
    pub(crate) async fn user(&self, name: &str, email: &str, role: Role) -> User {
        UserRepository::create(
            self.store.as_ref(),
            NewUser {
                name: UserName::new(name).expect("valid name"),
                email: EmailAddress::new(email).expect("valid email"),
                password_hash: PasswordHash::new("$argon2id$unusable"),
                role,
            },
        )
        .await
        .expect("insert user")
    }

    pub(crate) async fn admin(&self) -> User {
        self.user("Admin", "admin@example.com", Role::Admin).await
    }

    pub(crate) async fn remove_user(&self, user: &User) {
        UserRepository::delete(self.store.as_ref(), user.id)
            .await
            .expect("delete user");
    }

    pub(crate) async fn category(&self, name: &str) -> Category {
        CategoryRepository::create(
            self.store.as_ref(),
            NewCategory {
                name: CategoryName::new(name).expect("valid category name"),
                description: String::new(),
                image: None,
            },
        )
        .await
        .expect("insert category")
    }

    pub(crate) async fn product(&self, name: &str, price: i64, category: &Category) -> Product {
        ProductRepository::create(
            self.store.as_ref(),
            NewProduct {
                name: ProductName::new(name).expect("valid product name"),
                description: String::new(),
                price: Price::new(Decimal::from(price)).expect("valid price"),
                stock: Stock::new(10).expect("valid stock"),
                image: None,
                category_id: category.id,
            },
        )
        .await
        .expect("insert product")
    }

    /// Seed a pending order placed now.
    pub(crate) fn order(&self, user: &User, lines: &[(&Product, i32)]) -> OrderId {
        let lines: Vec<(ProductId, i32)> = lines
            .iter()
            .map(|(product, quantity)| (product.id, *quantity))
            .collect();
        self.store
            .seed_order(user.id, &lines, Utc::now())
            .expect("seed order")
    }

    pub(crate) fn token_for(&self, user: &User) -> String {
        self.tokens.issue(user.id).expect("issue token").value
    }

    pub(crate) fn bearer(&self, user: &User) -> (actix_web::http::header::HeaderName, String) {
        (AUTHORIZATION, format!("Bearer {}", self.token_for(user)))
    }
}

/// Decode a JSON response body.
pub(crate) async fn read_json(res: ServiceResponse) -> Value {
    actix_test::read_body_json(res).await
}
