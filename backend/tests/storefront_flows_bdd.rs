//! Behaviour tests for administration flows over the HTTP API.
//!
//! Each scenario runs the full `/api` scope against the in-memory store with
//! real Argon2 hashing and JWT tokens.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::Method;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use storefront::domain::ports::UnconfiguredImageStore;
use storefront::domain::{
    AdminAccount, AdminBootstrap, EmailAddress, OrderId, Password, ProductId, UserId, UserName,
};
use storefront::inbound::http::configure;
use storefront::inbound::http::state::{HttpSettings, HttpState, HttpStatePorts};
use storefront::outbound::memory::InMemoryStore;
use storefront::outbound::security::{Argon2CredentialHasher, JwtTokenCodec};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password";
const CUSTOMER_PASSWORD: &str = "customer-password";

struct Account {
    id: i32,
    token: String,
}

struct FlowWorld {
    runner: actix_rt::SystemRunner,
    store: Arc<InMemoryStore>,
    state: web::Data<HttpState>,
    admin: RefCell<Option<Account>>,
    customer: RefCell<Option<Account>>,
    categories: RefCell<HashMap<String, i32>>,
    products: RefCell<HashMap<String, i32>>,
    order: RefCell<Option<OrderId>>,
    last: RefCell<Option<(u16, Value)>>,
}

impl FlowWorld {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = HttpState::new(
            HttpStatePorts {
                users: store.clone(),
                categories: store.clone(),
                products: store.clone(),
                orders: store.clone(),
                site_configs: store.clone(),
                hasher: Arc::new(Argon2CredentialHasher::new()),
                tokens: Arc::new(JwtTokenCodec::new(
                    b"behaviour-test-secret-behaviour-test",
                    Duration::from_secs(60 * 60),
                )),
                images: Arc::new(UnconfiguredImageStore),
                clock: Arc::new(DefaultClock),
            },
            HttpSettings::default(),
        );
        Self {
            runner: actix_rt::System::new(),
            store,
            state: web::Data::new(state),
            admin: RefCell::new(None),
            customer: RefCell::new(None),
            categories: RefCell::new(HashMap::new()),
            products: RefCell::new(HashMap::new()),
            order: RefCell::new(None),
            last: RefCell::new(None),
        }
    }

    fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (u16, Value) {
        let state = self.state.clone();
        let path = path.to_owned();
        let token = token.map(str::to_owned);
        self.runner.block_on(async move {
            let app =
                actix_test::init_service(App::new().app_data(state).configure(configure)).await;
            let mut req = actix_test::TestRequest::default().method(method).uri(&path);
            if let Some(token) = token {
                req = req.insert_header((AUTHORIZATION, format!("Bearer {token}")));
            }
            if let Some(body) = body {
                req = req.set_json(body);
            }
            let res = actix_test::call_service(&app, req.to_request()).await;
            let status = res.status().as_u16();
            let body: Value = actix_test::read_body_json(res).await;
            (status, body)
        })
    }

    fn admin_token(&self) -> String {
        self.admin
            .borrow()
            .as_ref()
            .map(|account| account.token.clone())
            .expect("administrator signed in")
    }

    fn customer_token(&self) -> String {
        self.customer
            .borrow()
            .as_ref()
            .map(|account| account.token.clone())
            .expect("customer signed up")
    }

    fn as_admin(&self, method: Method, path: &str, body: Option<Value>) {
        let token = self.admin_token();
        let outcome = self.send(method, path, Some(&token), body);
        *self.last.borrow_mut() = Some(outcome);
    }

    fn last(&self) -> (u16, Value) {
        self.last.borrow().clone().expect("a request was sent")
    }

    fn category_id(&self, name: &str) -> i32 {
        *self.categories.borrow().get(name).expect("known category")
    }

    fn product_id(&self, name: &str) -> i32 {
        *self.products.borrow().get(name).expect("known product")
    }
}

fn account_from(body: &Value) -> Account {
    Account {
        id: body["data"]["user"]["id"]
            .as_i64()
            .and_then(|id| i32::try_from(id).ok())
            .expect("user id"),
        token: body["data"]["token"]
            .as_str()
            .expect("token")
            .to_owned(),
    }
}

fn data_id(body: &Value) -> i32 {
    body["data"]["id"]
        .as_i64()
        .and_then(|id| i32::try_from(id).ok())
        .expect("resource id")
}

#[fixture]
fn world() -> FlowWorld {
    FlowWorld::new()
}

#[given("an administrator is signed in")]
fn an_administrator_is_signed_in(world: &FlowWorld) {
    let bootstrap = AdminBootstrap::new(world.store.clone(), Arc::new(Argon2CredentialHasher::new()));
    let account = AdminAccount {
        name: UserName::new("Admin").expect("valid name"),
        email: EmailAddress::new(ADMIN_EMAIL).expect("valid email"),
        password: Password::new(ADMIN_PASSWORD).expect("valid password"),
    };
    world
        .runner
        .block_on(bootstrap.ensure(account))
        .expect("administrator provisioned");
    let (status, body) = world.send(
        Method::POST,
        "/api/auth/sign-in",
        None,
        Some(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
    );
    assert_eq!(status, 200, "sign-in failed: {body}");
    *world.admin.borrow_mut() = Some(account_from(&body));
}

#[given("a customer \"{email}\" has signed up")]
fn a_customer_has_signed_up(world: &FlowWorld, email: String) {
    let (status, body) = world.send(
        Method::POST,
        "/api/auth/sign-up",
        None,
        Some(json!({"name": "Customer", "email": email, "password": CUSTOMER_PASSWORD})),
    );
    assert_eq!(status, 201, "sign-up failed: {body}");
    *world.customer.borrow_mut() = Some(account_from(&body));
}

#[given("a category named \"{name}\" exists")]
fn a_category_exists(world: &FlowWorld, name: String) {
    world.as_admin(Method::POST, "/api/categories", Some(json!({"name": name})));
    let (status, body) = world.last();
    assert_eq!(status, 201, "category creation failed: {body}");
    world.categories.borrow_mut().insert(name, data_id(&body));
}

#[given("a product named \"{name}\" priced {price} exists in category \"{category}\"")]
fn a_product_exists(world: &FlowWorld, name: String, price: u32, category: String) {
    let category_id = world.category_id(&category);
    world.as_admin(
        Method::POST,
        "/api/products",
        Some(json!({"name": name, "price": price, "stock": 10, "categoryId": category_id})),
    );
    let (status, body) = world.last();
    assert_eq!(status, 201, "product creation failed: {body}");
    world.products.borrow_mut().insert(name, data_id(&body));
}

#[given("the customer has ordered {quantity} units of \"{product}\"")]
fn the_customer_has_ordered(world: &FlowWorld, quantity: i32, product: String) {
    let customer = world
        .customer
        .borrow()
        .as_ref()
        .map(|account| account.id)
        .expect("customer signed up");
    let order = world
        .store
        .seed_order(
            UserId::new(customer),
            &[(ProductId::new(world.product_id(&product)), quantity)],
            Utc::now(),
        )
        .expect("order seeded");
    *world.order.borrow_mut() = Some(order);
}

#[when("the administrator deletes category \"{name}\"")]
fn the_administrator_deletes_category(world: &FlowWorld, name: String) {
    let path = format!("/api/categories/{}", world.category_id(&name));
    world.as_admin(Method::DELETE, &path, None);
}

#[when("the administrator deletes product \"{name}\"")]
fn the_administrator_deletes_product(world: &FlowWorld, name: String) {
    let path = format!("/api/products/{}", world.product_id(&name));
    world.as_admin(Method::DELETE, &path, None);
    assert_eq!(world.last().0, 200);
}

#[when("the administrator creates product \"{name}\" in category {category_id}")]
fn the_administrator_creates_product(world: &FlowWorld, name: String, category_id: i32) {
    world.as_admin(
        Method::POST,
        "/api/products",
        Some(json!({"name": name, "price": "9.99", "stock": "1", "category_id": category_id})),
    );
}

#[when("the administrator sets the order status to \"{status}\"")]
fn the_administrator_sets_order_status(world: &FlowWorld, status: String) {
    let order = world.order.borrow().expect("order seeded");
    let path = format!("/api/orders/{order}/status");
    world.as_admin(Method::PUT, &path, Some(json!({"status": status})));
}

#[when("the administrator deletes their own account")]
fn the_administrator_deletes_own_account(world: &FlowWorld) {
    let id = world
        .admin
        .borrow()
        .as_ref()
        .map(|account| account.id)
        .expect("administrator signed in");
    world.as_admin(Method::DELETE, &format!("/api/users/{id}"), None);
}

#[when("the customer lists every order")]
fn the_customer_lists_every_order(world: &FlowWorld) {
    let token = world.customer_token();
    let outcome = world.send(Method::GET, "/api/orders", Some(&token), None);
    *world.last.borrow_mut() = Some(outcome);
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &FlowWorld, status: u16) {
    let (actual, body) = world.last();
    assert_eq!(actual, status, "unexpected body: {body}");
}

#[then("the response reports {count} dependent products")]
fn the_response_reports_dependents(world: &FlowWorld, count: u64) {
    let (_, body) = world.last();
    assert_eq!(body["details"]["productCount"], json!(count));
}

#[then("the response message is \"{message}\"")]
fn the_response_message_is(world: &FlowWorld, message: String) {
    let (_, body) = world.last();
    assert_eq!(body["message"], json!(message));
}

#[then("the catalogue lists {count} products")]
fn the_catalogue_lists_products(world: &FlowWorld, count: u64) {
    let (status, body) = world.send(Method::GET, "/api/products", None, None);
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalCount"], json!(count));
}

#[then("the customer sees the order as \"{status}\" with total {total}")]
fn the_customer_sees_the_order(world: &FlowWorld, status: String, total: f64) {
    let order = world.order.borrow().expect("order seeded");
    let token = world.customer_token();
    let (code, body) = world.send(Method::GET, &format!("/api/orders/{order}"), Some(&token), None);
    assert_eq!(code, 200, "unexpected body: {body}");
    assert_eq!(body["data"]["status"], json!(status));
    assert_eq!(body["data"]["total"].as_f64(), Some(total));
}

#[scenario(
    path = "tests/features/storefront_flows.feature",
    name = "A category in use cannot be deleted"
)]
fn a_category_in_use_cannot_be_deleted(world: FlowWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/storefront_flows.feature",
    name = "A product needs an existing category"
)]
fn a_product_needs_an_existing_category(world: FlowWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/storefront_flows.feature",
    name = "An administrator ships an order"
)]
fn an_administrator_ships_an_order(world: FlowWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/storefront_flows.feature",
    name = "An administrator cannot delete their own account"
)]
fn an_administrator_cannot_delete_their_own_account(world: FlowWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/storefront_flows.feature",
    name = "Customers cannot reach administration endpoints"
)]
fn customers_cannot_reach_administration_endpoints(world: FlowWorld) {
    drop(world);
}
