//! Constraint and ordering coverage for the in-memory store.

use chrono::{Local, TimeZone};
use rstest::{fixture, rstest};
use rust_decimal::Decimal;

use super::*;
use crate::domain::ports::{
    CategoryRepository, CategoryRepositoryError, OrderRepository, ProductRepository,
    ProductRepositoryError, SiteConfigRepository, UserRepository, UserRepositoryError,
};
use crate::domain::{
    CategoryChanges, CategoryName, ConfigType, EmailAddress, NewCategory, NewProduct, NewUser,
    OrderFilter, PasswordHash, Price, ProductFilter, ProductName, Role, SiteConfigUpsert, Stock,
    TimeWindow, UserChanges, UserName,
};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn store() -> InMemoryStore {
    InMemoryStore::with_clock(Arc::new(FixedClock(at(15))))
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: UserName::new("Grace Hopper").expect("valid name"),
        email: EmailAddress::new(email).expect("valid email"),
        password_hash: PasswordHash::new("$argon2id$stub"),
        role: Role::User,
    }
}

fn new_category(name: &str) -> NewCategory {
    NewCategory {
        name: CategoryName::new(name).expect("valid name"),
        description: String::new(),
        image: None,
    }
}

fn new_product(name: &str, category_id: CategoryId, cents: i64) -> NewProduct {
    NewProduct {
        name: ProductName::new(name).expect("valid name"),
        description: String::new(),
        price: Price::new(Decimal::new(cents, 2)).expect("valid price"),
        stock: Stock::new(5).expect("valid stock"),
        image: None,
        category_id,
    }
}

async fn seeded_product(store: &InMemoryStore) -> (CategoryId, Product) {
    let category = CategoryRepository::create(store, new_category("Lámparas"))
        .await
        .expect("category stored");
    let product = ProductRepository::create(store, new_product("Lamp", category.id, 2_500))
        .await
        .expect("product stored");
    (category.id, product)
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(store: InMemoryStore) {
    UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("first insert");
    let err = UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect_err("duplicate");
    assert_eq!(err, UserRepositoryError::duplicate_email("a@example.com"));
}

#[rstest]
#[tokio::test]
async fn email_updates_respect_uniqueness(store: InMemoryStore) {
    UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("first insert");
    let second = UserRepository::create(&store, new_user("b@example.com"))
        .await
        .expect("second insert");
    let changes = UserChanges {
        email: Some(EmailAddress::new("a@example.com").expect("valid email")),
        ..UserChanges::default()
    };
    let err = UserRepository::update(&store, second.id, changes)
        .await
        .expect_err("duplicate");
    assert!(matches!(err, UserRepositoryError::DuplicateEmail { .. }));
}

#[rstest]
#[tokio::test]
async fn categories_list_by_name_with_counts(store: InMemoryStore) {
    let zapatos = CategoryRepository::create(&store, new_category("Zapatos"))
        .await
        .expect("stored");
    CategoryRepository::create(&store, new_category("Abrigos"))
        .await
        .expect("stored");
    ProductRepository::create(&store, new_product("Boot", zapatos.id, 9_900))
        .await
        .expect("stored");

    let page = CategoryRepository::list(&store, PageRequest::default())
        .await
        .expect("listed");
    let names: Vec<(&str, u64)> = page
        .items()
        .iter()
        .map(|row| (row.category.name.as_str(), row.product_count))
        .collect();
    assert_eq!(names, vec![("Abrigos", 0), ("Zapatos", 1)]);
}

#[rstest]
#[tokio::test]
async fn categories_with_products_cannot_be_deleted(store: InMemoryStore) {
    let (category_id, _) = seeded_product(&store).await;
    let err = CategoryRepository::delete(&store, category_id)
        .await
        .expect_err("restricted");
    assert_eq!(err, CategoryRepositoryError::in_use(1_u64));
}

#[rstest]
#[tokio::test]
async fn renaming_onto_an_existing_category_fails(store: InMemoryStore) {
    CategoryRepository::create(&store, new_category("Abrigos"))
        .await
        .expect("stored");
    let other = CategoryRepository::create(&store, new_category("Zapatos"))
        .await
        .expect("stored");
    let changes = CategoryChanges {
        name: Some(CategoryName::new("Abrigos").expect("valid name")),
        ..CategoryChanges::default()
    };
    let err = CategoryRepository::update(&store, other.id, changes)
        .await
        .expect_err("duplicate");
    assert!(matches!(err, CategoryRepositoryError::DuplicateName { .. }));
}

#[rstest]
#[tokio::test]
async fn products_require_an_existing_category(store: InMemoryStore) {
    let err = ProductRepository::create(&store, new_product("Lamp", CategoryId::new(42), 100))
        .await
        .expect_err("dangling category");
    assert_eq!(err, ProductRepositoryError::missing_category(42));
}

#[rstest]
#[tokio::test]
async fn product_search_is_case_insensitive(store: InMemoryStore) {
    let (category_id, _) = seeded_product(&store).await;
    ProductRepository::create(&store, new_product("Desk", category_id, 10_000))
        .await
        .expect("stored");

    let filter = ProductFilter::new(None, Some("LAM".to_owned()));
    let page = ProductRepository::list(&store, filter, PageRequest::default())
        .await
        .expect("listed");
    assert_eq!(page.total_count(), 1);
    let first = page.items().first().expect("one match");
    assert_eq!(first.category.name.as_str(), "Lámparas");
}

#[rstest]
#[tokio::test]
async fn ordered_products_are_protected(store: InMemoryStore) {
    let (_, product) = seeded_product(&store).await;
    let user = UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("stored");
    store
        .seed_order(user.id, &[(product.id, 2)], at(10))
        .expect("seeded");

    let err = ProductRepository::delete(&store, product.id)
        .await
        .expect_err("referenced");
    assert_eq!(err, ProductRepositoryError::referenced());
}

#[rstest]
#[tokio::test]
async fn orders_join_customer_and_products(store: InMemoryStore) {
    let (_, product) = seeded_product(&store).await;
    let user = UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("stored");
    let order_id = store
        .seed_order(user.id, &[(product.id, 2)], at(10))
        .expect("seeded");
    store
        .seed_payment(order_id, "card", "completed")
        .expect("paid");

    let order = OrderRepository::find_by_id(&store, order_id)
        .await
        .expect("read")
        .expect("present");
    assert_eq!(order.customer.email, "a@example.com");
    assert_eq!(order.total(), Decimal::new(5_000, 2));
    let item = order.items.first().expect("one line");
    assert_eq!(item.product_name, "Lamp");
    let payment = order.payment.expect("payment attached");
    assert_eq!(payment.amount, Decimal::new(5_000, 2));
}

#[rstest]
#[tokio::test]
async fn orders_list_newest_first_and_filter(store: InMemoryStore) {
    let (_, product) = seeded_product(&store).await;
    let user = UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("stored");
    let older = store
        .seed_order(user.id, &[(product.id, 1)], at(1))
        .expect("seeded");
    let newer = store
        .seed_order(user.id, &[(product.id, 1)], at(12))
        .expect("seeded");
    OrderRepository::update_status(&store, older, OrderStatus::Shipped)
        .await
        .expect("updated");

    let all = OrderRepository::list(&store, OrderFilter::default(), PageRequest::default())
        .await
        .expect("listed");
    let ids: Vec<OrderId> = all.items().iter().map(|order| order.id).collect();
    assert_eq!(ids, vec![newer, older]);

    let shipped = OrderFilter {
        status: Some(OrderStatus::Shipped),
        user_id: None,
    };
    let page = OrderRepository::list(&store, shipped, PageRequest::default())
        .await
        .expect("listed");
    assert_eq!(page.total_count(), 1);
    assert_eq!(
        OrderRepository::revenue(&store).await.expect("revenue"),
        Decimal::new(5_000, 2)
    );
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_cascades_to_orders(store: InMemoryStore) {
    let (_, product) = seeded_product(&store).await;
    let user = UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("stored");
    store
        .seed_order(user.id, &[(product.id, 1)], at(3))
        .expect("seeded");

    assert!(UserRepository::delete(&store, user.id).await.expect("deleted"));
    assert_eq!(OrderRepository::count(&store).await.expect("count"), 0);
    assert!(ProductRepository::delete(&store, product.id).await.expect("deleted"));
}

#[rstest]
#[tokio::test]
async fn users_created_in_window_use_the_clock(store: InMemoryStore) {
    UserRepository::create(&store, new_user("a@example.com"))
        .await
        .expect("stored");
    let march = TimeWindow {
        start: at(1),
        end: None,
    };
    let february = TimeWindow {
        start: at(1) - chrono::Duration::days(29),
        end: Some(at(1)),
    };
    assert_eq!(
        UserRepository::count_created_in(&store, march).await.expect("count"),
        1
    );
    assert_eq!(
        UserRepository::count_created_in(&store, february)
            .await
            .expect("count"),
        0
    );
}

#[rstest]
#[tokio::test]
async fn site_config_upsert_keeps_creation_time(store: InMemoryStore) {
    let key = ConfigKey::new("store.name").expect("valid key");
    let first = SiteConfigUpsert::new(key.clone(), ConfigType::Text, "Tienda".to_owned(), None, None)
        .expect("valid entry");
    let stored = SiteConfigRepository::upsert(&store, first)
        .await
        .expect("stored");
    let second = SiteConfigUpsert::new(key.clone(), ConfigType::Text, "Otra".to_owned(), None, None)
        .expect("valid entry");
    let replaced = SiteConfigRepository::upsert(&store, second)
        .await
        .expect("stored");

    assert_eq!(replaced.value, "Otra");
    assert_eq!(replaced.created_at, stored.created_at);
    assert_eq!(SiteConfigRepository::list(&store).await.expect("listed").len(), 1);
    assert!(SiteConfigRepository::delete(&store, &key).await.expect("deleted"));
}

#[rstest]
fn seeding_rejects_unknown_users(store: InMemoryStore) {
    let err = store
        .seed_order(UserId::new(1), &[], at(1))
        .expect_err("unknown user");
    assert_eq!(err, SeedError::MissingUser(UserId::new(1)));
}
