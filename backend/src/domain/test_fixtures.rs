//! Builders shared by domain service tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use super::{
    Category, CategoryId, CategoryName, EmailAddress, Order, OrderCustomer, OrderId, OrderItem,
    OrderStatus, PasswordHash, Price, Product, ProductId, ProductName, Role, Stock, User, UserId,
    UserName,
};

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
        .single()
        .expect("valid fixed timestamp")
}

pub(crate) fn user(id: i32, email: &str, role: Role) -> User {
    User {
        id: UserId::new(id),
        name: UserName::new("Ada Lovelace").expect("valid name"),
        email: EmailAddress::new(email).expect("valid email"),
        password_hash: PasswordHash::new("$argon2id$stub"),
        role,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub(crate) fn category(id: i32, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: CategoryName::new(name).expect("valid name"),
        description: String::new(),
        image: None,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub(crate) fn product(id: i32, category_id: i32) -> Product {
    Product {
        id: ProductId::new(id),
        name: ProductName::new("Trail Shoe").expect("valid name"),
        description: String::new(),
        price: Price::new(Decimal::new(4999, 2)).expect("valid price"),
        stock: Stock::new(3).expect("valid stock"),
        image: None,
        category_id: CategoryId::new(category_id),
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

pub(crate) fn order(id: i32, user_id: i32, lines: &[(i64, i32)]) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: UserId::new(user_id),
        status: OrderStatus::Pending,
        created_at: fixed_now(),
        updated_at: fixed_now(),
        customer: OrderCustomer {
            name: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
        },
        items: lines
            .iter()
            .enumerate()
            .map(|(index, (cents, quantity))| OrderItem {
                id: i32::try_from(index).expect("small index") + 1,
                product_id: ProductId::new(1),
                quantity: *quantity,
                price: Decimal::new(*cents, 2),
                product_name: "Trail Shoe".to_owned(),
                product_image: None,
            })
            .collect(),
        payment: None,
    }
}
