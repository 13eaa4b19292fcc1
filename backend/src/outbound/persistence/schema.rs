//! Diesel table definitions matching `backend/migrations`.

diesel::table! {
    /// Customer and administrator accounts.
    users (id) {
        id -> Int4,
        name -> Varchar,
        /// Lower-cased; unique.
        email -> Varchar,
        password_hash -> Varchar,
        /// `user` or `admin`.
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Product categories; `name` is unique.
    categories (id) {
        id -> Int4,
        name -> Varchar,
        description -> Text,
        image -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Catalogue products.
    products (id) {
        id -> Int4,
        name -> Varchar,
        description -> Text,
        price -> Numeric,
        stock -> Int4,
        image -> Nullable<Text>,
        /// Restricts category deletion.
        category_id -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Orders placed by customers.
    orders (id) {
        id -> Int4,
        user_id -> Int4,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Line items captured at purchase time.
    order_items (id) {
        id -> Int4,
        order_id -> Int4,
        product_id -> Int4,
        quantity -> Int4,
        price -> Numeric,
    }
}

diesel::table! {
    /// At most one payment per order.
    payments (id) {
        id -> Int4,
        order_id -> Int4,
        amount -> Numeric,
        method -> Varchar,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Typed key/value site settings.
    site_configs (key) {
        key -> Varchar,
        config_type -> Varchar,
        value -> Text,
        label -> Nullable<Varchar>,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(products -> categories (category_id));
diesel::joinable!(orders -> users (user_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_items -> products (product_id));
diesel::joinable!(payments -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    categories,
    products,
    orders,
    order_items,
    payments,
    site_configs,
);
