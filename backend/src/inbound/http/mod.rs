//! HTTP inbound adapter exposing the storefront REST API.

pub mod auth;
pub mod auth_config;
pub mod cache_control;
pub mod categories;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod health;
pub mod orders;
pub mod products;
pub mod schemas;
pub mod session;
pub mod site_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod users;
pub mod validation;

use actix_web::web;

use crate::middleware::RateLimit;

pub use error::ApiResult;

/// Register every `/api` endpoint.
///
/// Fixed segments such as `/orders/stats` are registered before their
/// `/{id}` siblings so they are matched first. The whole scope shares the
/// general request quota; credential and product-write routes add their own.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use storefront::inbound::http::configure;
///
/// let app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(RateLimit::api())
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
            .service(auth::sign_up)
            .service(auth::sign_in)
            .service(auth::sign_out)
            .service(auth::me)
            .service(categories::list_categories)
            .service(categories::create_category)
            .service(categories::get_category)
            .service(categories::update_category)
            .service(categories::delete_category)
            .service(uploads::upload_category_image)
            .service(products::list_products)
            .service(products::create_product)
            .service(products::get_product)
            .service(products::update_product)
            .service(products::delete_product)
            .service(uploads::upload_product_image)
            .service(orders::list_orders)
            .service(orders::order_stats)
            .service(orders::get_order)
            .service(orders::update_order_status)
            .service(users::list_users)
            .service(users::user_stats)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user)
            .service(users::user_orders)
            .service(site_config::list_site_config)
            .service(site_config::upsert_site_config)
            .service(site_config::get_site_config)
            .service(site_config::put_site_config)
            .service(site_config::delete_site_config),
    );
}
