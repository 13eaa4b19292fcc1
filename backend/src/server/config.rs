//! HTTP server configuration object.

use actix_web::web;

use storefront::inbound::http::state::HttpState;

/// Everything [`super::create_server`] needs besides the health state.
pub struct ServerConfig {
    pub(crate) http_state: web::Data<HttpState>,
    pub(crate) frontend_origin: String,
    pub(crate) bind_addr: (String, u16),
}

impl ServerConfig {
    /// Configuration serving `http_state` to browsers on `frontend_origin`.
    #[must_use]
    pub fn new(
        http_state: web::Data<HttpState>,
        frontend_origin: String,
        bind_addr: (String, u16),
    ) -> Self {
        Self {
            http_state,
            frontend_origin,
            bind_addr,
        }
    }
}
