//! Success envelope shared by every JSON endpoint.
//!
//! Bodies take the shape `{"success": true, "message", "data"?}`; failures
//! are rendered by the [`crate::inbound::http::error`] adapter.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use super::cache_control::private_no_cache_header;

/// Success body written by handlers.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap `data` with a confirmation message.
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Confirmation without a payload.
    pub fn message(message: &'static str) -> Self {
        Self {
            success: true,
            message,
            data: None,
        }
    }
}

fn respond<T: Serialize>(status: StatusCode, envelope: &Envelope<T>) -> HttpResponse {
    HttpResponse::build(status).json(envelope)
}

/// `200 OK` with `data`.
pub fn ok<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    respond(StatusCode::OK, &Envelope::new(message, data))
}

/// `201 Created` with `data`.
pub fn created<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    respond(StatusCode::CREATED, &Envelope::new(message, data))
}

/// `200 OK` without a payload.
pub fn done(message: &'static str) -> HttpResponse {
    respond(StatusCode::OK, &Envelope::message(message))
}

/// `200 OK` with `data`, marked non-cacheable for shared caches.
///
/// Used for account-specific payloads such as profiles and order history.
pub fn private<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(Envelope::new(message, data))
}
