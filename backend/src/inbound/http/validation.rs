//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use pagination::{PageRequest, PageRequestError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::domain::{Error, ParseIdError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    NotPositive,
    InvalidId,
    InvalidNumber,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::NotPositive => "not_positive",
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::InvalidNumber => "invalid_number",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName, message: &str) -> Error {
    ValidationError::new(field.as_str(), message).with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_field_error(field: FieldName, message: impl Into<String>) -> Error {
    ValidationError::new(field.as_str(), message).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn invalid_number_error(field: FieldName, message: &str, value: &str) -> Error {
    ValidationError::new(field.as_str(), message).with_value(ErrorCode::InvalidNumber, value)
}

/// `page` and `limit` query parameters accepted by every list endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// One-based page number (default 1).
    #[param(example = "1")]
    pub page: Option<String>,
    /// Items per page (default 10, capped at 100).
    #[param(example = "10")]
    pub limit: Option<String>,
}

impl PageQuery {
    /// Validate into a [`PageRequest`].
    pub(crate) fn to_request(&self) -> Result<PageRequest, Error> {
        PageRequest::parse(self.page.as_deref(), self.limit.as_deref()).map_err(page_error)
    }
}

fn page_error(err: PageRequestError) -> Error {
    let field = err.field().as_str();
    ValidationError::new(field, err.to_string()).with_value(ErrorCode::NotPositive, err.value())
}

/// Parse a path identifier, answering `message` when it is not a positive integer.
pub(crate) fn parse_id<T>(raw: &str, message: &'static str) -> Result<T, Error>
where
    T: FromStr<Err = ParseIdError>,
{
    raw.parse::<T>().map_err(|err| {
        ValidationError::new("id", message).with_value(ErrorCode::InvalidId, err.value())
    })
}

/// JSON field accepting either a number or numeric text, as form posts send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    /// Native JSON number.
    Number(serde_json::Number),
    /// Number encoded as a string.
    Text(String),
}

impl NumericInput {
    fn raw(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.trim().to_owned(),
        }
    }

    /// Value as a decimal, if it parses as one.
    pub(crate) fn to_decimal(&self) -> Option<Decimal> {
        let raw = self.raw();
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .ok()
    }

    /// Value as a whole number, if it is one and fits in 32 bits.
    pub(crate) fn to_integer(&self) -> Option<i32> {
        let value = self.to_decimal()?;
        if !value.fract().is_zero() {
            return None;
        }
        value.to_i32()
    }

    /// Raw text for error details.
    pub(crate) fn describe(&self) -> String {
        self.raw()
    }
}
