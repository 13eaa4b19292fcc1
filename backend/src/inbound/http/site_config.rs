//! Site configuration handlers.
//!
//! ```text
//! GET    /api/site-config
//! GET    /api/site-config/{key}
//! POST   /api/site-config        {"key":"primary_color","type":"color","value":"#ff6600"}
//! PUT    /api/site-config/{key}  {"type":"boolean","value":true}
//! DELETE /api/site-config/{key}
//! ```
//!
//! Reads are public so storefront clients can theme themselves before
//! signing in.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{ConfigKey, ConfigType, Error, SiteConfigUpsert};

use super::ApiResult;
use super::dto::SiteConfigResponse;
use super::envelope;
use super::schemas::{FailureEnvelopeSchema, MessageEnvelopeSchema};
use super::session::AdminUser;
use super::state::HttpState;
use super::validation::{FieldName, invalid_field_error, missing_field_error};

const REQUIRED_MESSAGE: &str = "La clave, el tipo y el valor son obligatorios";
const SAVED_MESSAGE: &str = "Configuración guardada";

fn config_key(raw: &str) -> Result<ConfigKey, Error> {
    ConfigKey::new(raw).map_err(|err| invalid_field_error(FieldName::new("key"), err.to_string()))
}

/// Body for `POST /api/site-config` and `PUT /api/site-config/{key}`.
///
/// `key` is ignored on `PUT`, where the path names the entry. `value` may be
/// sent as a JSON string, number or boolean.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SiteConfigRequest {
    #[schema(example = "primary_color")]
    pub key: Option<String>,
    /// One of `text`, `image`, `color`, `boolean`, `number`, `url`, `date`.
    #[serde(rename = "type")]
    #[schema(example = "color")]
    pub config_type: Option<String>,
    #[schema(value_type = Option<String>, example = "#ff6600")]
    pub value: Option<Value>,
    pub label: Option<String>,
    pub description: Option<String>,
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl SiteConfigRequest {
    fn into_upsert(self, key: ConfigKey) -> Result<SiteConfigUpsert, Error> {
        let raw_type = self
            .config_type
            .ok_or_else(|| missing_field_error(FieldName::new("type"), REQUIRED_MESSAGE))?;
        let value = self
            .value
            .and_then(value_text)
            .ok_or_else(|| missing_field_error(FieldName::new("value"), REQUIRED_MESSAGE))?;
        let config_type = ConfigType::parse(&raw_type)
            .map_err(|err| invalid_field_error(FieldName::new("type"), err.to_string()))?;
        SiteConfigUpsert::new(key, config_type, value, self.label, self.description)
            .map_err(|err| invalid_field_error(FieldName::new("value"), err.to_string()))
    }
}

/// Every entry, ordered by key.
#[utoipa::path(
    get,
    path = "/api/site-config",
    responses(
        (status = 200, description = "Configuration entries", body = [SiteConfigResponse])
    ),
    tags = ["site-config"],
    operation_id = "listSiteConfig",
    security([])
)]
#[get("/site-config")]
pub async fn list_site_config(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let entries: Vec<SiteConfigResponse> = state
        .site_config
        .list()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(envelope::ok("Configuraciones obtenidas correctamente", entries))
}

/// One entry by key.
#[utoipa::path(
    get,
    path = "/api/site-config/{key}",
    params(("key" = String, Path, description = "Configuration key")),
    responses(
        (status = 200, description = "Configuration entry", body = SiteConfigResponse),
        (status = 400, description = "Invalid key", body = FailureEnvelopeSchema),
        (status = 404, description = "Configuration not found", body = FailureEnvelopeSchema)
    ),
    tags = ["site-config"],
    operation_id = "getSiteConfig",
    security([])
)]
#[get("/site-config/{key}")]
pub async fn get_site_config(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = config_key(&path)?;
    let entry = state.site_config.get(&key).await?;
    Ok(envelope::ok(
        "Configuración obtenida correctamente",
        SiteConfigResponse::from(entry),
    ))
}

/// Create or replace the entry named in the body.
#[utoipa::path(
    post,
    path = "/api/site-config",
    request_body = SiteConfigRequest,
    responses(
        (status = 200, description = "Configuration saved", body = SiteConfigResponse),
        (status = 400, description = "Missing or invalid fields", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["site-config"],
    operation_id = "upsertSiteConfig"
)]
#[post("/site-config")]
pub async fn upsert_site_config(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    payload: web::Json<SiteConfigRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let raw_key = request
        .key
        .clone()
        .ok_or_else(|| missing_field_error(FieldName::new("key"), REQUIRED_MESSAGE))?;
    let upsert = request.into_upsert(config_key(&raw_key)?)?;
    let entry = state.site_config.upsert(upsert).await?;
    Ok(envelope::ok(SAVED_MESSAGE, SiteConfigResponse::from(entry)))
}

/// Create or replace the entry named in the path.
#[utoipa::path(
    put,
    path = "/api/site-config/{key}",
    params(("key" = String, Path, description = "Configuration key")),
    request_body = SiteConfigRequest,
    responses(
        (status = 200, description = "Configuration saved", body = SiteConfigResponse),
        (status = 400, description = "Missing or invalid fields", body = FailureEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema)
    ),
    tags = ["site-config"],
    operation_id = "putSiteConfig"
)]
#[put("/site-config/{key}")]
pub async fn put_site_config(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<SiteConfigRequest>,
) -> ApiResult<HttpResponse> {
    let key = config_key(&path)?;
    let upsert = payload.into_inner().into_upsert(key)?;
    let entry = state.site_config.upsert(upsert).await?;
    Ok(envelope::ok(SAVED_MESSAGE, SiteConfigResponse::from(entry)))
}

/// Delete an entry.
#[utoipa::path(
    delete,
    path = "/api/site-config/{key}",
    params(("key" = String, Path, description = "Configuration key")),
    responses(
        (status = 200, description = "Configuration deleted", body = MessageEnvelopeSchema),
        (status = 403, description = "Admin role required", body = FailureEnvelopeSchema),
        (status = 404, description = "Configuration not found", body = FailureEnvelopeSchema)
    ),
    tags = ["site-config"],
    operation_id = "deleteSiteConfig"
)]
#[delete("/site-config/{key}")]
pub async fn delete_site_config(
    _admin: AdminUser,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = config_key(&path)?;
    state.site_config.delete(&key).await?;
    Ok(envelope::done("Configuración eliminada exitosamente"))
}
