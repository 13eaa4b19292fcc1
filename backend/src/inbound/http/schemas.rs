//! OpenAPI schemas for the response envelopes.
//!
//! Handlers write [`super::envelope::Envelope`] and the error adapter writes
//! the failure body; neither is generic over a schema-friendly payload, so
//! these wrappers describe the wire shape for documentation only.

use utoipa::ToSchema;

use crate::domain::ErrorCode;

/// Failure body: `{"success": false, "message", "code", "traceId"?, "details"?}`.
#[derive(ToSchema)]
#[schema(as = FailureEnvelope, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct FailureEnvelopeSchema {
    /// Always `false`.
    #[schema(example = false)]
    success: bool,
    /// Human-readable message.
    #[schema(example = "Categoría no encontrada")]
    message: String,
    /// Stable machine-readable error code.
    code: ErrorCode,
    /// Correlation identifier echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context such as `{field, code, value}`.
    details: Option<serde_json::Value>,
}

/// Success body without a payload.
#[derive(ToSchema)]
#[schema(as = MessageEnvelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct MessageEnvelopeSchema {
    /// Always `true`.
    #[schema(example = true)]
    success: bool,
    #[schema(example = "User signed out successfully")]
    message: String,
}

/// Success body wrapping a payload in `data`.
#[derive(ToSchema)]
#[schema(as = DataEnvelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DataEnvelopeSchema {
    #[schema(example = true)]
    success: bool,
    #[schema(example = "Products retrieved successfully")]
    message: String,
    /// Resource payload; paged lists use `{items, totalCount, currentPage, totalPages}`.
    data: serde_json::Value,
}
