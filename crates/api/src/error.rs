//! API error types with the HTTP error envelope.
//!
//! Every failure renders as `{ "success": false, "statusCode": N,
//! "message": "..." }`; some rejections carry extra fields the client can
//! act on (`available` for stock, `from`/`to` for status edges).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use queries::QueryError;

use crate::collab::{BlobError, PaymentError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Fulfillment-core rejection.
    Domain(DomainError),
    /// Read-side query failure.
    Query(QueryError),
    /// Payment collaborator failure.
    Payment(PaymentError),
    /// Blob store failure.
    Blob(BlobError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, extra) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Query(err) => query_error_to_response(err),
            ApiError::Payment(err) => match err {
                PaymentError::Declined(_) => {
                    (StatusCode::PAYMENT_REQUIRED, err.to_string(), None)
                }
                PaymentError::Unavailable(_) => {
                    tracing::error!(error = %err, "payment gateway unavailable");
                    (StatusCode::BAD_GATEWAY, "payment gateway unavailable".to_string(), None)
                }
            },
            ApiError::Blob(err) => {
                tracing::error!(error = %err, "blob store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let mut body = serde_json::json!({
            "success": false,
            "statusCode": status.as_u16(),
            "message": message,
        });
        if let (Some(obj), Some(serde_json::Value::Object(extra))) = (body.as_object_mut(), extra)
        {
            obj.extend(extra);
        }

        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String, Option<serde_json::Value>) {
    match &err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string(), None),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string(), None),
        DomainError::BranchMismatch { .. } | DomainError::Precondition(_) => {
            (StatusCode::CONFLICT, err.to_string(), None)
        }
        DomainError::InsufficientStock { available, .. } => (
            StatusCode::CONFLICT,
            err.to_string(),
            Some(serde_json::json!({ "available": available })),
        ),
        DomainError::IllegalTransition { from, to } => (
            StatusCode::CONFLICT,
            err.to_string(),
            Some(serde_json::json!({ "from": from, "to": to })),
        ),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, err.to_string(), None),
        DomainError::Store(_) => {
            tracing::error!(error = %err, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
                None,
            )
        }
    }
}

fn query_error_to_response(err: QueryError) -> (StatusCode, String, Option<serde_json::Value>) {
    match &err {
        QueryError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string(), None),
        QueryError::Store(_) | QueryError::Corrupt(_) => {
            tracing::error!(error = %err, "query failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
                None,
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        ApiError::Blob(err)
    }
}
