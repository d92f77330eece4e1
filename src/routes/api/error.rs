use axum::{
    Json,
    extract::rejection::QueryRejection,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::services::QueryError;

/// Error body returned by every API endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error category: `invalid_request_error` or `server_error`
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    /// Request parameter that caused the error, if any
    pub param: Option<String>,
    /// Machine-readable code, e.g. `invalid_filter_value`
    pub code: Option<String>,
    /// Filled in by the request-id middleware
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// An API failure ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub param: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            param: None,
        }
    }

    pub fn with_param(mut self, param: &'static str) -> Self {
        self.param = Some(param);
        self
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_type = if self.status.is_server_error() {
            "server_error"
        } else {
            "invalid_request_error"
        };
        let body = ErrorResponse {
            error: ErrorInfo {
                error_type: error_type.to_string(),
                message: self.message,
                param: self.param.map(str::to_string),
                code: Some(self.code.to_string()),
                request_id: None,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidFilterValue(e) => {
                let field = e.field;
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_filter_value", e.to_string())
                    .with_param(field)
            }
            QueryError::InvalidPageRequest(e) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_page_request", e.to_string())
            }
            QueryError::StoreUnavailable(e) => {
                tracing::warn!(error = %e, "Record store unavailable");
                ApiError::store_unavailable("Record store is unavailable")
            }
            QueryError::Store(e) => {
                tracing::error!(error = %e, "Record store error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    "Failed to read housekeeping records",
                )
            }
        }
    }
}

/// Malformed query strings, e.g. `page=abc`.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_query_parameters",
            rejection.body_text(),
        )
    }
}
