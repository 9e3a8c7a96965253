//! Error responses for the sonar API.
//!
//! Handlers return [`ApiResult`]. Failures from the arbiter runtime arrive as
//! [`SonarError`] and are mapped onto a status code plus a JSON
//! [`ErrorResponse`] body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sonar_core::SonarError;
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// A failed API request.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400: the request refers to an invalid configuration.
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 409: the trigger is not valid for the mounted root, e.g. showing a
    /// screen while onboarding is still running.
    Conflict {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500: anything else, logged before the response is sent.
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Extra context for the log and the response body.
        details: Option<String>,
    },

    /// 503: the arbiter event loop has stopped or dropped the request.
    ServiceUnavailable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "onboarding_in_progress",
    "message": "Screens can only be shown once onboarding is complete",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code.
    #[schema(example = "onboarding_in_progress")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "Screens can only be shown once onboarding is complete")]
    pub message: String,

    /// Extra context, only set for internal errors.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn into_body(self) -> ErrorResponse {
        match self {
            Self::BadRequest {
                error_code,
                message,
            }
            | Self::Conflict {
                error_code,
                message,
            }
            | Self::ServiceUnavailable {
                error_code,
                message,
            } => ErrorResponse {
                error: error_code,
                message,
                details: None,
            },
            Self::InternalError {
                error_code,
                message,
                details,
            } => ErrorResponse {
                error: error_code,
                message,
                details: details.map(serde_json::Value::String),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "Request failed");
        }
        (status, Json(self.into_body())).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { message, .. } => write!(f, "Bad Request: {message}"),
            Self::Conflict { message, .. } => write!(f, "Conflict: {message}"),
            Self::InternalError { message, .. } => write!(f, "Internal Error: {message}"),
            Self::ServiceUnavailable { message, .. } => {
                write!(f, "Service Unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<SonarError> for ApiError {
    fn from(err: SonarError) -> Self {
        let error_code = err.error_code().to_lowercase();
        let message = err.to_string();
        if err.is_runtime_error() {
            Self::ServiceUnavailable {
                error_code,
                message,
            }
        } else if err.is_config_error() {
            Self::BadRequest {
                error_code,
                message,
            }
        } else {
            Self::InternalError {
                error_code,
                message,
                details: None,
            }
        }
    }
}
