use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of a request handled by this service, mapped onto an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{service} request failed")]
    Upstream {
        service: &'static str,
        details: String,
    },

    #[error("{service} did not respond in time")]
    UpstreamTimeout {
        service: &'static str,
        details: String,
    },

    #[error("{service} response is missing required data")]
    DataExtraction {
        service: &'static str,
        details: String,
    },

    #[error("simulation exceeded the request time limit")]
    RequestTimeout { limit_secs: u64 },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout { .. } | ApiError::RequestTimeout { .. } => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::DataExtraction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::Validation(_) | ApiError::NotFound(_) => None,
            ApiError::Upstream { details, .. }
            | ApiError::UpstreamTimeout { details, .. }
            | ApiError::DataExtraction { details, .. } => Some(details.clone()),
            ApiError::RequestTimeout { limit_secs } => {
                Some(format!("limit is {limit_secs}s"))
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            details: self.details(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, details = ?self.details(), "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
