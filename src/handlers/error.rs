//! Error responses for the JSON endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use herakles_load_monitor::MeasurementError;
use tracing::debug;

/// Plain-text error response with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<MeasurementError> for ApiError {
    fn from(err: MeasurementError) -> Self {
        let status = match err {
            MeasurementError::TagNotFound(_) => StatusCode::BAD_REQUEST,
            MeasurementError::UidNotFound(_) => StatusCode::NOT_FOUND,
            MeasurementError::InvalidSetting { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!("Request failed with {}: {}", self.status, self.message);
        (
            self.status,
            [("Content-Type", "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
