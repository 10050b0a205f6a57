//! Mapping core errors to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mom_core::notice::Notice;
use mom_core::MomError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    Core(MomError),
    /// The resource exists but is not ready yet.
    NotReady(String),
    /// The request body could not be read as the expected JSON.
    Rejected(JsonRejection),
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    notice: Notice,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<MomError> for ApiError {
    fn from(err: MomError) -> Self {
        Self::Core(err)
    }
}

pub fn status_for(err: &MomError) -> StatusCode {
    match err {
        MomError::MissingCredential(_) => StatusCode::UNAUTHORIZED,
        MomError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        MomError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        MomError::ServiceUnavailable(_) | MomError::Http(_) => StatusCode::BAD_GATEWAY,
        MomError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        MomError::UnknownScan(_) => StatusCode::NOT_FOUND,
        MomError::InvalidImage(_) | MomError::ValidationError(_) | MomError::Json(_) => {
            StatusCode::BAD_REQUEST
        }
        MomError::CaptureInProgress => StatusCode::CONFLICT,
        MomError::UserCancelled => StatusCode::GONE,
        MomError::Config(_) | MomError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Core(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::warn!(error = %err, "Request failed");
                } else {
                    tracing::debug!(error = %err, "Request rejected");
                }
                // The cause stays in the server log only.
                let mut notice = Notice::from_error(&err);
                notice.cause = None;
                let body = ErrorBody {
                    kind: err.kind(),
                    notice,
                };
                (status, Json(body)).into_response()
            }
            Self::NotReady(msg) => {
                let body = ErrorBody {
                    kind: "not_ready",
                    notice: Notice::info("Analysis in progress", msg),
                };
                (StatusCode::CONFLICT, Json(body)).into_response()
            }
            Self::Rejected(rejection) => {
                let status = rejection.status();
                tracing::debug!(status = %status, error = %rejection.body_text(), "Request body rejected");
                let notice = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    Notice::error(
                        "Photo too large",
                        "This photo is too large to upload. Please choose a smaller one.",
                        None,
                    )
                } else {
                    Notice::error("Invalid request", rejection.body_text(), None)
                };
                let body = ErrorBody {
                    kind: if status == StatusCode::PAYLOAD_TOO_LARGE {
                        "payload_too_large"
                    } else {
                        "invalid_request"
                    },
                    notice,
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
