//! Centralized error types for MOM.

use thiserror::Error;

/// Main error type for MOM operations.
///
/// Every variant is terminal for the attempt that produced it. Nothing in the
/// workspace retries on its own; the user re-invokes the action instead.
#[derive(Error, Debug)]
pub enum MomError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("A capture is already in progress")]
    CaptureInProgress,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Scan not found: {0}")]
    UnknownScan(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Never carries the request URL, which holds the places key.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

/// Result type for MOM operations.
pub type MomResult<T> = Result<T, MomError>;

impl MomError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a service unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::Timeout(_) => "timeout",
            Self::ServiceUnavailable(_) | Self::Http(_) => "service_unavailable",
            Self::UserCancelled => "user_cancelled",
            Self::MissingCredential(_) => "missing_credential",
            Self::DeviceUnavailable(_) => "device_unavailable",
            Self::CaptureInProgress => "capture_in_progress",
            Self::InvalidImage(_) => "invalid_image",
            Self::UnknownScan(_) => "unknown_scan",
            Self::ValidationError(_) => "validation",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

impl From<reqwest::Error> for MomError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl From<image::ImageError> for MomError {
    fn from(err: image::ImageError) -> Self {
        Self::InvalidImage(err.to_string())
    }
}

impl From<base64::DecodeError> for MomError {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidImage(err.to_string())
    }
}
