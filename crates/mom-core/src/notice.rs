//! User-visible notices.
//!
//! Every outcome a user should hear about (a photo ready for analysis, a
//! denied permission, a failed search) is turned into a [`Notice`]. Front
//! ends decide how to show it.

use serde::{Deserialize, Serialize};

use crate::capture::model::CaptureSource;
use crate::error::MomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
    /// Underlying cause, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
            cause: None,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>, cause: Option<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
            cause,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }

    /// A photo is ready for analysis.
    pub fn photo_ready(source: CaptureSource) -> Self {
        let title = match source {
            CaptureSource::Camera => "Photo captured successfully",
            CaptureSource::Gallery => "Photo selected successfully",
        };
        Self::info(title, "Your skin photo is ready for analysis.")
    }

    /// Any capture failure, collapsed to one notice per source.
    pub fn capture_failed(source: CaptureSource, err: &MomError) -> Self {
        let (title, description) = match source {
            CaptureSource::Camera => ("Camera error", "Unable to capture photo. Please try again."),
            CaptureSource::Gallery => ("Gallery error", "Unable to select photo. Please try again."),
        };
        Self::error(title, description, Some(err.to_string()))
    }

    pub fn location_found() -> Self {
        Self::info("Location Found", "Successfully found your current location.")
    }

    /// Notice for a failed locator or analysis step.
    pub fn from_error(err: &MomError) -> Self {
        let cause = Some(err.to_string());
        match err {
            MomError::MissingCredential(_) => Self::error(
                "API Key Required",
                "Please enter your Google Maps API key to search for healthcare providers.",
                cause,
            ),
            MomError::PermissionDenied(_) => Self::error(
                "Location Permission Required",
                "Please enable location access to find nearby healthcare providers.",
                cause,
            ),
            MomError::Timeout(_) | MomError::DeviceUnavailable(_) => Self::error(
                "Location Error",
                "Unable to get your current location. Please check your location settings.",
                cause,
            ),
            MomError::ServiceUnavailable(_) | MomError::Http(_) => Self::error(
                "Search Error",
                "Unable to reach the places service. Please check your API key.",
                cause,
            ),
            MomError::UserCancelled => Self::info("Cancelled", "The action was cancelled."),
            MomError::UnknownScan(_) => Self::error("Scan Not Found", "This scan no longer exists.", cause),
            MomError::InvalidImage(_) => Self::error(
                "Invalid Image",
                "The photo could not be read. Please try another one.",
                cause,
            ),
            _ => Self::error("Something went wrong", "Please try again.", cause),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
