//! Capture domain models.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::CaptureConfig;
use crate::error::{MomError, MomResult};

/// Where the still comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    Camera,
    Gallery,
}

impl CaptureSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Gallery => "gallery",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Gallery => "Gallery",
        }
    }
}

/// Crop rectangle applied as the user-side edit before the image is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FromStr for CropRect {
    type Err = MomError;

    /// Parse `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| MomError::validation(format!("invalid crop '{s}', expected x,y,w,h")))?;

        match parts.as_slice() {
            [x, y, width, height] if *width > 0 && *height > 0 => Ok(Self {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => Err(MomError::validation(format!(
                "invalid crop '{s}', expected x,y,w,h with non-zero size"
            ))),
        }
    }
}

/// Options passed to the picker and to the re-encode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub quality: u8,
    pub allow_editing: bool,
    pub crop: Option<CropRect>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: 90,
            allow_editing: true,
            crop: None,
        }
    }
}

impl From<&CaptureConfig> for CaptureOptions {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            quality: config.quality,
            allow_editing: config.allow_editing,
            crop: None,
        }
    }
}

/// An encoded still held in memory as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub data_url: String,
    pub mime_type: String,
    pub source: CaptureSource,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    /// Build a JPEG data URL from encoded bytes.
    pub fn jpeg(bytes: &[u8], source: CaptureSource, width: u32, height: u32) -> Self {
        Self {
            data_url: format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)),
            mime_type: "image/jpeg".to_string(),
            source,
            width,
            height,
        }
    }

    /// Decoded image bytes.
    pub fn bytes(&self) -> MomResult<Vec<u8>> {
        let (_, payload) = split_data_url(&self.data_url)?;
        Ok(STANDARD.decode(payload)?)
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data_url.len()
    }
}

/// Decode a base64 `data:image/...` URL sent by a client that captured the
/// photo itself. The bytes still go through [`encode_still`](super::encode_still).
pub fn decode_data_url(data_url: &str) -> MomResult<Vec<u8>> {
    let (_, payload) = split_data_url(data_url)?;
    Ok(STANDARD.decode(payload)?)
}

fn split_data_url(data_url: &str) -> MomResult<(&str, &str)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| MomError::InvalidImage("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| MomError::InvalidImage("data URL has no payload".into()))?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| MomError::InvalidImage("data URL is not base64 encoded".into()))?;

    if !mime_type.starts_with("image/") {
        return Err(MomError::InvalidImage(format!("unsupported media type '{mime_type}'")));
    }
    Ok((mime_type, payload))
}
