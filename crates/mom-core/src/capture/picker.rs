//! Platform pickers that hand back raw encoded stills.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::model::{CaptureOptions, CaptureSource};
use crate::error::{MomError, MomResult};

/// The camera/gallery surface.
#[async_trait]
pub trait PhotoPicker: Send + Sync {
    /// Return the encoded bytes of one still, or the reason there is none.
    async fn get_photo(&self, source: CaptureSource, options: &CaptureOptions) -> MomResult<Vec<u8>>;
}

/// Picker backed by the local machine.
///
/// The gallery is a file chosen by the user; the camera is an external
/// command that writes a still to stdout.
#[derive(Debug, Clone, Default)]
pub struct DevicePicker {
    camera_command: Option<String>,
    gallery_file: Option<PathBuf>,
    camera_timeout: Option<Duration>,
}

impl DevicePicker {
    pub fn new(camera_command: Option<String>) -> Self {
        Self {
            camera_command: camera_command.filter(|c| !c.trim().is_empty()),
            gallery_file: None,
            camera_timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn with_gallery_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.gallery_file = Some(path.into());
        self
    }

    pub fn with_camera_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.camera_timeout = timeout;
        self
    }

    async fn read_gallery(&self) -> MomResult<Vec<u8>> {
        let path = self.gallery_file.as_ref().ok_or(MomError::UserCancelled)?;
        debug!(path = %path.display(), "Reading photo from gallery");

        tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                MomError::PermissionDenied(format!("cannot read {}", path.display()))
            }
            std::io::ErrorKind::NotFound => {
                MomError::DeviceUnavailable(format!("{} does not exist", path.display()))
            }
            _ => MomError::Io(e),
        })
    }

    async fn run_camera(&self) -> MomResult<Vec<u8>> {
        let command = self
            .camera_command
            .as_deref()
            .ok_or_else(|| MomError::DeviceUnavailable("no camera command configured".into()))?;
        debug!(command = %command, "Running camera command");

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    MomError::PermissionDenied(format!("camera command: {e}"))
                }
                _ => MomError::DeviceUnavailable(format!("camera command failed to start: {e}")),
            })?;

        let output = match self.camera_timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| MomError::Timeout(limit.as_millis() as u64))??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Camera command failed");
            if stderr.to_lowercase().contains("permission denied") {
                return Err(MomError::PermissionDenied("camera access denied".into()));
            }
            return Err(MomError::DeviceUnavailable(format!(
                "camera command exited with {}",
                output.status
            )));
        }

        if output.stdout.is_empty() {
            return Err(MomError::UserCancelled);
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl PhotoPicker for DevicePicker {
    async fn get_photo(&self, source: CaptureSource, _options: &CaptureOptions) -> MomResult<Vec<u8>> {
        match source {
            CaptureSource::Camera => self.run_camera().await,
            CaptureSource::Gallery => self.read_gallery().await,
        }
    }
}
