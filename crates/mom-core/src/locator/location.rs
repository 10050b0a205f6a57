//! Device position with a permission gate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LocationConfig;
use crate::error::{MomError, MomResult};
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&LocationConfig> for PositionOptions {
    fn from(config: &LocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// The platform permission + position surface.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> MomResult<PermissionState>;

    async fn current_position(&self, options: &PositionOptions) -> MomResult<Coordinate>;
}

/// Ask for permission, then resolve the position within `options.timeout`.
pub async fn locate(provider: &dyn LocationProvider, options: &PositionOptions) -> MomResult<Coordinate> {
    match provider.request_permission().await? {
        PermissionState::Granted => {}
        state => {
            warn!(?state, "Location permission not granted");
            return Err(MomError::PermissionDenied(
                "Please enable location access to find nearby healthcare providers.".into(),
            ));
        }
    }

    let position = tokio::time::timeout(options.timeout, provider.current_position(options))
        .await
        .map_err(|_| MomError::Timeout(options.timeout.as_millis() as u64))??;

    if !position.is_valid() {
        return Err(MomError::DeviceUnavailable(format!("invalid position {position}")));
    }
    debug!(lat = position.lat, lng = position.lng, "Location found");
    Ok(position)
}

/// A position known up front: from configuration, flags, or a client that
/// already resolved it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    coordinate: Option<Coordinate>,
}

impl FixedLocation {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> MomResult<PermissionState> {
        Ok(PermissionState::Granted)
    }

    async fn current_position(&self, _options: &PositionOptions) -> MomResult<Coordinate> {
        self.coordinate
            .ok_or_else(|| MomError::DeviceUnavailable("no position available (set --lat/--lng or [location])".into()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Location surface with scripted answers.
    pub(crate) struct ScriptedLocation {
        pub permission: PermissionState,
        pub delay: Duration,
        pub position: Coordinate,
    }

    #[async_trait]
    impl LocationProvider for ScriptedLocation {
        async fn request_permission(&self) -> MomResult<PermissionState> {
            Ok(self.permission)
        }

        async fn current_position(&self, _options: &PositionOptions) -> MomResult<Coordinate> {
            tokio::time::sleep(self.delay).await;
            Ok(self.position)
        }
    }

    #[tokio::test]
    async fn test_denied() {
        let provider = ScriptedLocation {
            permission: PermissionState::Denied,
            delay: Duration::ZERO,
            position: Coordinate::new(1.0, 1.0),
        };
        let err = locate(&provider, &PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, MomError::PermissionDenied(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let provider = ScriptedLocation {
            permission: PermissionState::Granted,
            delay: Duration::from_secs(30),
            position: Coordinate::new(1.0, 1.0),
        };
        let err = locate(&provider, &PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, MomError::Timeout(10_000)));
    }

    #[tokio::test]
    async fn test_fixed_location() {
        let found = locate(&FixedLocation::new(Some(Coordinate::new(40.4, -3.7))), &PositionOptions::default())
            .await
            .unwrap();
        assert_eq!(found, Coordinate::new(40.4, -3.7));

        let err = locate(&FixedLocation::default(), &PositionOptions::default()).await.unwrap_err();
        assert!(matches!(err, MomError::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invalid_position_rejected() {
        let err = locate(&FixedLocation::new(Some(Coordinate::new(123.0, 0.0))), &PositionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MomError::DeviceUnavailable(_)));
    }
}
