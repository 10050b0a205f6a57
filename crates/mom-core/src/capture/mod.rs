//! Image capture from camera or gallery.

pub mod model;
pub mod picker;

use image::{codecs::jpeg::JpegEncoder, DynamicImage, GenericImageView};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{MomError, MomResult};
use model::{CaptureOptions, CaptureSource, CapturedImage, CropRect};
use picker::PhotoPicker;

/// Obtains one encoded still per `acquire` call.
///
/// While an acquisition is in flight the controller is busy and a second
/// call is rejected with [`MomError::CaptureInProgress`].
pub struct CaptureController {
    picker: Arc<dyn PhotoPicker>,
    options: CaptureOptions,
    capturing: AtomicBool,
}

/// Clears the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CaptureController {
    pub fn new(picker: Arc<dyn PhotoPicker>, options: CaptureOptions) -> Self {
        Self {
            picker,
            options,
            capturing: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// Acquire a still from `source` and return it re-encoded as a JPEG data URL.
    pub async fn acquire(&self, source: CaptureSource) -> MomResult<CapturedImage> {
        if self
            .capturing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MomError::CaptureInProgress);
        }
        let _busy = BusyGuard(&self.capturing);

        let raw = match self.picker.get_photo(source, &self.options).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(source = source.as_str(), error = %e, "Capture failed");
                return Err(e);
            }
        };

        let options = self.options.clone();
        let image = tokio::task::spawn_blocking(move || encode_still(&raw, source, &options))
            .await
            .map_err(|e| MomError::InvalidImage(format!("encoder task failed: {e}")))??;

        info!(
            source = source.as_str(),
            width = image.width,
            height = image.height,
            bytes = image.encoded_len(),
            "Photo captured"
        );
        Ok(image)
    }
}

/// Decode, apply the optional crop, and re-encode at the requested quality.
pub fn encode_still(raw: &[u8], source: CaptureSource, options: &CaptureOptions) -> MomResult<CapturedImage> {
    if raw.is_empty() {
        return Err(MomError::InvalidImage("empty image".into()));
    }
    let mut img = image::load_from_memory(raw)?;

    if let Some(crop) = options.crop.filter(|_| options.allow_editing) {
        img = apply_crop(&img, crop)?;
    }

    let rgb = img.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, options.quality.clamp(1, 100)).encode_image(&rgb)?;

    Ok(CapturedImage::jpeg(&encoded, source, rgb.width(), rgb.height()))
}

fn apply_crop(img: &DynamicImage, crop: CropRect) -> MomResult<DynamicImage> {
    let (width, height) = img.dimensions();
    let fits = crop.x.checked_add(crop.width).is_some_and(|r| r <= width)
        && crop.y.checked_add(crop.height).is_some_and(|b| b <= height);
    if !fits {
        return Err(MomError::validation(format!(
            "crop {}x{}+{}+{} exceeds image {}x{}",
            crop.width, crop.height, crop.x, crop.y, width, height
        )));
    }
    Ok(img.crop_imm(crop.x, crop.y, crop.width, crop.height))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::time::Duration;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Picker that replays a fixed outcome.
    pub(crate) struct StubPicker {
        pub outcome: fn() -> MomResult<Vec<u8>>,
        pub delay: Duration,
    }

    #[async_trait]
    impl PhotoPicker for StubPicker {
        async fn get_photo(&self, _source: CaptureSource, _options: &CaptureOptions) -> MomResult<Vec<u8>> {
            tokio::time::sleep(self.delay).await;
            (self.outcome)()
        }
    }

    fn controller(outcome: fn() -> MomResult<Vec<u8>>) -> CaptureController {
        CaptureController::new(
            Arc::new(StubPicker { outcome, delay: Duration::ZERO }),
            CaptureOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_acquire_returns_jpeg() {
        let ctrl = controller(|| Ok(png_bytes(8, 6)));
        let image = ctrl.acquire(CaptureSource::Camera).await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!((image.width, image.height), (8, 6));
        assert_eq!(image.source, CaptureSource::Camera);
        assert!(!ctrl.is_capturing());
    }

    #[tokio::test]
    async fn test_denied_permission_is_failure() {
        let ctrl = controller(|| Err(MomError::PermissionDenied("camera".into())));
        let err = ctrl.acquire(CaptureSource::Camera).await.unwrap_err();
        assert!(matches!(err, MomError::PermissionDenied(_)));
        assert!(!ctrl.is_capturing());
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_rejected() {
        let ctrl = controller(|| Ok(b"not an image".to_vec()));
        let err = ctrl.acquire(CaptureSource::Gallery).await.unwrap_err();
        assert!(matches!(err, MomError::InvalidImage(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_while_busy_is_rejected() {
        let ctrl = Arc::new(CaptureController::new(
            Arc::new(StubPicker { outcome: || Ok(png_bytes(2, 2)), delay: Duration::from_secs(1) }),
            CaptureOptions::default(),
        ));

        let first = {
            let ctrl = ctrl.clone();
            tokio::spawn(async move { ctrl.acquire(CaptureSource::Camera).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(ctrl.is_capturing());

        let err = ctrl.acquire(CaptureSource::Gallery).await.unwrap_err();
        assert!(matches!(err, MomError::CaptureInProgress));

        assert!(first.await.unwrap().is_ok());
        assert!(!ctrl.is_capturing());
    }

    #[test]
    fn test_crop_applied_when_editing_allowed() {
        let options = CaptureOptions {
            crop: Some(CropRect { x: 1, y: 1, width: 3, height: 2 }),
            ..CaptureOptions::default()
        };
        let image = encode_still(&png_bytes(8, 8), CaptureSource::Gallery, &options).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
    }

    #[test]
    fn test_crop_ignored_when_editing_disabled() {
        let options = CaptureOptions {
            allow_editing: false,
            crop: Some(CropRect { x: 0, y: 0, width: 2, height: 2 }),
            ..CaptureOptions::default()
        };
        let image = encode_still(&png_bytes(8, 8), CaptureSource::Gallery, &options).unwrap();
        assert_eq!((image.width, image.height), (8, 8));
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let options = CaptureOptions {
            crop: Some(CropRect { x: 6, y: 0, width: 4, height: 2 }),
            ..CaptureOptions::default()
        };
        let err = encode_still(&png_bytes(8, 8), CaptureSource::Gallery, &options).unwrap_err();
        assert!(matches!(err, MomError::ValidationError(_)));
    }

    #[test]
    fn test_encoded_image_decodes_back() {
        let image = encode_still(&png_bytes(5, 4), CaptureSource::Camera, &CaptureOptions::default()).unwrap();
        let bytes = model::decode_data_url(&image.data_url).unwrap();
        let again = encode_still(&bytes, CaptureSource::Camera, &CaptureOptions::default()).unwrap();
        assert_eq!((again.width, again.height), (5, 4));
    }
}
