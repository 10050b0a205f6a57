//! One scan session: capture screen, then results screen.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::analysis::model::AnalysisState;
use crate::analysis::AnalysisSimulator;
use crate::capture::model::{CaptureSource, CapturedImage};
use crate::capture::CaptureController;
use crate::notice::Notice;
use crate::report::ScanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Capture,
    Results,
}

/// Per-screen context tying capture to analysis.
pub struct ScanSession {
    capture: CaptureController,
    simulator: AnalysisSimulator,
    image: Mutex<Option<CapturedImage>>,
}

impl ScanSession {
    pub fn new(capture: CaptureController, simulator: AnalysisSimulator) -> Self {
        Self {
            capture,
            simulator,
            image: Mutex::new(None),
        }
    }

    fn image_slot(&self) -> MutexGuard<'_, Option<CapturedImage>> {
        self.image.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn screen(&self) -> Screen {
        if self.image_slot().is_some() {
            Screen::Results
        } else {
            Screen::Capture
        }
    }

    pub fn image(&self) -> Option<CapturedImage> {
        self.image_slot().clone()
    }

    pub fn analysis(&self) -> &AnalysisSimulator {
        &self.simulator
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    /// Acquire a photo and move to the results screen.
    ///
    /// On failure the session stays on the capture screen and the error notice
    /// is returned.
    pub async fn capture(&self, source: CaptureSource) -> Result<Notice, Notice> {
        match self.capture.acquire(source).await {
            Ok(image) => {
                self.handle_image_capture(image);
                Ok(Notice::photo_ready(source))
            }
            Err(e) => Err(Notice::capture_failed(source, &e)),
        }
    }

    /// Show the results screen for `image` and start analyzing it.
    pub fn handle_image_capture(&self, image: CapturedImage) {
        info!(source = image.source.as_str(), "Starting scan");
        *self.image_slot() = Some(image.clone());
        self.simulator.start(image);
    }

    /// Leave the results screen. The running analysis is torn down.
    pub fn back(&self) {
        self.simulator.reset();
        *self.image_slot() = None;
    }

    /// The report, once the analysis is complete.
    pub fn report(&self) -> Option<ScanReport> {
        let image = self.image()?;
        match self.simulator.state() {
            AnalysisState::Complete(result) => Some(ScanReport::new(&image, result)),
            _ => None,
        }
    }
}
