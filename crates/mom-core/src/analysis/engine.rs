//! Engines that turn a captured image into a structured result.

use async_trait::async_trait;

use super::model::{AnalysisResult, RiskLevel};
use crate::capture::model::CapturedImage;
use crate::error::MomResult;

/// Image in, structured result out.
///
/// The simulator bounds and cancels the call; an engine only has to produce
/// the result.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, image: &CapturedImage) -> MomResult<AnalysisResult>;
}

/// Placeholder engine: the same assessment for every image.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEngine;

impl StubEngine {
    pub fn result() -> AnalysisResult {
        AnalysisResult {
            risk_level: RiskLevel::Low,
            confidence: 92,
            findings: vec![
                "Regular pigmentation pattern detected".to_string(),
                "No asymmetry observed".to_string(),
                "Uniform coloration".to_string(),
                "Well-defined borders".to_string(),
            ],
            recommendations: vec![
                "Continue regular self-examinations".to_string(),
                "Monitor for any changes in size, color, or texture".to_string(),
                "Schedule routine dermatologist visit in 6 months".to_string(),
                "Apply sunscreen regularly for prevention".to_string(),
            ],
        }
    }
}

#[async_trait]
impl AnalysisEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn analyze(&self, _image: &CapturedImage) -> MomResult<AnalysisResult> {
        Ok(Self::result())
    }
}
