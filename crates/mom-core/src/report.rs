//! Scan results as a report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::analysis::model::AnalysisResult;
use crate::capture::model::{CaptureSource, CapturedImage};
use crate::error::{MomError, MomResult};

/// Follow-up actions offered on the results screen.
pub const NEXT_STEPS: [&str; 4] = ["Download Report", "Share Results", "Zoom Consult", "Teams Chat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    /// Pick the format from a file extension, Markdown by default.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Markdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub source: CaptureSource,
    pub image_width: u32,
    pub image_height: u32,
    pub result: AnalysisResult,
}

impl ScanReport {
    pub fn new(image: &CapturedImage, result: AnalysisResult) -> Self {
        Self {
            generated_at: Utc::now(),
            source: image.source,
            image_width: image.width,
            image_height: image.height,
            result,
        }
    }

    pub fn confidence_line(&self) -> String {
        format!("{}% confidence", self.result.confidence)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Scan Results");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Generated {} from a {}x{} {} photo.",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.image_width,
            self.image_height,
            self.source.as_str()
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "## Risk Assessment");
        let _ = writeln!(out);
        let _ = writeln!(out, "**{}** ({})", self.result.risk_level.badge(), self.confidence_line());
        let _ = writeln!(out);
        let _ = writeln!(out, "### Key Findings");
        let _ = writeln!(out);
        for finding in &self.result.findings {
            let _ = writeln!(out, "- {finding}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "## Recommendations");
        let _ = writeln!(out);
        for (i, rec) in self.result.recommendations.iter().enumerate() {
            let _ = writeln!(out, "{}. {rec}", i + 1);
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "_This assessment is informational and does not replace a consultation with a dermatologist._"
        );
        out
    }

    pub fn render(&self, format: ReportFormat) -> MomResult<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Write the report ("Download Report"). The format follows the extension.
    pub fn save(&self, path: &Path) -> MomResult<()> {
        if path.as_os_str().is_empty() {
            return Err(MomError::validation("report path is empty"));
        }
        let format = ReportFormat::from_path(path);
        std::fs::write(path, self.render(format)?)?;
        info!(path = %path.display(), ?format, "Report saved");
        Ok(())
    }
}
