//! Analysis domain models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Assessed risk of the photographed lesion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Badge text, e.g. `LOW RISK`.
    pub fn badge(&self) -> String {
        format!("{} RISK", self.as_str().to_uppercase())
    }
}

/// Structured outcome of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub risk_level: RiskLevel,
    /// Percentage, 0-100.
    pub confidence: u8,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// One step of the progress choreography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPhase {
    pub label: &'static str,
    pub duration: Duration,
    /// Cumulative progress reached when this phase ends.
    pub progress: u8,
}

/// The four phases shown while an image is analyzed.
pub const DEFAULT_PHASES: [AnalysisPhase; 4] = [
    AnalysisPhase {
        label: "Processing image...",
        duration: Duration::from_millis(1000),
        progress: 25,
    },
    AnalysisPhase {
        label: "Running AI analysis...",
        duration: Duration::from_millis(2000),
        progress: 50,
    },
    AnalysisPhase {
        label: "Evaluating findings...",
        duration: Duration::from_millis(1500),
        progress: 75,
    },
    AnalysisPhase {
        label: "Generating report...",
        duration: Duration::from_millis(800),
        progress: 100,
    },
];

/// Total wall time of a choreography.
pub fn total_duration(phases: &[AnalysisPhase]) -> Duration {
    phases.iter().map(|p| p.duration).sum()
}

/// Observable state of the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Analyzing {
        /// 1-based index of the phase in progress.
        step: usize,
        label: String,
        progress: u8,
    },
    Complete(AnalysisResult),
    Failed {
        message: String,
        /// Progress reached before the failure.
        progress: u8,
    },
}

impl AnalysisState {
    pub fn progress(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Analyzing { progress, .. } => *progress,
            Self::Complete(_) => 100,
            Self::Failed { progress, .. } => *progress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Failed { .. })
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Complete(result) => Some(result),
            _ => None,
        }
    }
}
