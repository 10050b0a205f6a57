//! Scan route handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use mom_core::analysis::model::AnalysisState;
use mom_core::capture::encode_still;
use mom_core::capture::model::{decode_data_url, CaptureOptions, CaptureSource};
use mom_core::notice::Notice;
use mom_core::report::{ScanReport, NEXT_STEPS};
use mom_core::MomError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, ScanEntry};

#[derive(Deserialize)]
pub struct CreateScanRequest {
    /// `data:image/...;base64,...`
    pub image: String,
    pub source: Option<CaptureSource>,
}

#[derive(Serialize)]
pub struct ScanView {
    pub id: Uuid,
    pub source: CaptureSource,
    pub width: u32,
    pub height: u32,
    pub created_at: String,
    pub state: AnalysisState,
    pub progress: u8,
}

#[derive(Serialize)]
pub struct CreatedScan {
    #[serde(flatten)]
    pub scan: ScanView,
    pub notice: Notice,
}

impl ScanView {
    fn from_entry(entry: &ScanEntry) -> Self {
        let state = entry.simulator.state();
        Self {
            id: entry.id,
            source: entry.image.source,
            width: entry.image.width,
            height: entry.image.height,
            created_at: entry.created_at.to_rfc3339(),
            progress: state.progress(),
            state,
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::Core(MomError::UnknownScan(id.to_string())))
}

async fn find(state: &AppState, id: &str) -> Result<std::sync::Arc<ScanEntry>, ApiError> {
    let uuid = parse_id(id)?;
    state
        .scan(&uuid)
        .await
        .ok_or_else(|| ApiError::Core(MomError::UnknownScan(id.to_string())))
}

/// Accept a photo taken by the client and start analyzing it.
///
/// The upload is decoded and re-encoded at the configured quality, the same
/// way a locally captured still is.
pub async fn create_scan(
    State(state): State<AppState>,
    payload: Result<Json<CreateScanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedScan>), ApiError> {
    let Json(req) = payload?;
    let source = req.source.unwrap_or(CaptureSource::Camera);
    let raw = decode_data_url(&req.image)?;
    let options = CaptureOptions::from(&state.config.capture);

    let image = tokio::task::spawn_blocking(move || encode_still(&raw, source, &options))
        .await
        .map_err(|e| MomError::InvalidImage(format!("encoder task failed: {e}")))??;

    let entry = state.start_scan(image).await;

    tracing::info!(scan_id = %entry.id, source = source.as_str(), "Scan created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedScan {
            scan: ScanView::from_entry(&entry),
            notice: Notice::photo_ready(source),
        }),
    ))
}

pub async fn list_scans(State(state): State<AppState>) -> Json<Vec<ScanView>> {
    let scans = state.scans.read().await;
    let mut views: Vec<ScanView> = scans.values().map(|e| ScanView::from_entry(e)).collect();
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(views)
}

pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScanView>, ApiError> {
    let entry = find(&state, &id).await?;
    Ok(Json(ScanView::from_entry(&entry)))
}

#[derive(Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: ScanReport,
    pub badge: String,
    pub next_steps: [&'static str; 4],
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReportView>, ApiError> {
    let report = completed_report(&state, &id).await?;
    Ok(Json(ReportView {
        badge: report.result.risk_level.badge(),
        report,
        next_steps: NEXT_STEPS,
    }))
}

/// "Download Report" as Markdown.
pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let report = completed_report(&state, &id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"scan-{id}.md\""),
            ),
        ],
        report.to_markdown(),
    ))
}

async fn completed_report(state: &AppState, id: &str) -> Result<ScanReport, ApiError> {
    let entry = find(state, id).await?;
    match entry.simulator.state() {
        AnalysisState::Complete(result) => Ok(ScanReport::new(&entry.image, result)),
        AnalysisState::Failed { message, .. } => Err(ApiError::Core(MomError::unavailable(message))),
        other => Err(ApiError::NotReady(format!(
            "Analysis is {}% complete.",
            other.progress()
        ))),
    }
}

pub async fn delete_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uuid = parse_id(&id)?;
    if state.remove_scan(&uuid).await {
        tracing::info!(scan_id = %uuid, "Scan dismissed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Core(MomError::UnknownScan(id)))
    }
}
