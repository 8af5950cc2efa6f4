//! Dashboard API route handlers.
//!
//! Uploads arrive as raw CSV request bodies. Scoring results are returned
//! as JSON reports or as the annotated CSV download. State is shared via
//! `Arc<DashboardState>`.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::export;
use crate::pipeline::report::SlateReport;
use crate::pipeline::{ScoredSlate, ScoringPipeline};
use crate::sheet::MatchupSheet;
use crate::types::{HeaderStyle, PipelineError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub pipeline: ScoringPipeline,
    pub max_upload_bytes: usize,
}

impl DashboardState {
    pub fn new(pipeline: ScoringPipeline, max_upload_bytes: usize) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
        }
    }

    fn score(&self, body: &str) -> Result<ScoredSlate, ApiError> {
        let sheet = MatchupSheet::from_csv_str(body)?;
        Ok(self.pipeline.score(sheet)?)
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ColumnsResponse {
    pub header_style: HeaderStyle,
    pub required: Vec<&'static str>,
    pub matchup: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Pipeline errors rendered as JSON with a matching status code.
#[derive(Debug)]
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let (status, error, missing) = match self.0 {
            PipelineError::MissingColumns { missing } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "missing_columns", missing)
            }
            PipelineError::ScoringFailure(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "scoring_failure", Vec::new())
            }
            PipelineError::InvalidCsv(_) => (StatusCode::BAD_REQUEST, "invalid_csv", Vec::new()),
        };
        warn!(status = %status, error, "Upload rejected");
        (
            status,
            Json(ErrorResponse {
                error,
                message,
                missing,
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/score
pub async fn score_json(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<SlateReport>, ApiError> {
    let slate = state.score(&body)?;
    let report = slate.report(state.pipeline.options());
    info!(run_id = %report.run_id, rows = report.row_count, "Report served");
    Ok(Json(report))
}

/// POST /api/score/csv
pub async fn score_csv(State(state): State<AppState>, body: String) -> Result<Response, ApiError> {
    let slate = state.score(&body)?;
    let csv = export::to_csv_string(&slate)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"MLBX_Results.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/columns
pub async fn get_columns(State(state): State<AppState>) -> Json<ColumnsResponse> {
    let style = state.pipeline.options().header_style;
    let columns = style.columns();
    Json(ColumnsResponse {
        header_style: style,
        required: columns.features.to_vec(),
        matchup: columns.matchup,
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
