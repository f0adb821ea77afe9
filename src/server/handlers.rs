use axum::Json;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use super::AppState;
use super::error::{AppError, AppResult};
use crate::catalog::model::Entry;
use crate::foundation::error::WheelError;
use crate::pipeline::Progress;
use crate::selection::GenerateWheelBody;
use crate::session::StatusReport;

/// Default number of search hits.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Upper bound on `limit`.
pub const MAX_SEARCH_LIMIT: usize = 50;

/// `GET /api/g1000-data`
pub async fn catalog(State(state): State<AppState>) -> Json<Vec<Entry>> {
    Json(state.sessions.catalog().entries().to_vec())
}

/// Query of `GET /api/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive needle, at least two characters.
    #[serde(default)]
    pub q: String,
    /// Maximum hits, capped at [`MAX_SEARCH_LIMIT`].
    pub limit: Option<usize>,
}

/// `GET /api/search`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Entry>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);
    Json(state.sessions.catalog().search(&params.q, limit))
}

/// Response of `POST /api/generate-wheel`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWheelResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Id to poll and download with.
    pub session_id: String,
    /// Entry the wheel lands on.
    pub winning_entry: Entry,
}

/// `POST /api/generate-wheel`
pub async fn generate_wheel(
    State(state): State<AppState>,
    body: Result<Json<GenerateWheelBody>, JsonRejection>,
) -> AppResult<Json<GenerateWheelResponse>> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = body.validate()?;

    // A winner that cannot be resolved is a bad request here, not a missing resource.
    let (id, entry) = state.sessions.create(&request).map_err(|e| match e {
        WheelError::NotFound(msg) => AppError::from(WheelError::validation(msg)),
        other => other.into(),
    })?;

    Ok(Json(GenerateWheelResponse {
        success: true,
        session_id: id.to_string(),
        winning_entry: entry,
    }))
}

/// `GET /api/status/{session_id}`
pub async fn status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<StatusReport>> {
    Ok(Json(state.sessions.status(&session_id)?))
}

/// `GET /api/progress/{session_id}`
pub async fn progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Progress>> {
    Ok(Json(state.sessions.progress(&session_id)?))
}

/// `GET /api/download/{session_id}`
pub async fn download(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Response> {
    let (id, file, size) = state.sessions.open_download(&session_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", id.artifact_name());
    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// `DELETE /api/session/{session_id}`
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    state.sessions.delete(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Entries loaded from the catalog file.
    pub catalog_size: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size: state.sessions.catalog().len(),
    })
}
