//! `POST /air-quality/ingest`: replace all data with an uploaded file.
//!
//! The request body is the `;`-delimited source file itself.

use std::io::Cursor;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{debug, info};

use super::{ApiError, AppState};

// ---

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    // ---
    Router::new().route(
        "/air-quality/ingest",
        post(handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

async fn handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("POST /air-quality/ingest - {} bytes", body.len());

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }

    let report = state.service.ingest_csv(Cursor::new(body)).await?;

    info!(
        committed = report.committed,
        skipped = report.skipped,
        "Ingestion complete"
    );
    debug!("POST /air-quality/ingest - Returning OK");

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Data ingested successfully",
            "committed": report.committed,
            "skipped": report.skipped,
        })),
    ))
}
