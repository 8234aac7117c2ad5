//! Route gateway (EMBP): merges the per-area subrouters and owns the shared
//! state and error-to-response mapping they use.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;

use crate::error::ServiceError;
use crate::service::AirQualityService;

mod air_quality;
mod health;
mod ingest;

// ---

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AirQualityService>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    // ---
    Router::new()
        .merge(ingest::router(max_upload_bytes))
        .merge(air_quality::router())
        .merge(health::router())
        .with_state(state)
}

// ---

/// Handler error: client mistakes become 400, backend faults 500.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Service(ServiceError),
}

impl<E> From<E> for ApiError
where
    E: Into<ServiceError>,
{
    fn from(err: E) -> Self {
        Self::Service(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Service(err) if err.is_client_error() => {
                tracing::debug!(error = %err, "rejected request");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Service(err) => {
                // Full detail stays in the log; the client gets a generic message
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
