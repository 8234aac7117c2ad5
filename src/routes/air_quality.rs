//! Read endpoints: paged listing, aggregated view, raw range and
//! single-parameter projection.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{ApiError, AppState};

const FETCHED: &str = "Data fetched successfully";

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/air-quality", get(aggregate))
        .route("/air-quality/data", get(table))
        .route("/air-quality/range", get(range))
        .route("/air-quality/parameter/{name}", get(parameter))
}

/// `?offset=&limit=`
#[derive(Debug, Deserialize)]
struct TableQuery {
    offset: Option<u64>,
    limit: Option<u64>,
}

/// `?startDate=&endDate=&parameters=a,b&interval=hourly|daily`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    parameters: Option<String>,
    interval: Option<String>,
}

/// `?startDate=&endDate=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn table(
    Query(params): Query<TableQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    debug!("GET /air-quality/data - {:?}", params);

    let page = state.service.list(params.offset, params.limit).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "data": page.data, "total": page.total, "message": FETCHED })),
    ))
}

async fn aggregate(
    Query(params): Query<AggregateQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("GET /air-quality - {:?}", params);

    let rows = state
        .service
        .aggregate(
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            params.parameters.as_deref(),
            params.interval.as_deref(),
        )
        .await?;

    debug!("GET /air-quality - {} buckets", rows.len());
    Ok((StatusCode::OK, Json(json!({ "data": rows, "message": FETCHED }))))
}

async fn range(
    Query(params): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    debug!("GET /air-quality/range - {:?}", params);

    let rows = state
        .service
        .scan(params.start_date.as_deref(), params.end_date.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(json!({ "data": rows, "message": FETCHED }))))
}

async fn parameter(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    debug!("GET /air-quality/parameter/{}", name);

    let points = state.service.project(&name).await?;

    Ok((StatusCode::OK, Json(json!({ "data": points, "message": FETCHED }))))
}
