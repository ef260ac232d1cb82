use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::error::TrackerError;
use crate::report::{InsightReport, TrendingTopic};
use crate::store::RecordId;
use crate::tracker::{CategoryCount, TrendTracker};

/// Default `/trending` window when `days` is not given.
pub const DEFAULT_TRENDING_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<TrendTracker>,
}

impl AppState {
    pub fn new(tracker: Arc<TrendTracker>) -> Self {
        Self { tracker }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/items", post(ingest_items))
        .route("/trending", get(trending))
        .route("/report", get(report))
        .route("/categories", get(categories))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Error body: `{"error": "..."}` with a 400 status.
pub struct ApiError(TrackerError);

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

#[derive(serde::Serialize)]
struct IngestResp {
    accepted: usize,
    discarded: usize,
    ids: Vec<RecordId>,
}

/// Accepts a single raw item or an array of them.
async fn ingest_items(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Json<IngestResp> {
    let items = match body {
        Value::Array(xs) => xs,
        other => vec![other],
    };
    let outcome = state.tracker.process_batch(items);
    Json(IngestResp {
        accepted: outcome.accepted.len(),
        discarded: outcome.discarded,
        ids: outcome.accepted,
    })
}

#[derive(serde::Deserialize)]
struct TrendingQuery {
    days: Option<i64>,
}

async fn trending(
    State(state): State<AppState>,
    Query(q): Query<TrendingQuery>,
) -> Result<Json<BTreeMap<String, Vec<TrendingTopic>>>, ApiError> {
    let days = q.days.unwrap_or(DEFAULT_TRENDING_DAYS);
    Ok(Json(state.tracker.get_trending_topics(days)?))
}

async fn report(State(state): State<AppState>) -> Json<InsightReport> {
    Json(state.tracker.generate_insight_report())
}

async fn categories(State(state): State<AppState>) -> Json<Vec<CategoryCount>> {
    Json(state.tracker.stats())
}
