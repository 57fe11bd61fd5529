//! HTTP handlers for the leaderboard API.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use rankd_core::types::{LeaderboardConfig, RankedEntry};
use rankd_leaderboard::{Leaderboard, LeaderboardError, ScheduledLeaderboard};
use rankd_store::StoreError;

use crate::state::AppState;

// ── Error mapping ─────────────────────────────────────────────────

pub struct ApiError(LeaderboardError);

impl From<LeaderboardError> for ApiError {
    fn from(e: LeaderboardError) -> Self {
        Self(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(LeaderboardError::Store(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LeaderboardError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaderboardError::InvalidState(_) | LeaderboardError::UnsupportedCycle(_) => {
                StatusCode::BAD_REQUEST
            }
            LeaderboardError::CorruptHistory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LeaderboardError::Store(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            LeaderboardError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            LeaderboardError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

async fn load_board(state: &AppState, name: &str) -> Result<ScheduledLeaderboard, ApiError> {
    let config = state
        .registry
        .get(name)
        .await?
        .ok_or_else(|| LeaderboardError::NotFound(name.to_string()))?;
    Ok(ScheduledLeaderboard::load(state.store.clone(), config).await?)
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Scheduled leaderboards ────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateScheduledRequest {
    pub name: String,
    /// Defaults to `DEFAULT_SETTLEMENT_TIME` when omitted.
    pub settlement_time: Option<NaiveTime>,
    /// Defaults to `DEFAULT_SETTLEMENT_CYCLE` when omitted.
    pub settlement_cycle: Option<String>,
}

#[derive(Serialize)]
pub struct CreateScheduledResponse {
    pub message: String,
    pub config: LeaderboardConfig,
}

pub async fn create_scheduled(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateScheduledRequest>,
) -> Result<Json<CreateScheduledResponse>, ApiError> {
    let defaults = &state.config.settlement;
    let time = req.settlement_time.unwrap_or(defaults.default_time);
    let cycle = req
        .settlement_cycle
        .unwrap_or_else(|| defaults.default_cycle.to_string());

    let board = ScheduledLeaderboard::create(
        state.store.clone(),
        &state.registry,
        &req.name,
        time,
        &cycle,
        &defaults.supported_cycles,
    )
    .await?;

    Ok(Json(CreateScheduledResponse {
        message: format!("scheduled leaderboard '{}' created", req.name),
        config: board.config().clone(),
    }))
}

pub async fn list_scheduled(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, LeaderboardConfig>>, ApiError> {
    Ok(Json(state.registry.list_all().await?))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub status: String,
    pub settles_at: Option<String>,
}

pub async fn scheduled_status(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let board = load_board(&state, &name).await?;
    Ok(Json(StatusResponse {
        name,
        status: board.status().to_string(),
        settles_at: board.settles_at().map(|t| t.to_rfc3339()),
    }))
}

#[derive(Deserialize)]
pub struct ScoreUpdate {
    pub user_id: String,
    pub score: f64,
}

pub async fn scheduled_update_score(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(update): Json<ScoreUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let board = load_board(&state, &name).await?;
    board.update_score(&update.user_id, update.score).await?;
    Ok(Json(serde_json::json!({
        "message": format!("score updated for user '{}' in '{}'", update.user_id, name)
    })))
}

#[derive(Deserialize)]
pub struct TopQuery {
    pub n: Option<u64>,
}

#[derive(Serialize)]
pub struct TopResponse {
    pub name: String,
    pub top_n: Vec<RankedEntry>,
}

pub async fn scheduled_top_n(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>, ApiError> {
    let board = load_board(&state, &name).await?;
    let top_n = board.view().top_n(query.n.unwrap_or(10)).await?;
    Ok(Json(TopResponse { name, top_n }))
}

pub async fn scheduled_settle(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut board = load_board(&state, &name).await?;
    let record = board.manual_settlement(Utc::now()).await?;
    Ok(Json(serde_json::json!({
        "message": format!("leaderboard '{}' manually settled", name),
        "timestamp": record.timestamp,
        "participants": record.snapshot.len(),
    })))
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub name: String,
    pub history: BTreeMap<String, Vec<RankedEntry>>,
}

pub async fn scheduled_history(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let board = load_board(&state, &name).await?;
    let history = board.history().await?;
    Ok(Json(HistoryResponse { name, history }))
}

// ── Plain leaderboards ────────────────────────────────────────────

fn plain_board(state: &AppState, name: &str) -> Leaderboard {
    Leaderboard::new(state.store.clone(), name)
}

pub async fn update_score(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(update): Json<ScoreUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    plain_board(&state, &name)
        .update_score(&update.user_id, update.score)
        .await?;
    Ok(Json(serde_json::json!({ "message": "score updated" })))
}

#[derive(Serialize)]
pub struct UserScoreResponse {
    pub user_id: String,
    pub score: f64,
    pub rank: Option<u64>,
}

pub async fn user_score(
    State(state): State<Arc<AppState>>,
    Path((name, user_id)): Path<(String, String)>,
) -> Result<Json<UserScoreResponse>, ApiError> {
    let board = plain_board(&state, &name);
    let score = board
        .score(&user_id)
        .await?
        .ok_or_else(|| LeaderboardError::NotFound(format!("user '{}' in '{}'", user_id, name)))?;
    let rank = board.rank(&user_id).await?;
    Ok(Json(UserScoreResponse {
        user_id,
        score,
        rank,
    }))
}

pub async fn top_n(
    State(state): State<Arc<AppState>>,
    Path((name, n)): Path<(String, u64)>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    Ok(Json(plain_board(&state, &name).top_n(n).await?))
}

pub async fn remove_user(
    State(state): State<Arc<AppState>>,
    Path((name, user_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    plain_board(&state, &name).remove_user(&user_id).await?;
    Ok(Json(serde_json::json!({ "message": "user removed" })))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    plain_board(&state, &name).reset().await?;
    Ok(Json(serde_json::json!({ "message": "leaderboard reset" })))
}
