// src/api.rs
//! HTTP surface over the match engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::matching::{MatchEngine, MatchRequest, MatchRequestBody};

pub const STRATEGY_HEADER: &str = "x-match-strategy";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
}

impl AppState {
    pub fn new(engine: Arc<MatchEngine>) -> Self {
        Self { engine }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/match", post(match_job))
        .route("/api/jobs/summary", post(job_summary))
        .route("/api/jobs/skills", post(job_skills))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Always 200: the engine turns every upstream failure into a labeled result.
async fn match_job(
    State(state): State<AppState>,
    Json(body): Json<MatchRequestBody>,
) -> impl IntoResponse {
    let req = MatchRequest::from(body);
    let result = state.engine.match_candidate_to_job(&req).await;
    ([(STRATEGY_HEADER, result.strategy.as_str())], Json(result))
}

#[derive(Deserialize)]
struct DescriptionReq {
    description: String,
}

#[derive(Serialize)]
struct SummaryResp {
    summary: String,
}

#[derive(Serialize)]
struct SkillsResp {
    skills: Vec<String>,
}

async fn job_summary(
    State(state): State<AppState>,
    Json(body): Json<DescriptionReq>,
) -> Json<SummaryResp> {
    let summary = state.engine.generate_job_summary(&body.description).await;
    Json(SummaryResp { summary })
}

async fn job_skills(
    State(state): State<AppState>,
    Json(body): Json<DescriptionReq>,
) -> Json<SkillsResp> {
    let skills = state.engine.extract_job_skills(&body.description).await;
    Json(SkillsResp { skills })
}
