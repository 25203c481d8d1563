//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use antiscam_core::constants::APP_NAME;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    ai_model: String,
    providers: Vec<String>,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        ai_model: state.pipeline.ai_name().to_string(),
        providers: state.pipeline.checker().active_providers(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
