//! Scan history + public share links

use axum::{extract::{Path, Query, State}, Json};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::UserContext;
use crate::models::{HistoryQuery, ScanHistory, SharedScan, UpdateVisibility};

const SHARE_NOT_FOUND: &str = "Không tìm thấy kết quả hoặc đã bị ẩn";

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub success: bool,
    pub total: i64,
    pub data: Vec<ScanHistory>,
}

/// GET /api/v1/history
pub async fn list(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryPage>> {
    let (data, total) = tokio::try_join!(
        ScanHistory::list_by_user(&state.pool, user.user_id, &query),
        ScanHistory::count_by_user(&state.pool, user.user_id),
    )?;

    Ok(Json(HistoryPage { success: true, total, data }))
}

/// DELETE /api/v1/history/:id (owner only)
pub async fn delete(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !ScanHistory::delete(&state.pool, id, user.user_id).await? {
        return Err(AppError::NotFound("Not found or unauthorized".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// PUT /api/v1/history/:id/visibility
pub async fn set_visibility(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVisibility>,
) -> AppResult<Json<Value>> {
    let item = ScanHistory::set_visibility(&state.pool, id, user.user_id, req.is_public)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found or unauthorized".to_string()))?;

    Ok(Json(json!({ "success": true, "data": item })))
}

/// GET /api/v1/share/:token (public)
pub async fn shared(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<Value>> {
    let scan = SharedScan::find_by_token(&state.pool, &token)
        .await?
        .filter(|s| s.is_public)
        .ok_or_else(|| AppError::NotFound(SHARE_NOT_FOUND.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "url": scan.url,
            "domain": scan.domain,
            "score": scan.score,
            "label": scan.label,
            "reasons": scan.reasons,
            "ai_confidence": scan.ai_confidence,
            "created_at": scan.created_at,
            "shared_by": scan.shared_by.unwrap_or_else(|| "Anonymous".to_string()),
        }
    })))
}
