//! Watchlist handlers (PRO+)

use axum::{extract::{Path, State}, Json};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::{require_watchlist_tier, UserContext};
use crate::models::{CreateWatchlistItem, WatchlistAlert, WatchlistItem};

const ALERTS_LIMIT: i64 = 100;

/// GET /api/v1/watchlist
pub async fn list(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<Value>> {
    require_watchlist_tier(&user)?;
    let items = WatchlistItem::list_by_user(&state.pool, user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": items })))
}

/// POST /api/v1/watchlist
pub async fn create(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<CreateWatchlistItem>,
) -> AppResult<Json<Value>> {
    require_watchlist_tier(&user)?;
    req.validate()?;

    let item = WatchlistItem::create(&state.pool, user.user_id, &req)
        .await?
        .ok_or_else(|| AppError::ValidationError("Item này đã có trong watchlist".to_string()))?;

    tracing::info!("Watchlist item {} added by user {}", item.id, user.user_id);
    Ok(Json(json!({ "success": true, "data": item })))
}

/// DELETE /api/v1/watchlist/:id
pub async fn delete(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require_watchlist_tier(&user)?;
    if !WatchlistItem::delete(&state.pool, id, user.user_id).await? {
        return Err(AppError::NotFound("Not found or unauthorized".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// GET /api/v1/watchlist/alerts
pub async fn alerts(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<Value>> {
    require_watchlist_tier(&user)?;
    let alerts = WatchlistAlert::list_by_user(&state.pool, user.user_id, ALERTS_LIMIT).await?;
    Ok(Json(json!({ "success": true, "data": alerts })))
}
