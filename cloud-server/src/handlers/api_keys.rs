//! API key handlers (BUSINESS+)

use axum::{extract::{Path, State}, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::{require_api_key_tier, UserContext};
use crate::models::{generate_key, ApiKey, CreateApiKey, MAX_ACTIVE_KEYS};

/// Key names are trimmed and need at least 3 characters
pub fn validate_key_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.chars().count() < 3 {
        return Err(AppError::ValidationError("Tên phải có ít nhất 3 ký tự".to_string()));
    }
    Ok(name)
}

/// GET /api/v1/api-keys
pub async fn list(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<Value>> {
    require_api_key_tier(&user)?;
    let keys = ApiKey::list_by_user(&state.pool, user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": keys })))
}

/// POST /api/v1/api-keys; the plaintext key is only in this response
pub async fn create(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<CreateApiKey>,
) -> AppResult<Json<Value>> {
    require_api_key_tier(&user)?;
    let name = validate_key_name(&req.name)?;

    if ApiKey::count_active(&state.pool, user.user_id).await? >= MAX_ACTIVE_KEYS {
        return Err(AppError::ValidationError(format!(
            "Đã đạt giới hạn {} API keys",
            MAX_ACTIVE_KEYS
        )));
    }

    let generated = generate_key();
    let key = ApiKey::create(&state.pool, user.user_id, name, &generated).await?;

    tracing::info!("API key {} ({}) created by user {}", key.id, key.prefix, user.user_id);

    Ok(Json(json!({
        "success": true,
        "key": generated.plaintext,
        "data": {
            "id": key.id,
            "name": key.name,
            "prefix": key.prefix,
            "created_at": key.created_at,
        }
    })))
}

/// DELETE /api/v1/api-keys/:id
pub async fn delete(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !ApiKey::delete(&state.pool, id, user.user_id).await? {
        return Err(AppError::NotFound("Not found or unauthorized".to_string()));
    }
    tracing::info!("API key {} revoked by user {}", id, user.user_id);
    Ok(Json(json!({ "success": true })))
}
