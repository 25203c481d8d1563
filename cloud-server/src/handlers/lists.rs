//! Blocklist / whitelist handlers
//!
//! Reads are public; mutations sit behind the admin middleware and drop the
//! cached verdict for the touched domain.

use axum::{extract::{Query, State}, Json};
use serde_json::{json, Value};
use validator::Validate;

use antiscam_core::{extract_domain, Severity};

use crate::{AppState, AppError, AppResult};
use crate::models::{
    BlocklistEntry, BlocklistFilter, DomainQuery, UpsertBlocklist, UpsertWhitelist,
    WhitelistEntry, WhitelistFilter,
};

/// Admins paste URLs as often as bare domains
fn normalize_domain(input: &str) -> AppResult<String> {
    let trimmed = input.trim();
    let domain = if trimmed.contains("://") {
        extract_domain(trimmed)
    } else {
        trimmed.trim_end_matches('/').to_lowercase()
    };
    if domain.is_empty() {
        return Err(AppError::ValidationError("Missing domain".to_string()));
    }
    Ok(domain)
}

fn required_domain(query: DomainQuery) -> AppResult<String> {
    normalize_domain(query.domain.as_deref().unwrap_or(""))
}

// ============================================================================
// BLOCKLIST
// ============================================================================

/// GET /api/v1/blocklist?severity=&source=
pub async fn list_blocklist(
    State(state): State<AppState>,
    Query(filter): Query<BlocklistFilter>,
) -> AppResult<Json<Value>> {
    let entries = BlocklistEntry::list(&state.pool, &filter).await?;
    Ok(Json(json!({ "success": true, "data": entries })))
}

/// POST /api/v1/blocklist (admin)
pub async fn upsert_blocklist(
    State(state): State<AppState>,
    Json(req): Json<UpsertBlocklist>,
) -> AppResult<Json<Value>> {
    req.validate()?;
    let domain = normalize_domain(&req.domain)?;
    let entry = BlocklistEntry::upsert(
        &state.pool,
        &domain,
        req.reason.trim(),
        req.severity.unwrap_or(Severity::Medium),
        req.source.as_deref().unwrap_or("manual"),
    )
    .await?;

    state.lists.invalidate(&domain);
    tracing::info!("Blocklist upsert: {} ({})", entry.domain, entry.severity);

    Ok(Json(json!({ "success": true, "data": entry })))
}

/// DELETE /api/v1/blocklist?domain= (admin)
pub async fn delete_blocklist(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> AppResult<Json<Value>> {
    let domain = required_domain(query)?;
    if !BlocklistEntry::delete(&state.pool, &domain).await? {
        return Err(AppError::NotFound("Domain not in blocklist".to_string()));
    }

    state.lists.invalidate(&domain);
    tracing::info!("Blocklist delete: {}", domain);

    Ok(Json(json!({ "success": true, "message": "Deleted successfully" })))
}

// ============================================================================
// WHITELIST
// ============================================================================

/// GET /api/v1/whitelist?category=
pub async fn list_whitelist(
    State(state): State<AppState>,
    Query(filter): Query<WhitelistFilter>,
) -> AppResult<Json<Value>> {
    let entries = WhitelistEntry::list(&state.pool, &filter).await?;
    Ok(Json(json!({ "success": true, "data": entries })))
}

/// POST /api/v1/whitelist (admin)
pub async fn upsert_whitelist(
    State(state): State<AppState>,
    Json(req): Json<UpsertWhitelist>,
) -> AppResult<Json<Value>> {
    req.validate()?;
    let domain = normalize_domain(&req.domain)?;
    let entry = WhitelistEntry::upsert(
        &state.pool,
        &domain,
        req.name.as_deref(),
        req.category.as_deref(),
    )
    .await?;

    state.lists.invalidate(&domain);
    tracing::info!("Whitelist upsert: {}", entry.domain);

    Ok(Json(json!({ "success": true, "data": entry })))
}

/// DELETE /api/v1/whitelist?domain= (admin)
pub async fn delete_whitelist(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> AppResult<Json<Value>> {
    let domain = required_domain(query)?;
    if !WhitelistEntry::delete(&state.pool, &domain).await? {
        return Err(AppError::NotFound("Domain not in whitelist".to_string()));
    }

    state.lists.invalidate(&domain);
    tracing::info!("Whitelist delete: {}", domain);

    Ok(Json(json!({ "success": true, "message": "Deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" Scam.XYZ/ ").unwrap(), "scam.xyz");
        assert_eq!(
            normalize_domain("https://login.scam.xyz/path?q=1").unwrap(),
            "login.scam.xyz"
        );
        assert!(normalize_domain("   ").is_err());
    }
}
