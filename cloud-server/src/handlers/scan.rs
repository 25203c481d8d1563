//! Scan handler
//!
//! ```text
//! caller ──▶ quota (tier daily/hourly, API per-minute, anonymous IP window)
//!        ──▶ validate_url ──▶ ScanPipeline::scan
//!        ──▶ scans + daily_stats ──▶ (users) history, usage, watchlist alerts
//! ```

use std::time::Instant;

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use antiscam_core::logic::rate_limit::{check_daily_quota, tier::local_day, UsageKind, WindowRule};
use antiscam_core::{validate_url, LimitKind, ScanReport, Tier};

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::Caller;
use crate::middleware::security::ClientIp;
use crate::models::{
    alert_context, ClientInfo, DailyStats, Scan, ScanHistory, User, WatchlistAlert, WatchlistItem,
};

pub const SHARE_TOKEN_LEN: usize = 16;
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-remaining";

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ScanReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
}

/// Random share token for a history entry
pub fn generate_share_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Quota outcome for a caller that passed
struct Admitted {
    user: Option<User>,
    /// Remaining after this request; None = unlimited
    remaining: Option<u32>,
}

/// Tier of the key owner as stored now, not when the key was created
fn ensure_api_tier(tier: Tier) -> AppResult<()> {
    if !tier.can_use_api_keys() {
        return Err(AppError::forbidden("API access chỉ dành cho gói Business trở lên"));
    }
    Ok(())
}

async fn admit(state: &AppState, caller: &Caller, ip: &str) -> AppResult<Admitted> {
    let now = Instant::now();

    let Some(ctx) = caller.user() else {
        let decision = state.limiter.check_at(LimitKind::AnonymousScan, ip, now);
        if !decision.allowed {
            return Err(AppError::window_exhausted(
                "Quá nhiều yêu cầu. Vui lòng đăng ký tài khoản miễn phí để quét nhiều hơn.",
                decision.reset_in,
            ));
        }
        return Ok(Admitted { user: None, remaining: Some(decision.remaining) });
    };

    let user = User::find_by_id(&state.pool, ctx.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let tier = user.tier();
    let limits = tier.limits();

    // API keys: owner must still be on an API tier, then per-minute quota
    if let Caller::ApiKey { key_id, .. } = caller {
        ensure_api_tier(tier)?;
        if let Some(per_minute) = limits.api_calls_per_minute {
            let decision = state.limiter.check_with_rule(
                "api",
                &key_id.to_string(),
                WindowRule::per_minute(per_minute),
                now,
            );
            if !decision.allowed {
                return Err(AppError::window_exhausted("Vượt giới hạn API mỗi phút", decision.reset_in));
            }
        }
    }

    let quota = check_daily_quota(tier, &user.usage(), UsageKind::Scan, Utc::now());
    if quota.needs_reset {
        User::reset_daily_usage(&state.pool, user.id).await?;
    }
    if !quota.allowed {
        return Err(AppError::RateLimited {
            message: format!(
                "Bạn đã hết lượt quét hôm nay ({} còn lại). Nâng cấp lên Pro để được nhiều hơn.",
                quota.remaining.unwrap_or(0)
            ),
            remaining: quota.remaining,
            reset_at: Some(quota.reset_at),
            retry_after_secs: None,
        });
    }

    if let Some(per_hour) = limits.scans_per_hour {
        let decision = state.limiter.check_with_rule(
            "scan-hour",
            &user.id.to_string(),
            WindowRule::per_hour(per_hour),
            now,
        );
        if !decision.allowed {
            return Err(AppError::window_exhausted(
                "Bạn đã vượt giới hạn quét theo giờ. Vui lòng thử lại sau.",
                decision.reset_in,
            ));
        }
    }

    Ok(Admitted {
        remaining: quota.remaining.map(|r| r.saturating_sub(1)),
        user: Some(user),
    })
}

/// POST /api/v1/scan
pub async fn scan(
    State(state): State<AppState>,
    caller: Caller,
    client_ip: ClientIp,
    headers: HeaderMap,
    Json(req): Json<ScanRequest>,
) -> AppResult<Response> {
    let admitted = admit(&state, &caller, client_ip.as_str()).await?;

    let url = validate_url(req.url.as_deref().unwrap_or(""))?;
    let report = state.pipeline.scan(&url).await;

    let client = ClientInfo::new(
        client_ip.known(),
        headers.get(USER_AGENT).and_then(|v| v.to_str().ok()),
    );
    let today = local_day(Utc::now());

    tokio::try_join!(
        Scan::record(&state.pool, &report.analysis, &client),
        DailyStats::record_scan(&state.pool, today, report.analysis.label()),
    )?;

    let mut share_token = None;
    if let Some(user) = &admitted.user {
        let token = generate_share_token();
        tokio::try_join!(
            ScanHistory::create(&state.pool, user.id, &report.analysis, &token, &client),
            User::increment_usage(&state.pool, user.id, UsageKind::Scan),
        )?;

        if let Err(e) = raise_watchlist_alerts(&state, user, &report).await {
            tracing::warn!("Watchlist alert failed for user {}: {}", user.id, e);
        }
        share_token = Some(token);
    }

    tracing::info!(
        "Scan {} -> {} ({}) [{}]",
        report.analysis.domain,
        report.analysis.label(),
        report.analysis.score(),
        if admitted.user.is_some() { "user" } else { "anonymous" }
    );

    let body = ScanResponse {
        success: true,
        share_url: share_token.as_deref().map(|t| state.config.share_url(t)),
        share_token,
        report,
    };

    let mut response = Json(body).into_response();
    let remaining = admitted
        .remaining
        .map(|r| r.to_string())
        .unwrap_or_else(|| "unlimited".to_string());
    if let Ok(value) = HeaderValue::from_str(&remaining) {
        response.headers_mut().insert(RATE_LIMIT_HEADER, value);
    }
    Ok(response)
}

async fn raise_watchlist_alerts(state: &AppState, user: &User, report: &ScanReport) -> Result<(), sqlx::Error> {
    let matches = WatchlistItem::matching_domain(&state.pool, user.id, &report.analysis.domain).await?;
    let context = alert_context(report.analysis.label().as_str());

    for item in &matches {
        WatchlistAlert::create(&state.pool, item.id, "exact", &report.analysis.url, &context).await?;
    }
    if !matches.is_empty() {
        tracing::info!("{} watchlist alert(s) for user {}", matches.len(), user.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_token_shape() {
        let token = generate_share_token();
        assert_eq!(token.len(), SHARE_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_share_token());
    }

    #[test]
    fn test_api_key_owner_tier_rechecked() {
        for tier in [Tier::Free, Tier::Pro] {
            assert!(matches!(ensure_api_tier(tier), Err(AppError::Forbidden(_))));
        }
        assert!(ensure_api_tier(Tier::Business).is_ok());
        assert!(ensure_api_tier(Tier::Enterprise).is_ok());
    }

    #[test]
    fn test_missing_url_is_none() {
        let req: ScanRequest = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_none());
    }
}
