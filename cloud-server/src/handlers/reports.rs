//! Community report handlers

use axum::{extract::{Query, State}, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use antiscam_core::logic::normalize::sanitize_text;
use antiscam_core::logic::rate_limit::tier::local_day;
use antiscam_core::{extract_domain, LimitKind};

use crate::{AppState, AppError, AppResult};
use crate::middleware::security::ClientIp;
use crate::models::{CreateReport, DailyStats, NewReport, Report, ReportFilter};

const MAX_URL_CHARS: usize = 2048;
const MAX_REASON_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 1000;
/// Screenshots arrive as data URLs
const MAX_SCREENSHOT_CHARS: usize = 2 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ReportCreated {
    pub id: Uuid,
    pub message: &'static str,
    pub phishtank_submitted: bool,
}

/// Clean user input into a storable report
pub fn prepare_report(req: &CreateReport, ip: Option<String>) -> AppResult<NewReport> {
    let raw_url = sanitize_text(&req.url, MAX_URL_CHARS);
    let reason = sanitize_text(&req.reason, MAX_REASON_CHARS).to_lowercase();
    if raw_url.is_empty() || reason.is_empty() {
        return Err(AppError::ValidationError("Invalid data".to_string()));
    }

    let url = if raw_url.starts_with("http") {
        raw_url
    } else {
        format!("https://{}", raw_url)
    };

    Ok(NewReport {
        domain: extract_domain(&url),
        url,
        reason,
        description: req
            .description
            .as_deref()
            .map(|d| sanitize_text(d, MAX_DESCRIPTION_CHARS))
            .filter(|d| !d.is_empty()),
        // Data URLs are kept as-is apart from length
        screenshot: req
            .screenshot
            .as_deref()
            .map(|s| s.trim().chars().take(MAX_SCREENSHOT_CHARS).collect::<String>())
            .filter(|s| !s.is_empty()),
        ip_address: ip,
    })
}

/// POST /api/v1/reports (public, 3/min per IP)
pub async fn create(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(req): Json<CreateReport>,
) -> AppResult<Json<Value>> {
    let decision = state.limiter.check(LimitKind::Report, client_ip.as_str());
    if !decision.allowed {
        return Err(AppError::window_exhausted(
            "Bạn đã gửi quá nhiều báo cáo. Vui lòng thử lại sau.",
            decision.reset_in,
        ));
    }

    req.validate()?;
    let new_report = prepare_report(&req, client_ip.known())?;

    let report = Report::create(&state.pool, new_report).await?;

    let mut phishtank_submitted = false;
    if report.reason == "phishing" {
        match state.phishtank.submit(&report.url).await {
            Ok(submitted) => phishtank_submitted = submitted,
            Err(e) => tracing::warn!("PhishTank submission error: {}", e),
        }
    }

    DailyStats::record_report(&state.pool, local_day(Utc::now())).await?;

    tracing::info!("Report {} received for {} ({})", report.id, report.domain, report.reason);

    let created = ReportCreated {
        id: report.id,
        message: if phishtank_submitted {
            "Báo cáo đã được gửi thành công và đã báo cáo lên PhishTank!"
        } else {
            "Báo cáo đã được gửi thành công"
        },
        phishtank_submitted,
    };

    Ok(Json(json!({ "success": true, "data": created })))
}

/// GET /api/v1/reports?verified= (admin)
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<Value>> {
    let reports = Report::list(&state.pool, &filter).await?;
    Ok(Json(json!({ "success": true, "data": reports })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, reason: &str) -> CreateReport {
        CreateReport {
            url: url.to_string(),
            reason: reason.to_string(),
            description: Some("<b>Lừa</b> chuyển khoản \"gấp\"".to_string()),
            screenshot: None,
        }
    }

    #[test]
    fn test_prepare_report_sanitizes() {
        let report = prepare_report(&request("scam-shop.xyz/pay", "Phishing"), None).unwrap();
        assert_eq!(report.url, "https://scam-shop.xyz/pay");
        assert_eq!(report.domain, "scam-shop.xyz");
        assert_eq!(report.reason, "phishing");
        assert_eq!(report.description.as_deref(), Some("Lừa chuyển khoản gấp"));
        assert!(report.screenshot.is_none());
    }

    #[test]
    fn test_prepare_report_rejects_markup_only() {
        assert!(prepare_report(&request("<script></script>", "scam"), None).is_err());
    }
}
