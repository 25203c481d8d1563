//! Public statistics

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Serialize;

use antiscam_core::logic::rate_limit::tier::local_day;

use crate::{AppState, AppResult};
use crate::models::{DailyStats, DomainCount, LabelTotals, RecentScan, Report};

const STATS_DAYS: i64 = 30;
const TOP_DOMAINS: i64 = 10;
const RECENT_SCANS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub scans: i32,
    pub safe: i32,
    pub caution: i32,
    pub dangerous: i32,
    pub reports: i32,
}

impl From<DailyStats> for DailyPoint {
    fn from(s: DailyStats) -> Self {
        Self {
            date: s.date.format("%Y-%m-%d").to_string(),
            scans: s.total_scans,
            safe: s.safe_count,
            caution: s.caution_count,
            dangerous: s.dangerous_count,
            reports: s.reports_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub totals: LabelTotals,
    pub reports_count: i64,
    pub daily_stats: Vec<DailyPoint>,
    pub top_domains: Vec<DomainCount>,
    pub recent_scans: Vec<RecentScan>,
}

/// GET /api/v1/stats
pub async fn overview(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let since = local_day(Utc::now()) - Duration::days(STATS_DAYS);

    let (totals, reports_count, daily, top_domains, recent_scans) = tokio::try_join!(
        LabelTotals::fetch(&state.pool),
        Report::count(&state.pool),
        DailyStats::since(&state.pool, since),
        DomainCount::top_risky(&state.pool, TOP_DOMAINS),
        RecentScan::latest(&state.pool, RECENT_SCANS),
    )?;

    let stats = StatsResponse {
        totals,
        reports_count,
        daily_stats: daily.into_iter().map(DailyPoint::from).collect(),
        top_domains,
        recent_scans,
    };

    Ok(Json(serde_json::json!({ "success": true, "data": stats })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_daily_point_format() {
        let point = DailyPoint::from(DailyStats {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            total_scans: 7,
            safe_count: 4,
            caution_count: 2,
            dangerous_count: 1,
            reports_count: 3,
        });
        assert_eq!(point.date, "2024-03-05");
        assert_eq!(point.scans, 7);
        assert_eq!(point.dangerous, 1);
    }
}
