//! Scan, history and daily statistics models

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

use antiscam_core::{AnalysisResult, Label};

/// Request metadata stored next to a scan
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip_address: Option<String>, user_agent: Option<&str>) -> Self {
        Self {
            ip_address,
            user_agent: user_agent.map(|ua| ua.chars().take(500).collect()),
        }
    }
}

// ============================================================================
// SCANS (global)
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Scan {
    pub id: Uuid,
    pub url: String,
    pub domain: String,
    pub score: i32,
    pub label: String,
    pub reasons: Vec<String>,
    pub ai_confidence: f32,
    #[serde(skip_serializing)]
    pub ip_address: Option<String>,
    #[serde(skip_serializing)]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Scan {
    pub async fn record(
        pool: &PgPool,
        result: &AnalysisResult,
        client: &ClientInfo,
    ) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO scans (url, domain, score, label, reasons, ai_confidence, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#
        )
        .bind(&result.url)
        .bind(&result.domain)
        .bind(i32::from(result.score()))
        .bind(result.label().as_str())
        .bind(result.reasons())
        .bind(result.classification.ai_confidence)
        .bind(&client.ip_address)
        .bind(&client.user_agent)
        .fetch_one(pool)
        .await
    }
}

// ============================================================================
// SCAN HISTORY (per user)
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ScanHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub domain: String,
    pub score: i32,
    pub label: String,
    pub reasons: Vec<String>,
    pub ai_confidence: f32,
    pub heuristic_score: i32,
    pub ai_score: i32,
    pub share_token: Option<String>,
    pub is_public: bool,
    #[serde(skip_serializing)]
    pub ip_address: Option<String>,
    #[serde(skip_serializing)]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a shared scan
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SharedScan {
    pub url: String,
    pub domain: String,
    pub score: i32,
    pub label: String,
    pub reasons: Vec<String>,
    pub ai_confidence: f32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub shared_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVisibility {
    pub is_public: bool,
}

impl ScanHistory {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        result: &AnalysisResult,
        share_token: &str,
        client: &ClientInfo,
    ) -> Result<Self, sqlx::Error> {
        let breakdown = &result.classification.breakdown;
        sqlx::query_as::<_, ScanHistory>(
            r#"
            INSERT INTO scan_history (
                user_id, url, domain, score, label, reasons, ai_confidence,
                heuristic_score, ai_score, share_token, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(&result.url)
        .bind(&result.domain)
        .bind(i32::from(result.score()))
        .bind(result.label().as_str())
        .bind(result.reasons())
        .bind(result.classification.ai_confidence)
        .bind(i32::from(breakdown.heuristic_score))
        .bind(i32::from(breakdown.ai_score))
        .bind(share_token)
        .bind(&client.ip_address)
        .bind(&client.user_agent)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        query: &HistoryQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = query.offset.unwrap_or(0).max(0);

        sqlx::query_as::<_, ScanHistory>(
            r#"
            SELECT * FROM scan_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM scan_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Owner-scoped delete; false when the row is missing or belongs to someone else
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scan_history WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_visibility(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        is_public: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ScanHistory>(
            "UPDATE scan_history SET is_public = $3 WHERE id = $1 AND user_id = $2 RETURNING *"
        )
        .bind(id)
        .bind(user_id)
        .bind(is_public)
        .fetch_optional(pool)
        .await
    }
}

impl SharedScan {
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SharedScan>(
            r#"
            SELECT h.url, h.domain, h.score, h.label, h.reasons, h.ai_confidence,
                   h.is_public, h.created_at, u.name AS shared_by
            FROM scan_history h
            LEFT JOIN users u ON u.id = h.user_id
            WHERE h.share_token = $1
            "#
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }
}

// ============================================================================
// DAILY STATS
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_scans: i32,
    pub safe_count: i32,
    pub caution_count: i32,
    pub dangerous_count: i32,
    pub reports_count: i32,
}

/// (safe, caution, dangerous) increments for one label
pub fn label_increments(label: Label) -> (i32, i32, i32) {
    match label {
        Label::Safe => (1, 0, 0),
        Label::Caution => (0, 1, 0),
        Label::Dangerous => (0, 0, 1),
    }
}

impl DailyStats {
    pub async fn record_scan(pool: &PgPool, date: NaiveDate, label: Label) -> Result<(), sqlx::Error> {
        let (safe, caution, dangerous) = label_increments(label);
        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, total_scans, safe_count, caution_count, dangerous_count)
            VALUES ($1, 1, $2, $3, $4)
            ON CONFLICT (date) DO UPDATE SET
                total_scans = daily_stats.total_scans + 1,
                safe_count = daily_stats.safe_count + EXCLUDED.safe_count,
                caution_count = daily_stats.caution_count + EXCLUDED.caution_count,
                dangerous_count = daily_stats.dangerous_count + EXCLUDED.dangerous_count
            "#
        )
        .bind(date)
        .bind(safe)
        .bind(caution)
        .bind(dangerous)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn record_report(pool: &PgPool, date: NaiveDate) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, reports_count) VALUES ($1, 1)
            ON CONFLICT (date) DO UPDATE SET reports_count = daily_stats.reports_count + 1
            "#
        )
        .bind(date)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn since(pool: &PgPool, from: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, DailyStats>("SELECT * FROM daily_stats WHERE date >= $1 ORDER BY date ASC")
            .bind(from)
            .fetch_all(pool)
            .await
    }
}

// ============================================================================
// AGGREGATES (GET /stats)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct LabelTotals {
    pub total_scans: i64,
    pub safe_count: i64,
    pub caution_count: i64,
    pub dangerous_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DomainCount {
    pub domain: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentScan {
    pub id: Uuid,
    pub url: String,
    pub domain: String,
    pub score: i32,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl LabelTotals {
    pub async fn fetch(pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, LabelTotals>(
            r#"
            SELECT
                COUNT(*) AS total_scans,
                COUNT(*) FILTER (WHERE label = 'SAFE') AS safe_count,
                COUNT(*) FILTER (WHERE label = 'CAUTION') AS caution_count,
                COUNT(*) FILTER (WHERE label = 'DANGEROUS') AS dangerous_count
            FROM scans
            "#
        )
        .fetch_one(pool)
        .await
    }
}

impl DomainCount {
    /// Most reported risky domains
    pub async fn top_risky(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, DomainCount>(
            r#"
            SELECT domain, COUNT(*) AS count
            FROM scans
            WHERE label IN ('DANGEROUS', 'CAUTION')
            GROUP BY domain
            ORDER BY count DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

impl RecentScan {
    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RecentScan>(
            "SELECT id, url, domain, score, label, created_at FROM scans ORDER BY created_at DESC LIMIT $1"
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_increments() {
        assert_eq!(label_increments(Label::Safe), (1, 0, 0));
        assert_eq!(label_increments(Label::Caution), (0, 1, 0));
        assert_eq!(label_increments(Label::Dangerous), (0, 0, 1));
    }

    #[test]
    fn test_user_agent_truncated() {
        let long = "a".repeat(600);
        let info = ClientInfo::new(Some("1.2.3.4".into()), Some(&long));
        assert_eq!(info.user_agent.unwrap().len(), 500);
    }
}
