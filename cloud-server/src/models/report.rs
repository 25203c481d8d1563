//! Community report model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

use antiscam_core::constants::{BLOCKING_REVIEW_LABELS, REVIEW_LABELS};
use antiscam_core::Severity;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub url: String,
    pub domain: String,
    pub reason: String,
    pub description: Option<String>,
    pub screenshot: Option<String>,
    #[serde(skip_serializing)]
    pub ip_address: Option<String>,
    pub verified: bool,
    pub label: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReport {
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: String,
    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,
    pub description: Option<String>,
    pub screenshot: Option<String>,
}

/// Sanitized report ready for insertion
#[derive(Debug, Clone)]
pub struct NewReport {
    pub url: String,
    pub domain: String,
    pub reason: String,
    pub description: Option<String>,
    pub screenshot: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportFilter {
    pub verified: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyReport {
    pub report_id: Uuid,
    pub label: String,
    #[serde(default = "default_true")]
    pub add_to_training: bool,
}

fn default_true() -> bool {
    true
}

/// Verified label normalized to upper case, None when not a known review label
pub fn review_label(label: &str) -> Option<String> {
    let upper = label.trim().to_uppercase();
    REVIEW_LABELS.contains(&upper.as_str()).then_some(upper)
}

/// Blocklist severity for a verified label; None when the label does not block
pub fn blocking_severity(label: &str) -> Option<Severity> {
    if !BLOCKING_REVIEW_LABELS.contains(&label) {
        return None;
    }
    Some(if label == "MALWARE" { Severity::High } else { Severity::Medium })
}

impl Report {
    pub async fn create(pool: &PgPool, data: NewReport) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (url, domain, reason, description, screenshot, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#
        )
        .bind(&data.url)
        .bind(&data.domain)
        .bind(&data.reason)
        .bind(&data.description)
        .bind(&data.screenshot)
        .bind(&data.ip_address)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filter: &ReportFilter) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);
        sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE ($1::boolean IS NULL OR verified = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(filter.verified)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(pool)
            .await
    }

    pub async fn mark_verified(pool: &PgPool, id: Uuid, label: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            "UPDATE reports SET verified = true, label = $2, verified_at = NOW() WHERE id = $1 RETURNING *"
        )
        .bind(id)
        .bind(label)
        .fetch_optional(pool)
        .await
    }

    /// Text fed to the training set
    pub fn training_text(&self) -> String {
        format!(
            "{} {} {}",
            self.url,
            self.reason,
            self.description.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrainingData {
    pub id: Uuid,
    pub url: String,
    pub text: String,
    pub label: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl TrainingData {
    pub async fn create(
        pool: &PgPool,
        url: &str,
        text: &str,
        label: &str,
        source: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TrainingData>(
            "INSERT INTO training_data (url, text, label, source) VALUES ($1, $2, $3, $4) RETURNING *"
        )
        .bind(url)
        .bind(text)
        .bind(label)
        .bind(source)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_label() {
        assert_eq!(review_label("phishing").as_deref(), Some("PHISHING"));
        assert_eq!(review_label(" SAFE ").as_deref(), Some("SAFE"));
        assert_eq!(review_label("GOOD"), None);
    }

    #[test]
    fn test_blocking_severity() {
        assert_eq!(blocking_severity("MALWARE"), Some(Severity::High));
        assert_eq!(blocking_severity("PHISHING"), Some(Severity::Medium));
        assert_eq!(blocking_severity("SCAM"), Some(Severity::Medium));
        assert_eq!(blocking_severity("SPAM"), None);
        assert_eq!(blocking_severity("SAFE"), None);
    }

    #[test]
    fn test_verify_defaults_to_training() {
        let req: VerifyReport = serde_json::from_value(serde_json::json!({
            "report_id": "6f1c2a94-8f0e-4d4b-9a43-2a3f3f0f9b10",
            "label": "SCAM"
        }))
        .unwrap();
        assert!(req.add_to_training);
    }

    #[test]
    fn test_training_text() {
        let report = Report {
            id: Uuid::new_v4(),
            url: "https://scam.xyz".into(),
            domain: "scam.xyz".into(),
            reason: "phishing".into(),
            description: None,
            screenshot: None,
            ip_address: None,
            verified: false,
            label: None,
            verified_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(report.training_text(), "https://scam.xyz phishing");
    }
}
