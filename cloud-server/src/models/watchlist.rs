//! Watchlist model (PRO+)

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchType {
    Domain,
    Email,
    Phone,
    BankAccount,
    SocialMedia,
}

impl WatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "DOMAIN",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::BankAccount => "BANK_ACCOUNT",
            Self::SocialMedia => "SOCIAL_MEDIA",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub value: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub alert_email: bool,
    pub alert_in_app: bool,
    pub created_at: DateTime<Utc>,
    /// Filled by list queries
    #[sqlx(default)]
    pub alert_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWatchlistItem {
    #[serde(rename = "type")]
    pub kind: WatchType,
    #[validate(length(min = 1, max = 500, message = "Giá trị không được để trống"))]
    pub value: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub alert_email: bool,
    #[serde(default = "default_true")]
    pub alert_in_app: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WatchlistAlert {
    pub id: Uuid,
    pub watchlist_id: Uuid,
    pub match_type: String,
    pub matched_value: String,
    pub context: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    /// Watched value the alert belongs to
    #[sqlx(default)]
    pub watch_value: Option<String>,
}

impl WatchlistItem {
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            SELECT w.*, COUNT(a.id) AS alert_count
            FROM watchlist w
            LEFT JOIN watchlist_alerts a ON a.watchlist_id = w.id
            WHERE w.user_id = $1
            GROUP BY w.id
            ORDER BY w.created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// None when the (user, type, value) triple already exists
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: &CreateWatchlistItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            INSERT INTO watchlist (user_id, type, value, name, notes, alert_email, alert_in_app)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, type, value) DO NOTHING
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(data.kind.as_str())
        .bind(data.value.trim())
        .bind(&data.name)
        .bind(&data.notes)
        .bind(data.alert_email)
        .bind(data.alert_in_app)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM watchlist WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// DOMAIN entries equal to, or containing, the scanned domain
    pub async fn matching_domain(
        pool: &PgPool,
        user_id: Uuid,
        domain: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            SELECT * FROM watchlist
            WHERE user_id = $1 AND type = 'DOMAIN'
              AND (value = $2 OR strpos(value, $2) > 0)
            "#
        )
        .bind(user_id)
        .bind(domain)
        .fetch_all(pool)
        .await
    }
}

/// Alert text attached to a watchlist hit
pub fn alert_context(label: &str) -> String {
    format!("Phát hiện domain trong watchlist. Risk: {}", label)
}

impl WatchlistAlert {
    pub async fn create(
        pool: &PgPool,
        watchlist_id: Uuid,
        match_type: &str,
        matched_value: &str,
        context: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO watchlist_alerts (watchlist_id, match_type, matched_value, context)
            VALUES ($1, $2, $3, $4)
            "#
        )
        .bind(watchlist_id)
        .bind(match_type)
        .bind(matched_value)
        .bind(context)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WatchlistAlert>(
            r#"
            SELECT a.*, w.value AS watch_value
            FROM watchlist_alerts a
            JOIN watchlist w ON w.id = a.watchlist_id
            WHERE w.user_id = $1
            ORDER BY a.created_at DESC
            LIMIT $2
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_type_wire_names() {
        let req: CreateWatchlistItem = serde_json::from_value(serde_json::json!({
            "type": "BANK_ACCOUNT",
            "value": "0123456789"
        }))
        .unwrap();
        assert_eq!(req.kind, WatchType::BankAccount);
        assert_eq!(req.kind.as_str(), "BANK_ACCOUNT");
        assert!(req.alert_email && req.alert_in_app);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let parsed: Result<CreateWatchlistItem, _> = serde_json::from_value(serde_json::json!({
            "type": "CRYPTO_WALLET",
            "value": "x"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_empty_value_invalid() {
        let req = CreateWatchlistItem {
            kind: WatchType::Domain,
            value: String::new(),
            name: None,
            notes: None,
            alert_email: true,
            alert_in_app: true,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_alert_context() {
        assert_eq!(
            alert_context("DANGEROUS"),
            "Phát hiện domain trong watchlist. Risk: DANGEROUS"
        );
    }
}
