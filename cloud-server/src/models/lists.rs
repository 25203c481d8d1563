//! Blocklist / whitelist models
//!
//! `PgDomainLists` is the Postgres side of the core `DomainLists` seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

use antiscam_core::logic::external_intel::community::{
    scam_seed_severity, COMMUNITY_REASON, COMMUNITY_SOURCE, VN_SCAM_DOMAINS, VN_TRUSTED_DOMAINS,
};
use antiscam_core::logic::external_intel::FeedEntry;
use antiscam_core::{BlockedDomain, DomainLists, ScanError, Severity};

// ============================================================================
// BLOCKLIST
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BlocklistEntry {
    pub id: Uuid,
    pub domain: String,
    pub reason: String,
    pub severity: String,
    pub source: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BlocklistFilter {
    pub severity: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertBlocklist {
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub domain: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub reason: String,
    pub severity: Option<Severity>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    pub domain: Option<String>,
}

impl BlocklistEntry {
    pub async fn list(pool: &PgPool, filter: &BlocklistFilter) -> Result<Vec<Self>, sqlx::Error> {
        let severity = filter.severity.as_deref().map(str::to_uppercase);
        sqlx::query_as::<_, BlocklistEntry>(
            r#"
            SELECT * FROM blocklist
            WHERE ($1::text IS NULL OR severity = $1)
              AND ($2::text IS NULL OR source = $2)
            ORDER BY created_at DESC
            "#
        )
        .bind(severity)
        .bind(filter.source.as_deref())
        .fetch_all(pool)
        .await
    }

    pub async fn find(pool: &PgPool, domain: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BlocklistEntry>("SELECT * FROM blocklist WHERE domain = $1")
            .bind(domain)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite reason / severity / source
    pub async fn upsert(
        pool: &PgPool,
        domain: &str,
        reason: &str,
        severity: Severity,
        source: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BlocklistEntry>(
            r#"
            INSERT INTO blocklist (domain, reason, severity, source)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (domain) DO UPDATE SET
                reason = EXCLUDED.reason,
                severity = EXCLUDED.severity,
                source = EXCLUDED.source,
                updated_at = NOW()
            RETURNING *
            "#
        )
        .bind(domain)
        .bind(reason)
        .bind(severity.as_str())
        .bind(source)
        .fetch_one(pool)
        .await
    }

    /// Insert unless the domain is already listed; true when a row was added
    pub async fn insert_if_absent(
        pool: &PgPool,
        domain: &str,
        reason: &str,
        severity: Severity,
        source: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO blocklist (domain, reason, severity, source, metadata)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (domain) DO NOTHING
            "#
        )
        .bind(domain)
        .bind(reason)
        .bind(severity.as_str())
        .bind(source)
        .bind(metadata)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist feed entries in one transaction, skipping known domains
    pub async fn import_feed(pool: &PgPool, entries: &[FeedEntry]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut imported = 0;

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO blocklist (domain, reason, severity, source, metadata)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (domain) DO NOTHING
                "#
            )
            .bind(&entry.domain)
            .bind(&entry.reason)
            .bind(entry.severity.as_str())
            .bind(entry.source.id())
            .bind(&entry.metadata)
            .execute(&mut *tx)
            .await?;
            imported += result.rows_affected();
        }

        tx.commit().await?;
        Ok(imported)
    }

    pub async fn delete(pool: &PgPool, domain: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blocklist WHERE domain = $1")
            .bind(domain)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blocklist")
            .fetch_one(pool)
            .await
    }

    /// Unknown severities stored by hand fall back to MEDIUM
    pub fn to_blocked(&self) -> BlockedDomain {
        BlockedDomain {
            reason: Some(self.reason.clone()).filter(|r| !r.trim().is_empty()),
            severity: Severity::from_str(&self.severity).unwrap_or(Severity::Medium),
        }
    }
}

// ============================================================================
// WHITELIST
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WhitelistEntry {
    pub id: Uuid,
    pub domain: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct WhitelistFilter {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertWhitelist {
    #[validate(length(min = 1, message = "Missing domain"))]
    pub domain: String,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl WhitelistEntry {
    pub async fn list(pool: &PgPool, filter: &WhitelistFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WhitelistEntry>(
            r#"
            SELECT * FROM whitelist
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY domain ASC
            "#
        )
        .bind(filter.category.as_deref())
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, domain: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM whitelist WHERE domain = $1)")
            .bind(domain)
            .fetch_one(pool)
            .await
    }

    pub async fn upsert(
        pool: &PgPool,
        domain: &str,
        name: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WhitelistEntry>(
            r#"
            INSERT INTO whitelist (domain, name, category)
            VALUES ($1, $2, $3)
            ON CONFLICT (domain) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category
            RETURNING *
            "#
        )
        .bind(domain)
        .bind(name)
        .bind(category)
        .fetch_one(pool)
        .await
    }

    pub async fn insert_if_absent(
        pool: &PgPool,
        domain: &str,
        name: &str,
        category: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO whitelist (domain, name, category) VALUES ($1, $2, $3) ON CONFLICT (domain) DO NOTHING"
        )
        .bind(domain)
        .bind(name)
        .bind(category)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, domain: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM whitelist WHERE domain = $1")
            .bind(domain)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM whitelist")
            .fetch_one(pool)
            .await
    }
}

// ============================================================================
// COMMUNITY SEED
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeedResult {
    pub added_scam: u64,
    pub added_trusted: u64,
}

/// Load the community scam / trusted lists; existing rows are left alone
pub async fn seed_community_lists(pool: &PgPool) -> Result<SeedResult, sqlx::Error> {
    let mut result = SeedResult::default();

    for domain in VN_SCAM_DOMAINS {
        let added = BlocklistEntry::insert_if_absent(
            pool,
            domain,
            COMMUNITY_REASON,
            scam_seed_severity(domain),
            COMMUNITY_SOURCE,
            None,
        )
        .await?;
        if added {
            result.added_scam += 1;
        }
    }

    for trusted in VN_TRUSTED_DOMAINS {
        if WhitelistEntry::insert_if_absent(pool, trusted.domain, trusted.brand, trusted.category).await? {
            result.added_trusted += 1;
        }
    }

    tracing::info!(
        "[Sync] Added {} scam domains, {} trusted domains",
        result.added_scam,
        result.added_trusted
    );
    Ok(result)
}

// ============================================================================
// DomainLists (core seam)
// ============================================================================

#[derive(Clone)]
pub struct PgDomainLists {
    pool: PgPool,
}

impl PgDomainLists {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(err: sqlx::Error) -> ScanError {
    ScanError::Storage(err.to_string())
}

#[async_trait]
impl DomainLists for PgDomainLists {
    async fn is_whitelisted(&self, domain: &str) -> antiscam_core::Result<bool> {
        WhitelistEntry::exists(&self.pool, domain)
            .await
            .map_err(storage_error)
    }

    async fn blocklist_entry(&self, domain: &str) -> antiscam_core::Result<Option<BlockedDomain>> {
        let entry = BlocklistEntry::find(&self.pool, domain)
            .await
            .map_err(storage_error)?;
        Ok(entry.map(|e| e.to_blocked()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(reason: &str, severity: &str) -> BlocklistEntry {
        BlocklistEntry {
            id: Uuid::new_v4(),
            domain: "scam.xyz".to_string(),
            reason: reason.to_string(),
            severity: severity.to_string(),
            source: "manual".to_string(),
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_to_blocked() {
        let blocked = entry("Lừa đảo", "high").to_blocked();
        assert_eq!(blocked.reason.as_deref(), Some("Lừa đảo"));
        assert_eq!(blocked.severity, Severity::High);

        let blocked = entry("  ", "???").to_blocked();
        assert_eq!(blocked.reason, None);
        assert_eq!(blocked.severity, Severity::Medium);
    }

    #[test]
    fn test_upsert_request_parses_severity() {
        let req: UpsertBlocklist = serde_json::from_value(serde_json::json!({
            "domain": "scam.xyz",
            "reason": "Phishing",
            "severity": "CRITICAL"
        }))
        .unwrap();
        assert_eq!(req.severity, Some(Severity::Critical));
        assert!(req.validate().is_ok());

        let req = UpsertBlocklist {
            domain: String::new(),
            reason: "x".to_string(),
            severity: None,
            source: None,
        };
        assert!(req.validate().is_err());
    }
}
