//! API key model (BUSINESS+)
//!
//! Keys look like `as_` + 32 alphanumerics. The plaintext is returned once;
//! only its SHA-256 and the first 8 characters are stored.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub const API_KEY_PREFIX: &str = "as_";
pub const API_KEY_RANDOM_LEN: usize = 32;
pub const MAX_ACTIVE_KEYS: i64 = 10;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub prefix: String,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApiKey {
    pub name: String,
}

/// Plaintext key + what gets stored
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub plaintext: String,
    pub hash: String,
    pub prefix: String,
}

pub fn hash_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

pub fn generate_key() -> GeneratedKey {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    let plaintext = format!("{}{}", API_KEY_PREFIX, random);

    GeneratedKey {
        hash: hash_key(&plaintext),
        prefix: plaintext.chars().take(8).collect(),
        plaintext,
    }
}

impl ApiKey {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        name: &str,
        key: &GeneratedKey,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (user_id, name, key_hash, prefix)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(name)
        .bind(&key.hash)
        .bind(&key.prefix)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC"
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_active(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM api_keys WHERE user_id = $1 AND is_active = true")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Active key by plaintext; bumps `last_used_at`
    pub async fn authenticate(pool: &PgPool, plaintext: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            UPDATE api_keys SET last_used_at = NOW()
            WHERE key_hash = $1 AND is_active = true
            RETURNING *
            "#
        )
        .bind(hash_key(plaintext))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_shape() {
        let key = generate_key();
        assert!(key.plaintext.starts_with("as_"));
        assert_eq!(key.plaintext.len(), 3 + API_KEY_RANDOM_LEN);
        assert!(key.plaintext[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(key.prefix, &key.plaintext[..8]);
        assert_eq!(key.hash, hash_key(&key.plaintext));
        assert_eq!(key.hash.len(), 64);
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_key().plaintext, generate_key().plaintext);
    }
}
