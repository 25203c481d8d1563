//! User model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

use antiscam_core::logic::rate_limit::{DailyUsage, UsageKind};
use antiscam_core::Tier;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: String,
    pub tier: String,
    pub daily_scans: i32,
    pub daily_image_scans: i32,
    pub last_reset_at: DateTime<Utc>,
    pub total_scans: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Email không hợp lệ"))]
    pub email: String,
    #[validate(length(min = 8, message = "Mật khẩu phải có ít nhất 8 ký tự"))]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub tier: String,
    pub scans_today: i32,
    pub total_scans: i32,
}

impl User {
    pub async fn create(
        pool: &PgPool,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role, tier)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(UserRole::User.as_str())
        .bind(Tier::Free.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Zero the daily counters (first request of a new local day)
    pub async fn reset_daily_usage(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET daily_scans = 0, daily_image_scans = 0, last_reset_at = NOW() WHERE id = $1"
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn increment_usage(pool: &PgPool, id: Uuid, kind: UsageKind) -> Result<(), sqlx::Error> {
        let sql = match kind {
            UsageKind::Scan => {
                "UPDATE users SET daily_scans = daily_scans + 1, total_scans = total_scans + 1, updated_at = NOW() WHERE id = $1"
            }
            UsageKind::ImageScan => {
                "UPDATE users SET daily_image_scans = daily_image_scans + 1, updated_at = NOW() WHERE id = $1"
            }
        };
        sqlx::query(sql).bind(id).execute(pool).await?;
        Ok(())
    }

    /// Unknown tier strings fall back to FREE
    pub fn tier(&self) -> Tier {
        Tier::from_str(&self.tier).unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(UserRole::Admin.as_str())
    }

    pub fn usage(&self) -> DailyUsage {
        DailyUsage {
            scans_today: self.daily_scans.max(0) as u32,
            image_scans_today: self.daily_image_scans.max(0) as u32,
            last_reset_at: self.last_reset_at,
        }
    }

    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            tier: self.tier.clone(),
            scans_today: self.daily_scans,
            total_scans: self.total_scans,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(tier: Tier) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: "user@example.com".to_string(),
        password_hash: String::new(),
        name: Some("Minh".to_string()),
        role: UserRole::User.as_str().to_string(),
        tier: tier.as_str().to_string(),
        daily_scans: 3,
        daily_image_scans: 1,
        last_reset_at: now,
        total_scans: 42,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tier_is_free() {
        let mut user = sample_user(Tier::Pro);
        assert_eq!(user.tier(), Tier::Pro);
        user.tier = "GOLD".to_string();
        assert_eq!(user.tier(), Tier::Free);
    }

    #[test]
    fn test_usage_from_row() {
        let mut user = sample_user(Tier::Free);
        user.daily_scans = -1;
        let usage = user.usage();
        assert_eq!(usage.scans_today, 0);
        assert_eq!(usage.image_scans_today, 1);
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            email: "a@b.vn".to_string(),
            password: "long-enough".to_string(),
            name: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_admin_role() {
        let mut user = sample_user(Tier::Free);
        assert!(!user.is_admin());
        user.role = "ADMIN".to_string();
        assert!(user.is_admin());
    }
}
