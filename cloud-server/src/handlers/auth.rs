//! Authentication handlers

use axum::{extract::State, Json};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use jsonwebtoken::{encode, Header, EncodingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Utc, Duration};
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::UserContext;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserInfo};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // User ID
    pub role: String,     // USER / ADMIN
    pub tier: String,     // FREE / PRO / BUSINESS / ENTERPRISE
    pub exp: usize,       // Expiration timestamp
    pub iat: usize,       // Issued at
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub email: String,
    pub tier: String,
}

/// Login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();
    let user = User::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    verify_password(&req.password, &user.password_hash)?;

    let token = issue_token(&user, &state.config.jwt_secret, state.config.jwt_expiration_hours)?;

    Ok(Json(LoginResponse {
        token,
        user: user.to_info(),
    }))
}

/// Register a FREE / USER account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    if User::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::AlreadyExists("Email đã được đăng ký".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let user = User::create(&state.pool, &email, name, &password_hash).await?;

    tracing::info!("New user registered: {} ({})", user.email, user.id);

    Ok(Json(RegisterResponse {
        user_id: user.id,
        email: user.email,
        tier: user.tier,
    }))
}

/// Current user, fresh from the database
pub async fn me(
    State(state): State<AppState>,
    ctx: UserContext,
) -> AppResult<Json<UserInfo>> {
    let user = User::find_by_id(&state.pool, ctx.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user.to_info()))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::InternalError(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

/// Generate JWT token
pub fn issue_token(user: &User, secret: &str, expiration_hours: u64) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        tier: user.tier().as_str().to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes())
    ).map_err(|e| AppError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("mat-khau-123").unwrap();
        assert!(verify_password("mat-khau-123", &hash).is_ok());
        assert!(matches!(
            verify_password("sai-mat-khau", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }
}
