//! Authentication middleware
//!
//! - `require_user_auth`: JWT bearer, tier and role reloaded from the user row
//! - `optional_auth`: `X-API-Key`, JWT bearer, or anonymous (`POST /scan`)
//! - `require_admin_auth`: admin JWT or `Bearer {ADMIN_SECRET}`, 50/min per IP

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::{header::AUTHORIZATION, HeaderMap},
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use antiscam_core::{LimitKind, Tier};

use crate::{AppState, AppError};
use crate::handlers::auth::Claims;
use crate::middleware::security::extract_client_ip;
use crate::models::{ApiKey, User, UserRole};

pub const API_KEY_HEADER: &str = "x-api-key";

/// User context extracted from JWT (or from an API key's owner)
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub role: String,
    pub tier: Tier,
}

impl UserContext {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(UserRole::Admin.as_str())
    }

    fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role.clone(),
            tier: user.tier(),
        }
    }
}

/// Tier gate: watchlist
pub fn require_watchlist_tier(user: &UserContext) -> Result<(), AppError> {
    if !user.tier.can_use_watchlist() {
        return Err(AppError::forbidden("Watchlist chỉ dành cho gói Pro trở lên"));
    }
    Ok(())
}

/// Tier gate: API keys
pub fn require_api_key_tier(user: &UserContext) -> Result<(), AppError> {
    if !user.tier.can_use_api_keys() {
        return Err(AppError::forbidden("API access chỉ dành cho gói Business trở lên"));
    }
    Ok(())
}

/// Who is calling a route with optional auth
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    User(UserContext),
    ApiKey { key_id: Uuid, user: UserContext },
}

impl Caller {
    pub fn user(&self) -> Option<&UserContext> {
        match self {
            Caller::Anonymous => None,
            Caller::User(user) | Caller::ApiKey { user, .. } => Some(user),
        }
    }
}

/// How an admin request was authorized
#[derive(Debug, Clone)]
pub enum AdminContext {
    Secret,
    User(UserContext),
}

/// Decode and validate a JWT into a user context
pub fn decode_user_token(token: &str, secret: &str) -> Result<UserContext, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default()
    ).map_err(|_| AppError::TokenInvalid)?;

    let claims = token_data.claims;

    Ok(UserContext {
        user_id: Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?,
        role: claims.role,
        tier: Tier::from_str(&claims.tier).unwrap_or_default(),
    })
}

/// Middleware: Require user JWT authentication
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(req.headers()).ok_or(AppError::Unauthorized)?;
    let claims = decode_user_token(&token, &state.config.jwt_secret)?;

    // Tier and role from the current row, not the token
    let user = User::find_by_id(&state.pool, claims.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Insert into request extensions
    req.extensions_mut().insert(UserContext::from_user(&user));

    Ok(next.run(req).await)
}

/// Middleware: resolve API key / JWT when present, otherwise anonymous
///
/// A credential that is present but wrong is rejected rather than
/// silently downgraded to anonymous.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let caller = if let Some(key) = api_key {
        let api_key = ApiKey::authenticate(&state.pool, &key)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let owner = User::find_by_id(&state.pool, api_key.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Caller::ApiKey {
            key_id: api_key.id,
            user: UserContext::from_user(&owner),
        }
    } else if let Some(token) = extract_bearer_token(req.headers()) {
        Caller::User(decode_user_token(&token, &state.config.jwt_secret)?)
    } else {
        Caller::Anonymous
    };

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

/// Middleware: admin routes
pub async fn require_admin_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_client_ip(req.headers()).unwrap_or_else(|| "unknown".to_string());
    let decision = state.limiter.check(LimitKind::Admin, &ip);
    if !decision.allowed {
        tracing::warn!("Admin rate limit hit for {}", ip);
        return Err(AppError::window_exhausted(
            "Quá nhiều yêu cầu. Vui lòng thử lại sau.",
            decision.reset_in,
        ));
    }

    let token = extract_bearer_token(req.headers()).ok_or(AppError::Unauthorized)?;

    let admin = match state.config.admin_secret.as_deref() {
        Some(secret) if constant_time_eq(token.as_bytes(), secret.as_bytes()) => AdminContext::Secret,
        _ => {
            let user = decode_user_token(&token, &state.config.jwt_secret)?;
            if !user.is_admin() {
                tracing::warn!("Admin required but user {} has role '{}'", user.user_id, user.role);
                return Err(AppError::forbidden("Admin access required"));
            }
            AdminContext::User(user)
        }
    };

    req.extensions_mut().insert(admin);

    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Implement FromRequestParts for UserContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions
            .get::<Caller>()
            .cloned()
            .unwrap_or(Caller::Anonymous))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::auth::issue_token;
    use crate::models::sample_user;
    use axum::http::HeaderValue;

    #[test]
    fn test_context_follows_stored_tier() {
        let mut user = sample_user(Tier::Business);
        let token = issue_token(&user, "secret", 1).unwrap();
        assert_eq!(decode_user_token(&token, "secret").unwrap().tier, Tier::Business);

        user.tier = Tier::Free.as_str().to_string();
        let ctx = UserContext::from_user(&user);
        assert_eq!(ctx.tier, Tier::Free);
        assert!(matches!(require_api_key_tier(&ctx), Err(AppError::Forbidden(_))));
        assert!(matches!(require_watchlist_tier(&ctx), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_token_round_trip_keeps_tier() {
        let user = sample_user(Tier::Business);
        let token = issue_token(&user, "secret", 1).unwrap();

        let ctx = decode_user_token(&token, "secret").unwrap();
        assert_eq!(ctx.user_id, user.id);
        assert_eq!(ctx.tier, Tier::Business);
        assert!(require_api_key_tier(&ctx).is_ok());
        assert!(!ctx.is_admin());

        assert!(matches!(
            decode_user_token(&token, "other-secret"),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_tier_gates() {
        let free = UserContext { user_id: Uuid::new_v4(), role: "USER".into(), tier: Tier::Free };
        let pro = UserContext { tier: Tier::Pro, ..free.clone() };
        assert!(require_watchlist_tier(&free).is_err());
        assert!(require_watchlist_tier(&pro).is_ok());
        assert!(require_api_key_tier(&pro).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }
}
