//! Security headers + client IP

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::AppError;

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "camera=(), microphone=(), geolocation=()"),
];

/// Middleware: attach security headers to every response
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for &(name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    response
}

/// Caller IP from proxy headers: Cloudflare, then the first X-Forwarded-For hop, then X-Real-IP
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(cf) = header("cf-connecting-ip") {
        return Some(cf.to_string());
    }
    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next().map(str::trim).filter(|ip| !ip.is_empty()) {
            return Some(first.to_string());
        }
    }
    header("x-real-ip").map(str::to_string)
}

/// Client IP extractor; "unknown" when no proxy header is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn known(&self) -> Option<String> {
        (self.0 != "unknown").then(|| self.0.clone())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(
            extract_client_ip(&parts.headers).unwrap_or_else(|| "unknown".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_unknown_ip_not_stored() {
        assert_eq!(ClientIp("unknown".to_string()).known(), None);
        let ip = ClientIp("14.161.2.3".to_string());
        assert_eq!(ip.known().as_deref(), Some("14.161.2.3"));
        assert_eq!(ip.as_str(), "14.161.2.3");
    }

    #[test]
    fn test_cloudflare_wins() {
        let h = headers(&[("x-forwarded-for", "1.1.1.1"), ("cf-connecting-ip", "2.2.2.2")]);
        assert_eq!(extract_client_ip(&h).as_deref(), Some("2.2.2.2"));
    }

    #[test]
    fn test_first_forwarded_hop() {
        let h = headers(&[("x-forwarded-for", " 3.3.3.3 , 10.0.0.1"), ("x-real-ip", "4.4.4.4")]);
        assert_eq!(extract_client_ip(&h).as_deref(), Some("3.3.3.3"));
    }

    #[test]
    fn test_real_ip_and_missing() {
        assert_eq!(
            extract_client_ip(&headers(&[("x-real-ip", "5.5.5.5")])).as_deref(),
            Some("5.5.5.5")
        );
        assert_eq!(extract_client_ip(&HeaderMap::new()), None);
    }
}
