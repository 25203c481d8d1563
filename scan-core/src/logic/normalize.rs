//! URL Normalization
//!
//! Chuẩn hóa và kiểm tra URL người dùng gửi lên trước khi đưa vào pipeline.
//! Tất cả thông báo lỗi là tiếng Việt vì được trả thẳng cho client.

use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::constants::{MAX_HOST_LENGTH, MAX_URL_LENGTH};
use crate::error::{Result, ScanError};

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").expect("static regex"));

/// URL đã qua kiểm tra
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUrl {
    /// Serialized form of the parsed URL (punycode host, percent-encoded path)
    pub href: String,
    /// Trimmed input with scheme, as typed; heuristics read Unicode from here
    pub raw: String,
    /// Lower-cased host
    pub domain: String,
    pub is_https: bool,
}

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.href
    }
}

/// Validate and normalize user input into a scannable URL
pub fn validate_url(input: &str) -> Result<NormalizedUrl> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidUrl("URL không được để trống".to_string()));
    }

    if trimmed.chars().count() > MAX_URL_LENGTH {
        return Err(ScanError::InvalidUrl(format!(
            "URL quá dài (tối đa {} ký tự)",
            MAX_URL_LENGTH
        )));
    }

    let candidate = if SCHEME.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|_| ScanError::InvalidUrl("URL không hợp lệ".to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ScanError::InvalidUrl("Chỉ hỗ trợ HTTP/HTTPS".to_string()));
    }

    let host = parsed
        .host()
        .ok_or_else(|| ScanError::InvalidUrl("URL không hợp lệ".to_string()))?;

    if host_len(&host) > MAX_HOST_LENGTH {
        return Err(ScanError::InvalidUrl("URL không hợp lệ".to_string()));
    }

    if is_private_host(&host) {
        return Err(ScanError::InvalidUrl("Không hỗ trợ địa chỉ nội bộ".to_string()));
    }

    let domain = match &host {
        Host::Domain(d) => d.to_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };

    Ok(NormalizedUrl {
        is_https: parsed.scheme() == "https",
        href: parsed.to_string(),
        raw: candidate,
        domain,
    })
}

fn host_len(host: &Host<&str>) -> usize {
    match host {
        Host::Domain(d) => d.trim_end_matches('.').len(),
        Host::Ipv4(_) | Host::Ipv6(_) => 0,
    }
}

/// Whether a request target points at the local machine or a private network.
/// Checked again on every redirect hop of a page fetch.
pub fn is_private_url(url: &Url) -> bool {
    url.host().map_or(true, |host| is_private_host(&host))
}

/// Hosts that resolve to the local machine or a private network
fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(d) => {
            let d = d.to_lowercase();
            d == "localhost" || d.ends_with(".localhost") || d.ends_with(".local")
        }
        Host::Ipv4(ip) => is_private_ipv4(ip),
        Host::Ipv6(ip) => is_private_ipv6(ip),
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    // fc00::/7 unique local, fe80::/10 link local
    let first = ip.segments()[0];
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

/// Extract lower-cased hostname, tolerant of missing scheme
pub fn extract_domain(url: &str) -> String {
    let candidate = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    Url::parse(&candidate)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_matches(|c| c == '[' || c == ']').to_lowercase()))
        .unwrap_or_else(|| url.to_lowercase())
}

/// Root domain (`chat.zalo.me` → `zalo.me`, `shop.abc.com.vn` → `abc.com.vn`)
pub fn extract_root_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 {
        return domain.to_string();
    }

    // .com.vn, .co.uk ...
    if parts.len() >= 3 && parts[parts.len() - 2].len() <= 3 {
        return parts[parts.len() - 3..].join(".");
    }

    parts[parts.len() - 2..].join(".")
}

/// Strip markup from free text submitted by users
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let truncated: String = input.trim().chars().take(max_len).collect();
    HTML_TAG
        .replace_all(&truncated, "")
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err_message(input: &str) -> String {
        match validate_url(input) {
            Err(ScanError::InvalidUrl(msg)) => msg,
            other => panic!("expected InvalidUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_prepends_https() {
        let url = validate_url("Example.COM/path").unwrap();
        assert_eq!(url.href, "https://example.com/path");
        assert_eq!(url.domain, "example.com");
        assert!(url.is_https);
    }

    #[test]
    fn test_keeps_http_scheme() {
        let url = validate_url("  http://shop.vn  ").unwrap();
        assert_eq!(url.href, "http://shop.vn/");
        assert!(!url.is_https);
    }

    #[test]
    fn test_empty_and_too_long() {
        assert_eq!(err_message("   "), "URL không được để trống");
        let long = format!("https://a.vn/{}", "x".repeat(2100));
        assert_eq!(err_message(&long), "URL quá dài (tối đa 2048 ký tự)");
    }

    #[test]
    fn test_rejects_private_hosts() {
        for input in [
            "localhost:3000",
            "http://127.0.0.1/admin",
            "192.168.1.1",
            "10.0.0.8",
            "172.20.1.1",
            "printer.local",
            "http://[::1]/",
            "0.0.0.0",
        ] {
            assert_eq!(err_message(input), "Không hỗ trợ địa chỉ nội bộ", "{}", input);
        }
    }

    #[test]
    fn test_public_ip_allowed() {
        let url = validate_url("http://45.77.10.2/login").unwrap();
        assert_eq!(url.domain, "45.77.10.2");
    }

    #[test]
    fn test_raw_keeps_unicode() {
        let url = validate_url("аpple.com/đăng-nhập").unwrap();
        assert_eq!(url.raw, "https://аpple.com/đăng-nhập");
        assert!(url.href.starts_with("https://xn--"));
        assert!(url.domain.starts_with("xn--"));
    }

    #[test]
    fn test_host_length_limit() {
        let label = "a".repeat(63);
        let three = [label.as_str(); 3].join(".");

        let at_limit = format!("https://{}.{}.com/", three, "b".repeat(57));
        assert_eq!(validate_url(&at_limit).unwrap().domain.len(), 253);

        let over = format!("https://{}.{}.com/", three, "b".repeat(58));
        assert_eq!(err_message(&over), "URL không hợp lệ");

        let five_labels = format!("https://{}.com/", [label.as_str(); 5].join("."));
        assert_eq!(err_message(&five_labels), "URL không hợp lệ");
    }

    #[test]
    fn test_is_private_url() {
        for target in ["http://127.0.0.1/", "http://169.254.169.254/latest", "http://localhost:8080", "http://[fd00::1]/"] {
            assert!(is_private_url(&Url::parse(target).unwrap()), "{}", target);
        }
        assert!(!is_private_url(&Url::parse("https://vnexpress.net/").unwrap()));
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(err_message("https://exa mple.com"), "URL không hợp lệ");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://WWW.Shopee.vn/sale"), "www.shopee.vn");
        assert_eq!(extract_domain("tiki.vn/deal"), "tiki.vn");
        assert_eq!(extract_domain("%%%"), "%%%");
    }

    #[test]
    fn test_extract_root_domain() {
        assert_eq!(extract_root_domain("chat.zalo.me"), "zalo.me");
        assert_eq!(extract_root_domain("shop.abc.com.vn"), "abc.com.vn");
        assert_eq!(extract_root_domain("vnexpress.net"), "vnexpress.net");
        assert_eq!(extract_root_domain("localhost"), "localhost");
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  <b>Lừa đảo</b> \"gấp\" ", 100), "Lừa đảo gấp");
        assert_eq!(sanitize_text("abcdef", 3), "abc");
    }
}
