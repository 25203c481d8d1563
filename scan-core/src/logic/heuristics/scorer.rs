//! Heuristic Scorer
//!
//! Input: URL đã chuẩn hóa + domain
//! Output: HeuristicResult (0-100, cộng dồn, có trần)

use serde::{Deserialize, Serialize};

use super::rules::*;
use crate::constants::{
    BIO_LINK_SERVICES, BRAND_KEYWORDS, GAMBLING_KEYWORDS, LINK_SHORTENERS,
    LONG_DOMAIN_THRESHOLD, SUSPICIOUS_TLDS,
};

/// Kết quả chấm điểm heuristic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicResult {
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Apply every rule and return the capped score with its reasons
pub fn run_heuristics(url: &str, domain: &str) -> HeuristicResult {
    let mut score: u32 = 0;
    let mut reasons = Vec::new();
    let url_lower = url.to_lowercase();
    let domain_lower = domain.to_lowercase();

    if !url_lower.starts_with("https://") {
        score += NO_HTTPS_POINTS;
        reasons.push("Không có HTTPS".to_string());
    }

    if LINK_SHORTENERS.iter().any(|s| domain_lower.contains(s)) {
        score += LINK_SHORTENER_POINTS;
        reasons.push("⚠️ Link rút gọn".to_string());
    }
    if BIO_LINK_SERVICES.iter().any(|s| domain_lower.contains(s)) {
        score += BIO_LINK_POINTS;
        reasons.push("⚠️ Bio Link - hay bị lạm dụng".to_string());
    }

    if let Some(tld) = SUSPICIOUS_TLDS.iter().find(|t| domain_lower.ends_with(*t)) {
        score += SUSPICIOUS_TLD_POINTS;
        reasons.push(format!("TLD đáng ngờ: {}", tld));
    }

    if let Some(brand) = impersonated_brand(&domain_lower) {
        score += BRAND_IMPERSONATION_POINTS;
        reasons.push(format!("🚨 Giả mạo \"{}\"", brand));
    }

    let gambling_hits: Vec<&str> = GAMBLING_KEYWORDS
        .iter()
        .copied()
        .filter(|k| domain_lower.contains(k) || url_lower.contains(k))
        .collect();
    match gambling_hits.as_slice() {
        [] => {}
        [only] => {
            score += GAMBLING_WEAK_POINTS;
            reasons.push(format!("⚠️ Dấu hiệu cờ bạc: {}", only));
        }
        _ => {
            score += GAMBLING_STRONG_POINTS;
            reasons.push("🎰 Website cờ bạc!".to_string());
        }
    }

    if GAMBLING_PATTERN.is_match(&domain_lower) {
        score += GAMBLING_PATTERN_POINTS;
        reasons.push("🎰 Pattern cờ bạc".to_string());
    }

    if LUCKY_NUMBERS.is_match(&domain_lower) {
        score += LUCKY_NUMBER_POINTS;
        reasons.push("Số may mắn trong domain".to_string());
    }

    if IPV4_HOST.is_match(domain) {
        score += IP_HOST_POINTS;
        reasons.push("Dùng IP thay domain".to_string());
    }

    if CYRILLIC.is_match(url) {
        score += CYRILLIC_POINTS;
        reasons.push("🚨 Ký tự Cyrillic giả mạo!".to_string());
    }

    if domain.chars().count() > LONG_DOMAIN_THRESHOLD {
        score += LONG_DOMAIN_POINTS;
        reasons.push("Domain quá dài".to_string());
    }

    HeuristicResult {
        score: score.min(MAX_SCORE) as u8,
        reasons,
    }
}

/// First brand keyword found in a domain that is not the brand's own site
fn impersonated_brand(domain: &str) -> Option<&'static str> {
    BRAND_KEYWORDS.iter().copied().find(|brand| {
        if !domain.contains(brand) {
            return false;
        }
        let official = [
            format!("{}.com", brand),
            format!("{}.vn", brand),
            format!("{}.com.vn", brand),
        ];
        !official
            .iter()
            .any(|p| domain == p || domain.ends_with(&format!(".{}", p)))
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_https_site() {
        let result = run_heuristics("https://vnexpress.net/", "vnexpress.net");
        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_no_https_only() {
        let result = run_heuristics("http://vnexpress.net/", "vnexpress.net");
        assert_eq!(result.score, 15);
        assert_eq!(result.reasons, vec!["Không có HTTPS".to_string()]);
    }

    #[test]
    fn test_fake_bank_domain() {
        let result = run_heuristics(
            "https://vietcombank-login.xyz/",
            "vietcombank-login.xyz",
        );
        // TLD + brand impersonation
        assert_eq!(result.score, 55);
        assert!(result.reasons.iter().any(|r| r.contains("vietcombank")));
        assert!(result.reasons.iter().any(|r| r.contains(".xyz")));
    }

    #[test]
    fn test_official_brand_subdomain_not_flagged() {
        let result = run_heuristics(
            "https://portal.vietcombank.com.vn/",
            "portal.vietcombank.com.vn",
        );
        assert!(!result.reasons.iter().any(|r| r.contains("Giả mạo")));
    }

    #[test]
    fn test_only_first_brand_counted() {
        let result = run_heuristics("https://shopee-lazada.net/", "shopee-lazada.net");
        let brand_reasons = result.reasons.iter().filter(|r| r.contains("Giả mạo")).count();
        assert_eq!(brand_reasons, 1);
    }

    #[test]
    fn test_gambling_site_capped() {
        let result = run_heuristics("http://go88vip.club/", "go88vip.club");
        assert_eq!(result.score, 100);
        assert!(result.reasons.iter().any(|r| r.contains("cờ bạc")));
    }

    #[test]
    fn test_single_gambling_keyword() {
        let result = run_heuristics("https://example.com/bonus", "example.com");
        assert_eq!(result.score, 25);
        assert_eq!(result.reasons, vec!["⚠️ Dấu hiệu cờ bạc: bonus".to_string()]);
    }

    #[test]
    fn test_shortener_and_ip() {
        let short = run_heuristics("https://bit.ly/abc", "bit.ly");
        assert!(short.reasons.contains(&"⚠️ Link rút gọn".to_string()));

        let ip = run_heuristics("https://45.77.10.2/", "45.77.10.2");
        assert!(ip.reasons.contains(&"Dùng IP thay domain".to_string()));
    }

    #[test]
    fn test_cyrillic_in_path() {
        let result = run_heuristics("https://example.com/аpple", "example.com");
        assert!(result.reasons.iter().any(|r| r.contains("Cyrillic")));
    }

    #[test]
    fn test_cyrillic_survives_validation() {
        let url = crate::logic::normalize::validate_url("https://аpple.com/đăng-nhập").unwrap();
        let result = run_heuristics(&url.raw, &url.domain);
        assert!(result.reasons.iter().any(|r| r.contains("Cyrillic")));
        assert!(result.score >= 40);
    }

    #[test]
    fn test_long_domain() {
        let domain = "this-is-a-really-long-domain-name-for-testing.com";
        let result = run_heuristics(&format!("https://{}/", domain), domain);
        assert!(result.reasons.contains(&"Domain quá dài".to_string()));
    }
}
