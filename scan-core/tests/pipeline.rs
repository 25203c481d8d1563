use std::sync::Arc;

use antiscam_core::logic::ai_bridge::{parse_model_answer, AiClassifier, AiVerdict, DisabledClassifier, WebContent};
use antiscam_core::logic::external_intel::{ExternalChecker, ProviderFinding, ThreatIntelProvider};
use antiscam_core::logic::fetch::PageFetcher;
use antiscam_core::{
    validate_url, CachedDomainLists, DomainLists, Label, MemoryDomainLists, ScanPipeline, Severity,
    VerdictSource,
};
use async_trait::async_trait;

struct Page(&'static str);

#[async_trait]
impl PageFetcher for Page {
    async fn fetch(&self, _url: &str) -> Option<String> {
        Some(self.0.to_string())
    }
}

/// Replays a canned model answer, like the real client does after the HTTP call
struct CannedModel(&'static str);

#[async_trait]
impl AiClassifier for CannedModel {
    fn name(&self) -> &str {
        "canned"
    }

    async fn classify(&self, _url: &str, _domain: &str, content: Option<&WebContent>) -> AiVerdict {
        parse_model_answer(self.0, content.is_some()).unwrap_or_else(|| AiVerdict::unavailable(content.is_some()))
    }
}

struct AlwaysDetected;

#[async_trait]
impl ThreatIntelProvider for AlwaysDetected {
    fn name(&self) -> &str {
        "google_safe_browsing"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn check_url(&self, _url: &str, _domain: &str) -> antiscam_core::Result<ProviderFinding> {
        Ok(ProviderFinding {
            provider: "google_safe_browsing".to_string(),
            detected: true,
            summary: Some("Google Safe Browsing: SOCIAL_ENGINEERING".to_string()),
            details: serde_json::Value::Null,
        })
    }
}

const LOGIN_PAGE: &str = r#"<html lang="vi"><head><title>Đăng nhập</title>
<meta name="description" content="Xác thực tài khoản"></head>
<body><form><input type="password" name="p"><input name="otp"></form>
Nhập mã OTP để nhận thưởng</body></html>"#;

fn build(lists: Arc<dyn DomainLists>, ai: Arc<dyn AiClassifier>, checker: ExternalChecker) -> ScanPipeline {
    ScanPipeline::new(lists, Arc::new(Page(LOGIN_PAGE)), ai, checker)
}

#[tokio::test]
async fn scan_combines_model_and_heuristics() {
    let lists: Arc<dyn DomainLists> = Arc::new(MemoryDomainLists::new());
    let ai = Arc::new(CannedModel("```json\n{\"score\": 90, \"reasons\": [\"Yêu cầu OTP\"]}\n```"));
    let pipeline = build(lists.clone(), ai, ExternalChecker::new(lists));

    let report = pipeline.scan(&validate_url("https://example.com/").unwrap()).await;

    // heuristic 0, model 90 with content: round(90 * 0.7) = 63
    assert_eq!(report.analysis.source, VerdictSource::Combined);
    assert_eq!(report.analysis.score(), 63);
    assert_eq!(report.analysis.label(), Label::Dangerous);
    assert!(report.analysis.reasons().contains(&"🤖 Yêu cầu OTP".to_string()));

    let info = report.website_info.expect("page was fetched");
    assert_eq!(info.title, "Đăng nhập");
    assert!(info.has_login_form);
    assert!(!report.external_check.is_known_scam);
}

#[tokio::test]
async fn provider_hit_raises_to_floor() {
    let lists: Arc<dyn DomainLists> = Arc::new(MemoryDomainLists::new());
    let checker = ExternalChecker::new(lists.clone()).with_provider(Arc::new(AlwaysDetected));
    let pipeline = build(lists, Arc::new(DisabledClassifier), checker);

    let report = pipeline.scan(&validate_url("example.com").unwrap()).await;

    assert_eq!(report.analysis.score(), 80);
    assert_eq!(report.analysis.label(), Label::Dangerous);
    assert_eq!(
        report.analysis.reasons()[0],
        "🚫 Google Safe Browsing: SOCIAL_ENGINEERING"
    );
    assert_eq!(report.external_check.findings.len(), 1);
}

#[tokio::test]
async fn cached_blocklist_overrides_everything() {
    let memory = MemoryDomainLists::new();
    memory.block("example.com", None, Severity::Critical);
    let lists: Arc<dyn DomainLists> = Arc::new(CachedDomainLists::new(memory));
    let ai = Arc::new(CannedModel("{\"score\": 0, \"reasons\": []}"));
    let pipeline = build(lists.clone(), ai, ExternalChecker::new(lists));

    let report = pipeline.scan(&validate_url("https://example.com").unwrap()).await;

    assert_eq!(report.analysis.source, VerdictSource::Blocklist);
    assert_eq!(report.analysis.score(), 100);
    assert_eq!(report.analysis.reasons(), &["🚫 Đã bị chặn".to_string()]);
    // Intel still reports the blocklist row
    assert_eq!(report.external_check.sources, vec!["Blocklist: Đã bị chặn".to_string()]);
}

#[tokio::test]
async fn invalid_urls_are_rejected_before_scanning() {
    assert!(validate_url("").is_err());
    assert!(validate_url("ftp://example.com").is_err());
    assert!(validate_url("http://192.168.1.1/admin").is_err());
}
