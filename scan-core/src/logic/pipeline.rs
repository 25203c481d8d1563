//! Scan Pipeline
//!
//! normalize → whitelist/blocklist → page fetch → heuristics + AI → combine
//! → external intel (known-scam floor) → website info + category.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ai_bridge::{AiClassifier, DisabledClassifier, GroqClassifier, GroqConfig, WebContent};
use super::external_intel::{
    AbuseIpDbClient, ExternalCheck, ExternalChecker, SafeBrowsingClient, VirusTotalClient,
};
use super::fetch::{HttpPageFetcher, PageFetcher};
use super::heuristics::run_heuristics;
use super::lists::DomainLists;
use super::normalize::NormalizedUrl;
use super::threat::{
    classify_with_rules, escalate_known_scam, Classification, Label, ScoreBreakdown, ScoringRules,
};
use super::website::{analyze_html, detect_category_from_domain, CategoryGuess, WebsiteInfo};
use crate::constants::{APP_NAME, APP_VERSION};
use crate::error::Result;

pub use super::threat::VerdictSource;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

const WHITELIST_REASON: &str = "✅ Domain tin cậy";
const BLOCKLIST_DEFAULT_REASON: &str = "Đã bị chặn";

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub groq: GroqConfig,
    pub virustotal_api_key: Option<String>,
    pub safe_browsing_api_key: Option<String>,
    pub abuseipdb_api_key: Option<String>,
    pub fetch_timeout: Duration,
    pub rules: ScoringRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            groq: GroqConfig::default(),
            virustotal_api_key: None,
            safe_browsing_api_key: None,
            abuseipdb_api_key: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            rules: ScoringRules::default(),
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Verdict for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub url: String,
    pub domain: String,
    pub source: VerdictSource,
    #[serde(flatten)]
    pub classification: Classification,
}

impl AnalysisResult {
    pub fn score(&self) -> u8 {
        self.classification.score
    }

    pub fn label(&self) -> Label {
        self.classification.label
    }

    pub fn reasons(&self) -> &[String] {
        &self.classification.reasons
    }

    fn forced(url: &NormalizedUrl, source: VerdictSource, score: u8, label: Label, reason: String) -> Self {
        Self {
            url: url.href.clone(),
            domain: url.domain.clone(),
            source,
            classification: Classification {
                score,
                label,
                reasons: vec![reason],
                ai_confidence: 1.0,
                breakdown: ScoreBreakdown {
                    heuristic_score: score,
                    ai_score: score,
                    ai_weight: 0.0,
                    combined_score: score,
                    known_scam_floor: false,
                    final_score: score,
                },
            },
        }
    }
}

/// Full scan: verdict + context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub website_info: Option<WebsiteInfo>,
    pub external_check: ExternalCheck,
    pub category: CategoryGuess,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct ScanPipeline {
    lists: Arc<dyn DomainLists>,
    fetcher: Arc<dyn PageFetcher>,
    ai: Arc<dyn AiClassifier>,
    checker: ExternalChecker,
    rules: ScoringRules,
}

impl ScanPipeline {
    pub fn new(
        lists: Arc<dyn DomainLists>,
        fetcher: Arc<dyn PageFetcher>,
        ai: Arc<dyn AiClassifier>,
        checker: ExternalChecker,
    ) -> Self {
        Self {
            lists,
            fetcher,
            ai,
            checker,
            rules: ScoringRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: ScoringRules) -> Self {
        self.rules = rules;
        self
    }

    /// Production wiring: reqwest fetcher, Groq model, every reputation provider
    pub fn from_config(config: PipelineConfig, lists: Arc<dyn DomainLists>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("{}/{}", APP_NAME, APP_VERSION))
            .build()?;

        let ai: Arc<dyn AiClassifier> = if config.groq.is_configured() {
            log::info!("AI classifier: Groq ({})", config.groq.model);
            Arc::new(GroqClassifier::new(http.clone(), config.groq))
        } else {
            log::warn!("GROQ_API_KEY not configured, scoring with heuristics only");
            Arc::new(DisabledClassifier)
        };

        let checker = ExternalChecker::new(Arc::clone(&lists))
            .with_provider(Arc::new(VirusTotalClient::new(http.clone(), config.virustotal_api_key)))
            .with_provider(Arc::new(SafeBrowsingClient::new(http.clone(), config.safe_browsing_api_key)))
            .with_provider(Arc::new(AbuseIpDbClient::new(http, config.abuseipdb_api_key)));
        log::info!("Threat intel providers: {:?}", checker.active_providers());

        let fetcher = Arc::new(HttpPageFetcher::new(config.fetch_timeout)?);

        Ok(Self::new(lists, fetcher, ai, checker).with_rules(config.rules))
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn checker(&self) -> &ExternalChecker {
        &self.checker
    }

    pub fn ai_name(&self) -> &str {
        self.ai.name()
    }

    /// Whitelist / blocklist verdict, if the domain is on either list
    async fn check_overrides(&self, url: &NormalizedUrl) -> Option<AnalysisResult> {
        match self.lists.is_whitelisted(&url.domain).await {
            Ok(true) => {
                return Some(AnalysisResult::forced(
                    url,
                    VerdictSource::Whitelist,
                    0,
                    Label::Safe,
                    WHITELIST_REASON.to_string(),
                ))
            }
            Ok(false) => {}
            Err(e) => log::warn!("Whitelist lookup failed for {}: {}", url.domain, e),
        }

        match self.lists.blocklist_entry(&url.domain).await {
            Ok(Some(entry)) => Some(AnalysisResult::forced(
                url,
                VerdictSource::Blocklist,
                100,
                Label::Dangerous,
                format!("🚫 {}", entry.reason.as_deref().unwrap_or(BLOCKLIST_DEFAULT_REASON)),
            )),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Blocklist lookup failed for {}: {}", url.domain, e);
                None
            }
        }
    }

    /// Heuristics + AI over an already fetched page
    async fn classify_page(&self, url: &NormalizedUrl, page: Option<&str>) -> AnalysisResult {
        let content = page.map(WebContent::from_html);
        let heuristic = run_heuristics(&url.raw, &url.domain);
        let ai = self.ai.classify(&url.href, &url.domain, content.as_ref()).await;

        let classification = classify_with_rules(&heuristic, &ai, &self.rules);
        log::debug!(
            "{} → heuristic {} / ai {} (w={}) = {} {}",
            url.domain,
            heuristic.score,
            ai.score,
            classification.breakdown.ai_weight,
            classification.score,
            classification.label
        );

        AnalysisResult {
            url: url.href.clone(),
            domain: url.domain.clone(),
            source: VerdictSource::Combined,
            classification,
        }
    }

    /// Verdict only: overrides, else fetch + heuristics + AI
    pub async fn analyze_url(&self, url: &NormalizedUrl) -> AnalysisResult {
        if let Some(forced) = self.check_overrides(url).await {
            return forced;
        }
        let page = self.fetcher.fetch(&url.href).await;
        self.classify_page(url, page.as_deref()).await
    }

    /// Verdict + external intel + website info
    pub async fn scan(&self, url: &NormalizedUrl) -> ScanReport {
        let analysis = async {
            let forced = self.check_overrides(url).await;
            let page = self.fetcher.fetch(&url.href).await;
            let analysis = match forced {
                Some(forced) => forced,
                None => self.classify_page(url, page.as_deref()).await,
            };
            (analysis, page)
        };

        let ((mut analysis, page), external_check) =
            tokio::join!(analysis, self.checker.check(&url.href, &url.domain));

        if !analysis.source.is_override() && external_check.is_known_scam {
            escalate_known_scam(
                &mut analysis.classification,
                &external_check.sources,
                &self.rules,
            );
        }

        let website_info = page.as_deref().map(|html| analyze_html(&url.href, &url.domain, html));

        log::info!(
            "Scanned {} → {} ({}, {:?})",
            url.domain,
            analysis.label(),
            analysis.score(),
            analysis.source
        );

        ScanReport {
            analysis,
            website_info,
            external_check,
            category: detect_category_from_domain(&url.domain),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ai_bridge::AiVerdict;
    use crate::logic::external_intel::Severity;
    use crate::logic::lists::MemoryDomainLists;
    use crate::logic::normalize::validate_url;
    use async_trait::async_trait;

    struct StaticFetcher(Option<&'static str>);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct FixedAi(u8);

    #[async_trait]
    impl AiClassifier for FixedAi {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _url: &str, _domain: &str, content: Option<&WebContent>) -> AiVerdict {
            AiVerdict {
                score: self.0,
                confidence: 0.85,
                reasons: vec!["🤖 test".to_string()],
                content_fetched: content.is_some(),
            }
        }
    }

    fn pipeline(lists: MemoryDomainLists, page: Option<&'static str>, ai: Arc<dyn AiClassifier>) -> ScanPipeline {
        let lists: Arc<dyn DomainLists> = Arc::new(lists);
        ScanPipeline::new(
            Arc::clone(&lists),
            Arc::new(StaticFetcher(page)),
            ai,
            ExternalChecker::new(lists),
        )
    }

    #[tokio::test]
    async fn test_whitelist_forces_safe() {
        let lists = MemoryDomainLists::new();
        lists.allow("go88vip.club");
        let p = pipeline(lists, None, Arc::new(FixedAi(100)));

        let result = p.analyze_url(&validate_url("go88vip.club").unwrap()).await;
        assert_eq!(result.source, VerdictSource::Whitelist);
        assert_eq!(result.score(), 0);
        assert_eq!(result.label(), Label::Safe);
        assert_eq!(result.reasons(), &["✅ Domain tin cậy".to_string()]);
        assert_eq!(result.classification.ai_confidence, 1.0);
    }

    #[tokio::test]
    async fn test_blocklist_forces_dangerous() {
        let lists = MemoryDomainLists::new();
        lists.block("example.com", Some("Lừa đảo đầu tư"), Severity::High);
        let p = pipeline(lists, None, Arc::new(FixedAi(0)));

        let result = p.analyze_url(&validate_url("https://example.com").unwrap()).await;
        assert_eq!(result.source, VerdictSource::Blocklist);
        assert_eq!(result.score(), 100);
        assert_eq!(result.label(), Label::Dangerous);
        assert_eq!(result.reasons(), &["🚫 Lừa đảo đầu tư".to_string()]);
        assert_eq!(result.classification.breakdown.heuristic_score, 100);
    }

    #[tokio::test]
    async fn test_heuristics_only_without_ai() {
        let p = pipeline(MemoryDomainLists::new(), None, Arc::new(DisabledClassifier));
        let result = p.analyze_url(&validate_url("https://example.com/bonus").unwrap()).await;
        assert_eq!(result.source, VerdictSource::Combined);
        assert_eq!(result.score(), 25);
        assert_eq!(result.label(), Label::Safe);
        assert_eq!(result.classification.ai_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_homograph_url_scores_cyrillic() {
        let p = pipeline(MemoryDomainLists::new(), None, Arc::new(DisabledClassifier));
        let result = p.analyze_url(&validate_url("https://аpple.com/đăng-nhập").unwrap()).await;

        assert!(result.reasons().iter().any(|r| r.contains("Cyrillic")));
        assert!(result.score() >= 40);
        assert_ne!(result.label(), Label::Safe);
    }

    #[tokio::test]
    async fn test_ai_weight_follows_content() {
        let html = Some("<html><head><title>Shop</title></head><body>Xin chào</body></html>");
        let with_page = pipeline(MemoryDomainLists::new(), html, Arc::new(FixedAi(90)));
        let without_page = pipeline(MemoryDomainLists::new(), None, Arc::new(FixedAi(90)));
        let url = validate_url("https://example.com/").unwrap();

        // heuristic 0: 0.7 * 90 = 63, 0.4 * 90 = 36
        assert_eq!(with_page.analyze_url(&url).await.score(), 63);
        assert_eq!(without_page.analyze_url(&url).await.score(), 36);
    }

    #[tokio::test]
    async fn test_scan_applies_known_scam_floor() {
        let p = pipeline(MemoryDomainLists::new(), None, Arc::new(DisabledClassifier));
        let report = p.scan(&validate_url("https://vietcombank-login.xyz").unwrap()).await;

        assert!(report.external_check.is_known_scam);
        assert!(report.analysis.classification.breakdown.known_scam_floor);
        assert_eq!(report.analysis.score(), 80);
        assert_eq!(report.analysis.label(), Label::Dangerous);
        assert_eq!(report.analysis.reasons()[0], "🚫 Giả mạo Vietcombank");
        assert!(report.website_info.is_none());
        assert_eq!(report.category.category, "Ngân hàng");
    }

    #[tokio::test]
    async fn test_scan_keeps_whitelist_over_intel() {
        let lists = MemoryDomainLists::new();
        lists.allow("vietcombank-login.xyz");
        let p = pipeline(lists, Some("<title>x</title>"), Arc::new(DisabledClassifier));
        let report = p.scan(&validate_url("https://vietcombank-login.xyz").unwrap()).await;

        assert!(report.external_check.is_known_scam);
        assert_eq!(report.analysis.score(), 0);
        assert_eq!(report.analysis.label(), Label::Safe);
        assert!(report.website_info.is_some());
    }
}
