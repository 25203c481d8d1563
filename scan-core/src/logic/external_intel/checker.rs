//! External Check Aggregator
//!
//! Local blocklist + brand mimic + mọi provider chạy song song.
//! Provider lỗi chỉ được log, không làm hỏng kết quả.

use std::sync::Arc;

use tokio::task::JoinSet;

use super::community::brand_mimic_sources;
use super::types::{ExternalCheck, ThreatIntelProvider};
use crate::logic::lists::DomainLists;

pub struct ExternalChecker {
    lists: Arc<dyn DomainLists>,
    providers: Vec<Arc<dyn ThreatIntelProvider>>,
}

impl ExternalChecker {
    pub fn new(lists: Arc<dyn DomainLists>) -> Self {
        Self {
            lists,
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ThreatIntelProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Names of providers that will actually be queried
    pub fn active_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name().to_string())
            .collect()
    }

    pub async fn check(&self, url: &str, domain: &str) -> ExternalCheck {
        let mut tasks = JoinSet::new();
        for provider in self.providers.iter().filter(|p| p.is_configured()) {
            let provider = Arc::clone(provider);
            let url = url.to_string();
            let domain = domain.to_string();
            tasks.spawn(async move {
                let name = provider.name().to_string();
                (name, provider.check_url(&url, &domain).await)
            });
        }

        let mut result = ExternalCheck::default();

        match self.lists.blocklist_entry(domain).await {
            Ok(Some(entry)) => result.sources.push(format!(
                "Blocklist: {}",
                entry.reason.as_deref().unwrap_or("Đã bị chặn")
            )),
            Ok(None) => {}
            Err(e) => log::warn!("Blocklist lookup failed for {}: {}", domain, e),
        }

        result.sources.extend(brand_mimic_sources(domain));

        let mut findings = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(finding))) => findings.push(finding),
                Ok((name, Err(e))) => log::warn!("[{}] check failed for {}: {}", name, domain, e),
                Err(e) => log::error!("Provider task panicked: {}", e),
            }
        }

        // Keep provider order stable regardless of completion order
        findings.sort_by_key(|f| {
            self.providers
                .iter()
                .position(|p| p.name() == f.provider)
                .unwrap_or(usize::MAX)
        });

        for finding in &findings {
            if finding.provider == "virustotal" {
                result.virus_total = serde_json::from_value(finding.details.clone()).ok();
            }
            if finding.detected {
                if let Some(summary) = &finding.summary {
                    result.sources.push(summary.clone());
                }
            }
        }

        result.findings = findings;
        result.is_known_scam = !result.sources.is_empty();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ScanError};
    use crate::logic::external_intel::types::ProviderFinding;
    use crate::logic::external_intel::Severity;
    use crate::logic::lists::MemoryDomainLists;
    use async_trait::async_trait;

    struct FixedProvider {
        name: &'static str,
        detected: bool,
        configured: bool,
    }

    #[async_trait]
    impl ThreatIntelProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn check_url(&self, _url: &str, _domain: &str) -> Result<ProviderFinding> {
            Ok(ProviderFinding {
                provider: self.name.to_string(),
                detected: self.detected,
                summary: Some(format!("{}: hit", self.name)),
                details: serde_json::Value::Null,
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ThreatIntelProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn check_url(&self, _url: &str, _domain: &str) -> Result<ProviderFinding> {
            Err(ScanError::Network("timeout".to_string()))
        }
    }

    fn provider(name: &'static str, detected: bool) -> Arc<dyn ThreatIntelProvider> {
        Arc::new(FixedProvider { name, detected, configured: true })
    }

    #[tokio::test]
    async fn test_clean_domain() {
        let checker = ExternalChecker::new(Arc::new(MemoryDomainLists::new()))
            .with_provider(provider("a", false))
            .with_provider(Arc::new(FailingProvider));

        let check = checker.check("https://example.com/", "example.com").await;
        assert!(!check.is_known_scam);
        assert!(check.sources.is_empty());
        assert_eq!(check.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_sources_order() {
        let lists = MemoryDomainLists::new();
        lists.block("vietcombank-login.xyz", Some("Nguồn cộng đồng VN"), Severity::High);

        let checker = ExternalChecker::new(Arc::new(lists))
            .with_provider(provider("first", true))
            .with_provider(provider("second", true))
            .with_provider(Arc::new(FixedProvider { name: "off", detected: true, configured: false }));

        let check = checker
            .check("https://vietcombank-login.xyz/", "vietcombank-login.xyz")
            .await;
        assert!(check.is_known_scam);
        assert_eq!(
            check.sources,
            vec![
                "Blocklist: Nguồn cộng đồng VN".to_string(),
                "Giả mạo Vietcombank".to_string(),
                "first: hit".to_string(),
                "second: hit".to_string(),
            ]
        );
        assert_eq!(checker.active_providers(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_blocklist_without_reason() {
        let lists = MemoryDomainLists::new();
        lists.block("x.test", None, Severity::Low);
        let check = ExternalChecker::new(Arc::new(lists)).check("https://x.test", "x.test").await;
        assert_eq!(check.sources, vec!["Blocklist: Đã bị chặn".to_string()]);
    }
}
