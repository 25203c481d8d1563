//! VirusTotal Integration Module
//!
//! Mục đích: Query VirusTotal API để kiểm tra URL
//!
//! Features:
//! - URL lookup (v3 `/urls/{id}`)
//! - Rate limiting (free tier: 4 req/min)
//! - Local caching to reduce API calls

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use serde::Deserialize;

use super::types::{ProviderFinding, ThreatIntelProvider, VTStats, VTUrlReport};
use crate::error::{Result, ScanError};

// ============================================================================
// CONSTANTS
// ============================================================================

const VT_API_BASE: &str = "https://www.virustotal.com/api/v3";
const FREE_TIER_RATE_LIMIT: u32 = 4; // requests per minute
const CACHE_MAX_SIZE: usize = 1000;
const CACHE_TTL: Duration = Duration::from_secs(6 * 3600);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct VTApiResponse {
    data: Option<VTApiData>,
}

#[derive(Debug, Deserialize)]
struct VTApiData {
    attributes: Option<VTApiAttributes>,
}

#[derive(Debug, Deserialize)]
struct VTApiAttributes {
    last_analysis_stats: Option<VTApiStats>,
}

#[derive(Debug, Deserialize)]
struct VTApiStats {
    #[serde(default)]
    malicious: u32,
    #[serde(default)]
    suspicious: u32,
    #[serde(default)]
    harmless: u32,
    #[serde(default)]
    undetected: u32,
}

// ============================================================================
// STATE
// ============================================================================

struct CachedReport {
    report: VTUrlReport,
    cached_at: Instant,
}

struct VTState {
    cache: HashMap<String, CachedReport>,
    requests_this_minute: u32,
    minute_start: Instant,
}

impl VTState {
    fn new() -> Self {
        Self {
            cache: HashMap::new(),
            requests_this_minute: 0,
            minute_start: Instant::now(),
        }
    }

    /// Reserve one request slot for this minute
    fn check_rate_limit(&mut self, now: Instant) -> Result<()> {
        if now.duration_since(self.minute_start) >= Duration::from_secs(60) {
            self.minute_start = now;
            self.requests_this_minute = 0;
        }

        if self.requests_this_minute >= FREE_TIER_RATE_LIMIT {
            let wait = 60u64.saturating_sub(now.duration_since(self.minute_start).as_secs());
            return Err(ScanError::RateLimited { retry_after: wait });
        }

        self.requests_this_minute += 1;
        Ok(())
    }

    fn get_cached(&self, url: &str, now: Instant) -> Option<VTUrlReport> {
        self.cache
            .get(url)
            .filter(|c| now.duration_since(c.cached_at) < CACHE_TTL)
            .map(|c| c.report.clone())
    }

    fn cache_report(&mut self, url: &str, report: VTUrlReport, now: Instant) {
        // Evict oldest 10% when full
        if self.cache.len() >= CACHE_MAX_SIZE {
            let mut entries: Vec<_> = self
                .cache
                .iter()
                .map(|(k, v)| (k.clone(), v.cached_at))
                .collect();
            entries.sort_by(|a, b| a.1.cmp(&b.1));

            for (key, _) in entries.into_iter().take(CACHE_MAX_SIZE / 10) {
                self.cache.remove(&key);
            }
        }

        self.cache.insert(
            url.to_string(),
            CachedReport {
                report,
                cached_at: now,
            },
        );
    }
}

// ============================================================================
// VT CLIENT
// ============================================================================

pub struct VirusTotalClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    state: Mutex<VTState>,
}

impl VirusTotalClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        // Sample env files ship "xxx" / "your_" placeholders
        let api_key = api_key.filter(|k| {
            let k = k.trim();
            !k.is_empty() && !k.contains("xxx") && !k.contains("your_")
        });

        Self {
            http,
            api_key,
            base_url: VT_API_BASE.to_string(),
            state: Mutex::new(VTState::new()),
        }
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Look up a URL report
    pub async fn check_url_report(&self, url: &str) -> Result<VTUrlReport> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ScanError::NotConfigured("VirusTotal"))?;

        let now = Instant::now();
        {
            let mut state = self.state.lock();
            if let Some(cached) = state.get_cached(url, now) {
                return Ok(cached);
            }
            state.check_rate_limit(now)?;
        }

        let endpoint = format!("{}/urls/{}", self.base_url, url_id(url));
        let response = self
            .http
            .get(&endpoint)
            .timeout(REQUEST_TIMEOUT)
            .header("x-apikey", api_key)
            .send()
            .await?;

        let report = match response.status().as_u16() {
            404 => VTUrlReport::not_found(),
            401 => return Err(ScanError::InvalidApiKey("VirusTotal")),
            429 => return Err(ScanError::RateLimited { retry_after: 60 }),
            status if !(200..300).contains(&status) => {
                return Err(ScanError::Http { service: "VirusTotal", status })
            }
            _ => {
                let body = response.text().await?;
                match parse_url_report(&body)? {
                    Some(stats) => VTUrlReport::from_stats(stats),
                    None => VTUrlReport {
                        detected: false,
                        stats: None,
                        not_found: false,
                    },
                }
            }
        };

        self.state.lock().cache_report(url, report.clone(), Instant::now());
        Ok(report)
    }

    /// (cache size, cache max)
    pub fn cache_stats(&self) -> (usize, usize) {
        (self.state.lock().cache.len(), CACHE_MAX_SIZE)
    }

    pub fn clear_cache(&self) {
        self.state.lock().cache.clear();
    }
}

#[async_trait]
impl ThreatIntelProvider for VirusTotalClient {
    fn name(&self) -> &str {
        "virustotal"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn check_url(&self, _url: &str, domain: &str) -> Result<ProviderFinding> {
        // Domain root has far better coverage than the exact URL
        let report = self.check_url_report(&format!("https://{}", domain)).await?;

        let summary = match &report.stats {
            Some(stats) if report.detected => Some(format!(
                "VirusTotal: {} engines phát hiện nguy hiểm",
                stats.malicious
            )),
            _ => None,
        };

        Ok(ProviderFinding {
            provider: self.name().to_string(),
            detected: report.detected,
            summary,
            details: serde_json::to_value(&report)?,
        })
    }
}

// ============================================================================
// PARSE / ENCODE
// ============================================================================

/// VT URL identifier: unpadded URL-safe base64 of the URL
pub fn url_id(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

/// `last_analysis_stats` of a `/urls/{id}` response, if any
pub fn parse_url_report(body: &str) -> Result<Option<VTStats>> {
    let parsed: VTApiResponse = serde_json::from_str(body)?;
    Ok(parsed
        .data
        .and_then(|d| d.attributes)
        .and_then(|a| a.last_analysis_stats)
        .map(|s| VTStats::new(s.malicious, s.suspicious, s.harmless, s.undetected)))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_id_has_no_padding() {
        // "https://a.vn" is 12 bytes → 16 chars, no '='
        let id = url_id("https://a.vn");
        assert_eq!(id, "aHR0cHM6Ly9hLnZu");
        assert!(!url_id("https://ab.vn").contains('='));
    }

    #[test]
    fn test_parse_report() {
        let body = r#"{"data":{"id":"x","attributes":{"last_analysis_stats":
            {"malicious":3,"suspicious":1,"harmless":60,"undetected":10,"timeout":0}}}}"#;
        let stats = parse_url_report(body).unwrap().unwrap();
        assert_eq!(stats.malicious, 3);
        assert_eq!(stats.total, 74);
        assert!(stats.is_detected());
    }

    #[test]
    fn test_parse_report_without_stats() {
        assert_eq!(parse_url_report(r#"{"data":{"attributes":{}}}"#).unwrap(), None);
        assert!(parse_url_report("not json").is_err());
    }

    #[test]
    fn test_rate_limit_window() {
        let mut state = VTState::new();
        let now = Instant::now();
        for _ in 0..FREE_TIER_RATE_LIMIT {
            assert!(state.check_rate_limit(now).is_ok());
        }
        assert!(matches!(
            state.check_rate_limit(now),
            Err(ScanError::RateLimited { .. })
        ));
        assert!(state.check_rate_limit(now + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_cache_eviction() {
        let mut state = VTState::new();
        let now = Instant::now();
        for i in 0..CACHE_MAX_SIZE {
            state.cache_report(&format!("u{}", i), VTUrlReport::not_found(), now);
        }
        state.cache_report("new", VTUrlReport::not_found(), now);
        assert_eq!(state.cache.len(), CACHE_MAX_SIZE - CACHE_MAX_SIZE / 10 + 1);
        assert!(state.get_cached("new", now).is_some());
        assert!(state.get_cached("new", now + CACHE_TTL).is_none());
    }

    #[test]
    fn test_placeholder_key_is_unconfigured() {
        let client = VirusTotalClient::new(reqwest::Client::new(), Some("your_key".to_string()));
        assert!(!client.is_configured());
        let client = VirusTotalClient::new(reqwest::Client::new(), Some("abc123".to_string()));
        assert!(client.is_configured());
    }
}
