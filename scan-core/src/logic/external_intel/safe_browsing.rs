//! Google Safe Browsing Lookup (v4 `threatMatches:find`)

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::types::{ProviderFinding, ThreatIntelProvider};
use crate::error::{Result, ScanError};

const SAFE_BROWSING_ENDPOINT: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";
const CLIENT_ID: &str = "antiscam-vn";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const THREAT_TYPES: &[&str] = &[
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreatMatch {
    threat_type: String,
}

pub struct SafeBrowsingClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl SafeBrowsingClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Threat types matched for a URL (empty = clean)
    pub async fn lookup(&self, url: &str) -> Result<Vec<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ScanError::NotConfigured("Google Safe Browsing"))?;

        let body = json!({
            "client": { "clientId": CLIENT_ID, "clientVersion": crate::constants::APP_VERSION },
            "threatInfo": {
                "threatTypes": THREAT_TYPES,
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": url }]
            }
        });

        let response = self
            .http
            .post(SAFE_BROWSING_ENDPOINT)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Http { service: "Google Safe Browsing", status: status.as_u16() });
        }

        let text = response.text().await?;
        parse_matches(&text)
    }
}

#[async_trait]
impl ThreatIntelProvider for SafeBrowsingClient {
    fn name(&self) -> &str {
        "google_safe_browsing"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn check_url(&self, url: &str, _domain: &str) -> Result<ProviderFinding> {
        let threats = self.lookup(url).await?;
        if threats.is_empty() {
            return Ok(ProviderFinding::clean(self.name()));
        }

        Ok(ProviderFinding {
            provider: self.name().to_string(),
            detected: true,
            summary: Some(format!("Google Safe Browsing: {}", threats.join(", "))),
            details: json!({ "threats": threats }),
        })
    }
}

/// Distinct threat types of a `threatMatches:find` response (`{}` = no match)
pub fn parse_matches(body: &str) -> Result<Vec<String>> {
    let parsed: MatchesResponse = serde_json::from_str(body)?;
    let mut threats: Vec<String> = Vec::new();
    for m in parsed.matches {
        if !threats.contains(&m.threat_type) {
            threats.push(m.threat_type);
        }
    }
    Ok(threats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_matches("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_matches_dedupes() {
        let body = r#"{"matches":[
            {"threatType":"SOCIAL_ENGINEERING","platformType":"ANY_PLATFORM","threat":{"url":"http://x"}},
            {"threatType":"SOCIAL_ENGINEERING","platformType":"WINDOWS","threat":{"url":"http://x"}},
            {"threatType":"MALWARE","platformType":"ANY_PLATFORM","threat":{"url":"http://x"}}
        ]}"#;
        assert_eq!(parse_matches(body).unwrap(), vec!["SOCIAL_ENGINEERING", "MALWARE"]);
    }
}
