//! AbuseIPDB - IP Reputation Check
//!
//! Chỉ áp dụng khi host của URL là địa chỉ IPv4.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{ProviderFinding, ThreatIntelProvider};
use crate::error::{Result, ScanError};

const ABUSEIPDB_ENDPOINT: &str = "https://api.abuseipdb.com/api/v2/check";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Confidence score above which an IP is considered abusive
pub const ABUSIVE_THRESHOLD: u32 = 25;

#[derive(Debug, Deserialize)]
struct CheckResponse {
    data: Option<IpReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpReport {
    #[serde(default)]
    pub abuse_confidence_score: u32,
    #[serde(default)]
    pub total_reports: u32,
    pub last_reported_at: Option<String>,
    pub usage_type: Option<String>,
    pub isp: Option<String>,
}

impl IpReport {
    pub fn is_abusive(&self) -> bool {
        self.abuse_confidence_score > ABUSIVE_THRESHOLD
    }
}

pub struct AbuseIpDbClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl AbuseIpDbClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub async fn check_ip(&self, ip: Ipv4Addr) -> Result<Option<IpReport>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ScanError::NotConfigured("AbuseIPDB"))?;

        let response = self
            .http
            .get(ABUSEIPDB_ENDPOINT)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("ipAddress", ip.to_string()), ("maxAgeInDays", "90".to_string())])
            .header("Key", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Http { service: "AbuseIPDB", status: status.as_u16() });
        }

        let text = response.text().await?;
        parse_check_response(&text)
    }
}

#[async_trait]
impl ThreatIntelProvider for AbuseIpDbClient {
    fn name(&self) -> &str {
        "abuseipdb"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn check_url(&self, _url: &str, domain: &str) -> Result<ProviderFinding> {
        let ip: Ipv4Addr = match domain.parse() {
            Ok(ip) => ip,
            // Not an IP host, nothing to check
            Err(_) => return Ok(ProviderFinding::clean(self.name())),
        };

        let report = match self.check_ip(ip).await? {
            Some(r) => r,
            None => return Ok(ProviderFinding::clean(self.name())),
        };

        let detected = report.is_abusive();
        Ok(ProviderFinding {
            provider: self.name().to_string(),
            detected,
            summary: detected.then(|| {
                format!(
                    "AbuseIPDB: IP bị báo cáo lạm dụng ({}%)",
                    report.abuse_confidence_score
                )
            }),
            details: serde_json::to_value(&report)?,
        })
    }
}

pub fn parse_check_response(body: &str) -> Result<Option<IpReport>> {
    let parsed: CheckResponse = serde_json::from_str(body)?;
    Ok(parsed.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_threshold() {
        let body = r#"{"data":{"ipAddress":"1.2.3.4","abuseConfidenceScore":26,
            "totalReports":12,"lastReportedAt":"2024-01-01T00:00:00+00:00",
            "usageType":"Data Center","isp":"Example"}}"#;
        let report = parse_check_response(body).unwrap().unwrap();
        assert_eq!(report.total_reports, 12);
        assert!(report.is_abusive());

        let low = IpReport { abuse_confidence_score: 25, ..report };
        assert!(!low.is_abusive());
    }

    #[tokio::test]
    async fn test_domain_host_is_skipped() {
        let client = AbuseIpDbClient::new(reqwest::Client::new(), Some("key".to_string()));
        let finding = client.check_url("https://a.vn/", "a.vn").await.unwrap();
        assert!(!finding.detected);
    }
}
