//! External Intelligence Types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// SEVERITY
// ============================================================================

/// Mức độ nghiêm trọng của một entry trong blocklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VIRUSTOTAL
// ============================================================================

/// Thống kê last_analysis_stats của VirusTotal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VTStats {
    pub malicious: u32,
    pub suspicious: u32,
    pub harmless: u32,
    pub undetected: u32,
    pub total: u32,
}

impl VTStats {
    pub fn new(malicious: u32, suspicious: u32, harmless: u32, undetected: u32) -> Self {
        Self {
            malicious,
            suspicious,
            harmless,
            undetected,
            total: malicious + suspicious + harmless + undetected,
        }
    }

    /// Có bị engine nào đánh dấu nguy hiểm không
    pub fn is_detected(&self) -> bool {
        self.malicious > 0 || self.suspicious > 2
    }

    /// Tỷ lệ phát hiện (0.0 - 1.0)
    pub fn detection_ratio(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.malicious + self.suspicious) as f32 / self.total as f32
    }
}

/// Kết quả tra cứu URL trên VirusTotal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VTUrlReport {
    pub detected: bool,
    pub stats: Option<VTStats>,
    /// URL chưa từng được VT scan
    pub not_found: bool,
}

impl VTUrlReport {
    pub fn not_found() -> Self {
        Self {
            detected: false,
            stats: None,
            not_found: true,
        }
    }

    pub fn from_stats(stats: VTStats) -> Self {
        Self {
            detected: stats.is_detected(),
            stats: Some(stats),
            not_found: false,
        }
    }
}

// ============================================================================
// PROVIDER SEAM
// ============================================================================

/// Kết quả từ một nguồn reputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFinding {
    pub provider: String,
    pub detected: bool,
    /// Human readable source line shown to the user when detected
    pub summary: Option<String>,
    /// Provider-specific payload
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl ProviderFinding {
    pub fn clean(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            detected: false,
            summary: None,
            details: serde_json::Value::Null,
        }
    }
}

/// Trait for URL reputation providers
#[async_trait]
pub trait ThreatIntelProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Whether credentials are present; unconfigured providers are skipped
    fn is_configured(&self) -> bool;

    /// Check a URL / domain
    async fn check_url(&self, url: &str, domain: &str) -> Result<ProviderFinding>;
}

// ============================================================================
// AGGREGATED CHECK
// ============================================================================

/// Tổng hợp kết quả từ mọi nguồn bên ngoài
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalCheck {
    pub is_known_scam: bool,
    /// Lines explaining why (blocklist, brand mimic, providers)
    pub sources: Vec<String>,
    pub virus_total: Option<VTUrlReport>,
    pub findings: Vec<ProviderFinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vt_detection_rule() {
        assert!(VTStats::new(1, 0, 60, 10).is_detected());
        assert!(VTStats::new(0, 3, 60, 10).is_detected());
        assert!(!VTStats::new(0, 2, 60, 10).is_detected());
        assert_eq!(VTStats::new(1, 2, 3, 4).total, 10);
    }

    #[test]
    fn test_severity_roundtrip_names() {
        assert_eq!(Severity::from_str("high"), Some(Severity::High));
        assert_eq!(Severity::Critical.as_str(), "CRITICAL");
        assert_eq!(Severity::from_str("urgent"), None);
        assert!(Severity::Critical > Severity::Medium);
    }
}
