//! Threat Intelligence Feeds
//!
//! Mục đích: tải các feed phishing/malware miễn phí và chuyển thành entry blocklist
//!
//! Features:
//! - OpenPhish (txt), PhishTank (JSON, cần key), PhishStats (JSON),
//!   URLhaus (CSV), Spamhaus DROP (netblock)
//! - Parser thuần, không I/O → test được offline
//! - PhishTank submission cho báo cáo cộng đồng

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::types::Severity;
use crate::error::{Result, ScanError};

// ============================================================================
// CONSTANTS
// ============================================================================

const OPENPHISH_FEED_URL: &str =
    "https://raw.githubusercontent.com/openphish/public_feed/refs/heads/main/feed.txt";
const PHISHSTATS_API_URL: &str = "https://phishstats.info/api/phishing";
const URLHAUS_RECENT_URL: &str = "https://urlhaus.abuse.ch/downloads/csv_recent/";
const SPAMHAUS_DROP_URL: &str = "https://www.spamhaus.org/drop/drop.txt";
const PHISHTANK_SUBMIT_URL: &str = "https://phishtank.org/add_web_phish.php";

pub const PHISHSTATS_DEFAULT_LIMIT: usize = 100;
const FEED_TIMEOUT: Duration = Duration::from_secs(45);

// URLhaus csv_recent: id,dateadded,url,url_status,last_online,threat,tags,urlhaus_link,reporter
const URLHAUS_COL_DATE: usize = 1;
const URLHAUS_COL_URL: usize = 2;
const URLHAUS_COL_THREAT: usize = 5;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    OpenPhish,
    PhishTank,
    PhishStats,
    UrlHaus,
    Spamhaus,
}

impl FeedSource {
    pub const ALL: [FeedSource; 5] = [
        FeedSource::OpenPhish,
        FeedSource::PhishTank,
        FeedSource::PhishStats,
        FeedSource::UrlHaus,
        FeedSource::Spamhaus,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FeedSource::OpenPhish => "openphish",
            FeedSource::PhishTank => "phishtank",
            FeedSource::PhishStats => "phishstats",
            FeedSource::UrlHaus => "urlhaus",
            FeedSource::Spamhaus => "spamhaus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == s)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeedSource::OpenPhish => "OpenPhish",
            FeedSource::PhishTank => "PhishTank",
            FeedSource::PhishStats => "PhishStats",
            FeedSource::UrlHaus => "URLhaus",
            FeedSource::Spamhaus => "Spamhaus DROP",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FeedSource::OpenPhish => "Public phishing feed from GitHub",
            FeedSource::PhishTank => "Community verified phishing database",
            FeedSource::PhishStats => "REST API for phishing URLs",
            FeedSource::UrlHaus => "Malware distribution URLs",
            FeedSource::Spamhaus => "Malicious netblock list",
        }
    }

    pub fn homepage(&self) -> &'static str {
        match self {
            FeedSource::OpenPhish => OPENPHISH_FEED_URL,
            FeedSource::PhishTank => "https://www.phishtank.com",
            FeedSource::PhishStats => "https://phishstats.info",
            FeedSource::UrlHaus => "https://urlhaus.abuse.ch",
            FeedSource::Spamhaus => "https://www.spamhaus.org/drop/",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, FeedSource::PhishTank)
    }

    pub fn severity(&self) -> Severity {
        match self {
            FeedSource::UrlHaus | FeedSource::Spamhaus => Severity::Critical,
            _ => Severity::High,
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One blocklist candidate produced by a feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Host name, or CIDR netblock for Spamhaus
    pub domain: String,
    pub reason: String,
    pub severity: Severity,
    pub source: FeedSource,
    pub metadata: serde_json::Value,
}

/// Outcome of one feed download
#[derive(Debug, Clone, Serialize)]
pub struct FeedSyncResult {
    pub source: FeedSource,
    pub success: bool,
    /// Raw records in the feed (before host parsing / de-dup)
    pub total: usize,
    #[serde(skip)]
    pub entries: Vec<FeedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedSyncResult {
    fn failed(source: FeedSource, error: String) -> Self {
        Self {
            source,
            success: false,
            total: 0,
            entries: Vec::new(),
            error: Some(error),
        }
    }
}

/// Parsed feed: raw record count + unique entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub total: usize,
    pub entries: Vec<FeedEntry>,
}

// ============================================================================
// PARSERS
// ============================================================================

fn host_of(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Collapse duplicate domains, first occurrence wins
fn dedupe(entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.domain.clone()))
        .collect()
}

/// OpenPhish: one URL per line
pub fn parse_openphish(body: &str) -> ParsedFeed {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let entries = lines
        .iter()
        .filter_map(|line| {
            let domain = host_of(line)?;
            Some(FeedEntry {
                domain,
                reason: "Phishing URL detected by OpenPhish".to_string(),
                severity: FeedSource::OpenPhish.severity(),
                source: FeedSource::OpenPhish,
                metadata: json!({ "url": line }),
            })
        })
        .collect();

    ParsedFeed { total: lines.len(), entries: dedupe(entries) }
}

#[derive(Debug, Deserialize)]
struct PhishTankRecord {
    #[serde(default)]
    phish_id: serde_json::Value,
    url: String,
    #[serde(default)]
    verified: serde_json::Value,
    #[serde(default)]
    submission_time: Option<String>,
}

/// PhishTank `online-valid.json`
pub fn parse_phishtank(body: &str) -> Result<ParsedFeed> {
    let records: Vec<PhishTankRecord> = serde_json::from_str(body)?;
    let total = records.len();

    let entries = records
        .into_iter()
        .filter_map(|r| {
            let domain = host_of(&r.url)?;
            let id = match &r.phish_id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(FeedEntry {
                domain,
                reason: format!("PhishTank verified phishing (ID: {})", id),
                severity: FeedSource::PhishTank.severity(),
                source: FeedSource::PhishTank,
                metadata: json!({
                    "phish_id": r.phish_id,
                    "url": r.url,
                    "verified": r.verified,
                    "submission_time": r.submission_time,
                }),
            })
        })
        .collect();

    Ok(ParsedFeed { total, entries: dedupe(entries) })
}

#[derive(Debug, Deserialize)]
struct PhishStatsRecord {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    asn: Option<String>,
}

/// PhishStats `/api/phishing` JSON array
pub fn parse_phishstats(body: &str) -> Result<ParsedFeed> {
    let records: Vec<PhishStatsRecord> = serde_json::from_str(body)?;
    let total = records.len();

    let entries = records
        .into_iter()
        .filter_map(|r| {
            let domain = host_of(&r.url)?;
            let title = r
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or("Phishing");
            Some(FeedEntry {
                domain,
                reason: format!("PhishStats reported phishing ({})", title),
                severity: FeedSource::PhishStats.severity(),
                source: FeedSource::PhishStats,
                metadata: json!({
                    "url": r.url,
                    "title": r.title,
                    "date": r.date,
                    "ip": r.ip,
                    "asn": r.asn,
                }),
            })
        })
        .collect();

    Ok(ParsedFeed { total, entries: dedupe(entries) })
}

/// Split one CSV line, honouring double quotes
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// URLhaus `csv_recent`
pub fn parse_urlhaus(body: &str) -> ParsedFeed {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let entries = lines
        .iter()
        .filter_map(|line| {
            let cols = split_csv_line(line);
            let url = cols.get(URLHAUS_COL_URL)?.trim().to_string();
            let domain = host_of(&url)?;
            let threat = cols
                .get(URLHAUS_COL_THREAT)
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .unwrap_or("malware")
                .to_string();
            let date_added = cols.get(URLHAUS_COL_DATE).cloned();

            Some(FeedEntry {
                domain,
                reason: format!("Malware distribution detected by URLhaus ({})", threat),
                severity: FeedSource::UrlHaus.severity(),
                source: FeedSource::UrlHaus,
                metadata: json!({
                    "url": url,
                    "threat_type": threat,
                    "date_added": date_added,
                }),
            })
        })
        .collect();

    ParsedFeed { total: lines.len(), entries: dedupe(entries) }
}

/// Spamhaus DROP: `1.10.16.0/20 ; SBL256894`
pub fn parse_spamhaus_drop(body: &str) -> ParsedFeed {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';'))
        .collect();

    let entries = lines
        .iter()
        .filter_map(|line| {
            let mut parts = line.splitn(2, ';');
            let netblock = parts.next()?.trim();
            if netblock.is_empty() {
                return None;
            }
            let sbl = parts.next().map(str::trim).filter(|s| !s.is_empty());

            Some(FeedEntry {
                domain: netblock.to_string(),
                reason: format!(
                    "Spamhaus DROP netblock ({})",
                    sbl.unwrap_or("malicious network")
                ),
                severity: FeedSource::Spamhaus.severity(),
                source: FeedSource::Spamhaus,
                metadata: json!({ "netblock": netblock, "sbl": sbl }),
            })
        })
        .collect();

    ParsedFeed { total: lines.len(), entries: dedupe(entries) }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct ThreatFeedClient {
    http: reqwest::Client,
    phishtank_key: Option<String>,
    phishstats_limit: usize,
}

impl ThreatFeedClient {
    pub fn new(http: reqwest::Client, phishtank_key: Option<String>) -> Self {
        Self {
            http,
            phishtank_key: phishtank_key.filter(|k| !k.trim().is_empty()),
            phishstats_limit: PHISHSTATS_DEFAULT_LIMIT,
        }
    }

    pub fn with_phishstats_limit(mut self, limit: usize) -> Self {
        self.phishstats_limit = limit;
        self
    }

    /// Source is usable right now (key present when one is needed)
    pub fn is_enabled(&self, source: FeedSource) -> bool {
        !source.requires_api_key() || self.phishtank_key.is_some()
    }

    async fn download(&self, url: &str, service: &'static str) -> Result<String> {
        let response = self.http.get(url).timeout(FEED_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Http { service, status: status.as_u16() });
        }
        Ok(response.text().await?)
    }

    /// Download and parse one feed
    pub async fn fetch(&self, source: FeedSource) -> Result<ParsedFeed> {
        let parsed = match source {
            FeedSource::OpenPhish => parse_openphish(&self.download(OPENPHISH_FEED_URL, "OpenPhish").await?),
            FeedSource::PhishTank => {
                let key = self
                    .phishtank_key
                    .as_deref()
                    .ok_or(ScanError::NotConfigured("PhishTank"))?;
                let url = format!("http://data.phishtank.com/data/{}/online-valid.json", key);
                parse_phishtank(&self.download(&url, "PhishTank").await?)?
            }
            FeedSource::PhishStats => {
                let url = format!("{}?_sort=-date&_limit={}", PHISHSTATS_API_URL, self.phishstats_limit);
                parse_phishstats(&self.download(&url, "PhishStats").await?)?
            }
            FeedSource::UrlHaus => parse_urlhaus(&self.download(URLHAUS_RECENT_URL, "URLhaus").await?),
            FeedSource::Spamhaus => parse_spamhaus_drop(&self.download(SPAMHAUS_DROP_URL, "Spamhaus").await?),
        };

        log::info!(
            "[{}] Fetched {} records, {} unique entries",
            source.name(),
            parsed.total,
            parsed.entries.len()
        );
        Ok(parsed)
    }

    /// Fetch one feed, folding the error into the result
    pub async fn sync(&self, source: FeedSource) -> FeedSyncResult {
        match self.fetch(source).await {
            Ok(parsed) => FeedSyncResult {
                source,
                success: true,
                total: parsed.total,
                entries: parsed.entries,
                error: None,
            },
            Err(e) => {
                log::error!("[{}] Sync failed: {}", source.name(), e);
                FeedSyncResult::failed(source, e.to_string())
            }
        }
    }

    /// Every enabled feed; the keyless ones run concurrently
    pub async fn fetch_all(&self) -> Vec<FeedSyncResult> {
        let (openphish, urlhaus, phishstats, spamhaus) = tokio::join!(
            self.sync(FeedSource::OpenPhish),
            self.sync(FeedSource::UrlHaus),
            self.sync(FeedSource::PhishStats),
            self.sync(FeedSource::Spamhaus),
        );

        let mut results = vec![openphish, urlhaus, phishstats, spamhaus];
        if self.is_enabled(FeedSource::PhishTank) {
            results.push(self.sync(FeedSource::PhishTank).await);
        }
        results
    }
}

// ============================================================================
// PHISHTANK SUBMISSION
// ============================================================================

pub struct PhishTankClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl PhishTankClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Report a phishing URL; Ok(false) when no key is configured
    pub async fn submit(&self, url: &str) -> Result<bool> {
        if self.api_key.is_none() {
            return Ok(false);
        }

        let response = self
            .http
            .post(PHISHTANK_SUBMIT_URL)
            .timeout(Duration::from_secs(15))
            .header(reqwest::header::USER_AGENT, "ANTI-SCAM/1.0")
            .form(&[("url", url), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            log::info!("PhishTank submission successful for: {}", url);
            Ok(true)
        } else {
            let body = response.text().await.unwrap_or_default();
            log::warn!("PhishTank submission failed ({}): {}", status, body);
            Err(ScanError::Http { service: "PhishTank", status: status.as_u16() })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
