//! External Threat Intelligence
//!
//! Reputation providers (VirusTotal, Google Safe Browsing, AbuseIPDB),
//! community seed lists and the public phishing / malware feeds.

pub mod abuseipdb;
pub mod checker;
pub mod community;
pub mod safe_browsing;
pub mod threat_feed;
pub mod types;
pub mod virustotal;

pub use abuseipdb::AbuseIpDbClient;
pub use checker::ExternalChecker;
pub use safe_browsing::SafeBrowsingClient;
pub use threat_feed::{FeedEntry, FeedSource, FeedSyncResult, PhishTankClient, ThreatFeedClient};
pub use types::{ExternalCheck, ProviderFinding, Severity, ThreatIntelProvider, VTStats, VTUrlReport};
pub use virustotal::VirusTotalClient;
