//! Subscription tiers and daily quotas

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Quota days follow Vietnam local time (UTC+7)
pub const LOCAL_UTC_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Business,
    Enterprise,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "FREE",
            Tier::Pro => "PRO",
            Tier::Business => "BUSINESS",
            Tier::Enterprise => "ENTERPRISE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FREE" => Some(Tier::Free),
            "PRO" => Some(Tier::Pro),
            "BUSINESS" => Some(Tier::Business),
            "ENTERPRISE" => Some(Tier::Enterprise),
            _ => None,
        }
    }

    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Free => TierLimits {
                scans_per_day: Some(10),
                scans_per_hour: Some(5),
                image_scans_per_day: Some(3),
                api_calls_per_minute: Some(10),
            },
            Tier::Pro => TierLimits {
                scans_per_day: Some(100),
                scans_per_hour: Some(50),
                image_scans_per_day: Some(30),
                api_calls_per_minute: Some(100),
            },
            Tier::Business => TierLimits {
                scans_per_day: Some(1000),
                scans_per_hour: Some(500),
                image_scans_per_day: Some(200),
                api_calls_per_minute: Some(500),
            },
            Tier::Enterprise => TierLimits::unlimited(),
        }
    }

    pub fn can_use_watchlist(&self) -> bool {
        *self >= Tier::Pro
    }

    pub fn can_use_api_keys(&self) -> bool {
        *self >= Tier::Business
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-tier limits; `None` = unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub scans_per_day: Option<u32>,
    pub scans_per_hour: Option<u32>,
    pub image_scans_per_day: Option<u32>,
    pub api_calls_per_minute: Option<u32>,
}

impl TierLimits {
    pub fn unlimited() -> Self {
        Self {
            scans_per_day: None,
            scans_per_hour: None,
            image_scans_per_day: None,
            api_calls_per_minute: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Scan,
    ImageScan,
}

/// Daily counters stored on the user row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyUsage {
    pub scans_today: u32,
    pub image_scans_today: u32,
    pub last_reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// `None` for unlimited tiers
    pub remaining: Option<u32>,
    pub reset_at: DateTime<Utc>,
    /// Stored counters belong to an earlier day and must be zeroed
    pub needs_reset: bool,
}

fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Local calendar day of an instant
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&local_offset()).date_naive()
}

/// Next local midnight after `now`, in UTC
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let offset = local_offset();
    let tomorrow = local_day(now) + Duration::days(1);
    tomorrow
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now + Duration::days(1))
}

/// Whether `last_reset_at` is on an earlier local day than `now`
pub fn needs_daily_reset(last_reset_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    local_day(last_reset_at) != local_day(now)
}

/// Daily quota check for one usage kind
pub fn check_daily_quota(tier: Tier, usage: &DailyUsage, kind: UsageKind, now: DateTime<Utc>) -> QuotaDecision {
    let needs_reset = needs_daily_reset(usage.last_reset_at, now);
    let limits = tier.limits();

    let (used, limit) = match kind {
        UsageKind::Scan => (usage.scans_today, limits.scans_per_day),
        UsageKind::ImageScan => (usage.image_scans_today, limits.image_scans_per_day),
    };
    let used = if needs_reset { 0 } else { used };

    match limit {
        None => QuotaDecision {
            allowed: true,
            remaining: None,
            reset_at: next_reset(now),
            needs_reset,
        },
        Some(limit) => QuotaDecision {
            allowed: used < limit,
            remaining: Some(limit.saturating_sub(used)),
            reset_at: next_reset(now),
            needs_reset,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn usage(scans: u32, last_reset: &str) -> DailyUsage {
        DailyUsage {
            scans_today: scans,
            image_scans_today: 0,
            last_reset_at: at(last_reset),
        }
    }

    #[test]
    fn test_tier_table() {
        assert_eq!(Tier::Free.limits().scans_per_hour, Some(5));
        assert_eq!(Tier::Business.limits().api_calls_per_minute, Some(500));
        assert_eq!(Tier::Enterprise.limits(), TierLimits::unlimited());
        assert_eq!(Tier::from_str("pro"), Some(Tier::Pro));
        assert_eq!(Tier::from_str("gold"), None);
    }

    #[test]
    fn test_feature_gates() {
        assert!(!Tier::Free.can_use_watchlist());
        assert!(Tier::Pro.can_use_watchlist());
        assert!(!Tier::Pro.can_use_api_keys());
        assert!(Tier::Business.can_use_api_keys());
        assert!(Tier::Enterprise.can_use_api_keys());
    }

    #[test]
    fn test_quota_exhausted() {
        let now = at("2024-06-01T05:00:00Z");
        let d = check_daily_quota(Tier::Free, &usage(10, "2024-06-01T01:00:00Z"), UsageKind::Scan, now);
        assert!(!d.allowed);
        assert_eq!(d.remaining, Some(0));
        assert!(!d.needs_reset);

        let d = check_daily_quota(Tier::Free, &usage(4, "2024-06-01T01:00:00Z"), UsageKind::Scan, now);
        assert!(d.allowed);
        assert_eq!(d.remaining, Some(6));
    }

    #[test]
    fn test_reset_uses_local_day() {
        // 16:30Z = 23:30 local, 17:30Z = 00:30 next local day
        let last = "2024-06-01T16:30:00Z";
        let same_day = check_daily_quota(Tier::Free, &usage(10, last), UsageKind::Scan, at("2024-06-01T16:50:00Z"));
        assert!(!same_day.allowed);

        let next_day = check_daily_quota(Tier::Free, &usage(10, last), UsageKind::Scan, at("2024-06-01T17:30:00Z"));
        assert!(next_day.needs_reset);
        assert!(next_day.allowed);
        assert_eq!(next_day.remaining, Some(10));
    }

    #[test]
    fn test_next_reset_is_local_midnight() {
        // 2024-06-01 12:00 local → 2024-06-02 00:00 local = 2024-06-01T17:00Z
        assert_eq!(next_reset(at("2024-06-01T05:00:00Z")), at("2024-06-01T17:00:00Z"));
    }

    #[test]
    fn test_unlimited_tier() {
        let d = check_daily_quota(Tier::Enterprise, &usage(1_000_000, "2024-06-01T01:00:00Z"), UsageKind::Scan, at("2024-06-01T02:00:00Z"));
        assert!(d.allowed);
        assert_eq!(d.remaining, None);
    }

    #[test]
    fn test_image_quota_separate() {
        let u = DailyUsage { scans_today: 0, image_scans_today: 3, last_reset_at: at("2024-06-01T01:00:00Z") };
        let now = at("2024-06-01T02:00:00Z");
        assert!(!check_daily_quota(Tier::Free, &u, UsageKind::ImageScan, now).allowed);
        assert!(check_daily_quota(Tier::Free, &u, UsageKind::Scan, now).allowed);
    }
}
