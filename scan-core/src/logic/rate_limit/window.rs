//! Fixed-window in-memory limiter
//!
//! Key = `{namespace}:{identifier}` (IP, user id or API key id).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// Max requests per window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRule {
    pub max_requests: u32,
    pub window: Duration,
}

impl WindowRule {
    pub const fn per_minute(max_requests: u32) -> Self {
        Self { max_requests, window: Duration::from_secs(60) }
    }

    pub const fn per_hour(max_requests: u32) -> Self {
        Self { max_requests, window: Duration::from_secs(3600) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    Scan,
    ImageScan,
    Report,
    Admin,
    Default,
    /// Scans without an account, per IP
    AnonymousScan,
}

impl LimitKind {
    pub fn rule(&self) -> WindowRule {
        match self {
            LimitKind::Scan => WindowRule::per_minute(10),
            LimitKind::ImageScan => WindowRule::per_minute(5),
            LimitKind::Report => WindowRule::per_minute(3),
            LimitKind::Admin => WindowRule::per_minute(50),
            LimitKind::Default => WindowRule::per_minute(30),
            LimitKind::AnonymousScan => WindowRule::per_hour(20),
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            LimitKind::Scan => "scan",
            LimitKind::ImageScan => "scan_image",
            LimitKind::Report => "report",
            LimitKind::Admin => "admin",
            LimitKind::Default => "default",
            LimitKind::AnonymousScan => "anon_scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowDecision {
    pub allowed: bool,
    pub remaining: u32,
    #[serde(with = "duration_secs")]
    pub reset_in: Duration,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Default)]
pub struct WindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl WindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, kind: LimitKind, identifier: &str) -> WindowDecision {
        self.check_at(kind, identifier, Instant::now())
    }

    pub fn check_at(&self, kind: LimitKind, identifier: &str, now: Instant) -> WindowDecision {
        self.check_with_rule(kind.namespace(), identifier, kind.rule(), now)
    }

    /// Count one request against an arbitrary rule (tier hourly / per-minute quotas)
    pub fn check_with_rule(
        &self,
        namespace: &str,
        identifier: &str,
        rule: WindowRule,
        now: Instant,
    ) -> WindowDecision {
        let key = format!("{}:{}", namespace, identifier);
        let mut windows = self.windows.lock();

        match windows.get_mut(&key) {
            Some(w) if now <= w.reset_at => {
                if w.count >= rule.max_requests {
                    return WindowDecision {
                        allowed: false,
                        remaining: 0,
                        reset_in: w.reset_at.saturating_duration_since(now),
                    };
                }
                w.count += 1;
                WindowDecision {
                    allowed: true,
                    remaining: rule.max_requests - w.count,
                    reset_in: w.reset_at.saturating_duration_since(now),
                }
            }
            _ => {
                windows.insert(key, Window { count: 1, reset_at: now + rule.window });
                WindowDecision {
                    allowed: rule.max_requests > 0,
                    remaining: rule.max_requests.saturating_sub(1),
                    reset_in: rule.window,
                }
            }
        }
    }

    /// Drop windows that already ended
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now <= w.reset_at);
        before - windows.len()
    }

    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
