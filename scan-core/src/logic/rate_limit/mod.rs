//! Rate Limiting
//!
//! - Tier quotas: daily counters on the user row, reset at local midnight
//! - Window limiter: per IP / user / API key, in memory

pub mod tier;
pub mod window;

pub use tier::{
    check_daily_quota, next_reset, DailyUsage, QuotaDecision, Tier, TierLimits, UsageKind,
};
pub use window::{LimitKind, WindowDecision, WindowLimiter, WindowRule};
