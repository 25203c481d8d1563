//! Logic Layer
//!
//! - `normalize`: URL validation
//! - `heuristics`: rule-table scoring
//! - `ai_bridge`: hosted LLM classifier
//! - `external_intel`: reputation providers, community lists, threat feeds
//! - `threat`: score combination + label
//! - `website`: HTML analysis, domain category
//! - `lists`: whitelist / blocklist seam
//! - `rate_limit`: tier quotas + window limiter
//! - `pipeline`: everything wired together

pub mod normalize;
pub mod heuristics;
pub mod fetch;
pub mod ai_bridge;
pub mod external_intel;
pub mod threat;
pub mod website;
pub mod lists;
pub mod rate_limit;
pub mod pipeline;
