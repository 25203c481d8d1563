//! AntiScam Core
//!
//! Lõi chấm điểm rủi ro URL cho thị trường Việt Nam.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────┐
//! │  normalize   │──▶│ whitelist /  │──▶│ heuristics + AI model    │
//! │  (URL)       │   │ blocklist    │   │ (weighted combination)   │
//! └──────────────┘   └──────┬───────┘   └────────────┬─────────────┘
//!                           │                        │
//!                           ▼                        ▼
//!                    ┌──────────────┐   ┌──────────────────────────┐
//!                    │ forced label │   │ external intel + feeds   │
//!                    └──────────────┘   │ (known-scam floor)       │
//!                                       └──────────────────────────┘
//! ```
//!
//! The crate has no database dependency. Storage is reached through the
//! [`DomainLists`] trait, implemented by the server.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{Result, ScanError};

pub use logic::normalize::{validate_url, extract_domain, extract_root_domain, NormalizedUrl};
pub use logic::threat::{Label, ScoreWeights, LabelThresholds};
pub use logic::lists::{BlockedDomain, CachedDomainLists, DomainLists, MemoryDomainLists};
pub use logic::pipeline::{ScanPipeline, PipelineConfig, AnalysisResult, ScanReport, VerdictSource};
pub use logic::rate_limit::{Tier, TierLimits, WindowLimiter, LimitKind};
pub use logic::external_intel::Severity;
