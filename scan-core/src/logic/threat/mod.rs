//! Threat Module
//!
//! Gộp điểm heuristic + AI + threat intel thành nhãn cuối cùng.
//! Đây là CORE STEP - nơi quyết định SAFE/CAUTION/DANGEROUS.
//!
//! ## Structure
//! - `types`: Label, Classification, ScoreBreakdown
//! - `rules`: Thresholds, weights và constants
//! - `classifier`: Combination logic
//!
//! ## Usage
//! ```ignore
//! use antiscam_core::logic::threat::{classify, Label};
//!
//! let result = classify(&heuristic, &ai_verdict);
//! match result.label {
//!     Label::Safe => println!("OK"),
//!     Label::Caution => println!("Cẩn thận"),
//!     Label::Dangerous => println!("Nguy hiểm"),
//! }
//! ```

pub mod types;
pub mod rules;
pub mod classifier;

pub use types::{Label, Classification, ScoreBreakdown, VerdictSource};

pub use rules::{
    LabelThresholds,
    ScoreWeights,
    ScoringRules,
    SAFE_MAX_SCORE,
    CAUTION_MAX_SCORE,
    KNOWN_SCAM_FLOOR,
};

pub use classifier::{classify, classify_with_rules, combine_scores, escalate_known_scam, finalize_reasons};
