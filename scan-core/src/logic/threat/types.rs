//! Threat Types
//!
//! Core types cho risk labeling.
//! KHÔNG chứa logic - chỉ data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// LABEL
// ============================================================================

/// Risk label trả về cho người dùng
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    /// An toàn
    Safe,
    /// Cần thận trọng
    Caution,
    /// Nguy hiểm
    Dangerous,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Safe => "SAFE",
            Label::Caution => "CAUTION",
            Label::Dangerous => "DANGEROUS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SAFE" => Some(Label::Safe),
            "CAUTION" => Some(Label::Caution),
            "DANGEROUS" => Some(Label::Dangerous),
            _ => None,
        }
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            Label::Safe => 0,
            Label::Caution => 1,
            Label::Dangerous => 2,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Label::Safe => "#10b981",      // Green
            Label::Caution => "#f59e0b",   // Yellow
            Label::Dangerous => "#ef4444", // Red
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT SOURCE
// ============================================================================

/// Where the final label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    /// Forced SAFE by the whitelist
    Whitelist,
    /// Forced DANGEROUS by the blocklist
    Blocklist,
    /// Heuristics + AI (+ threat intel floor)
    Combined,
}

impl VerdictSource {
    pub fn is_override(&self) -> bool {
        !matches!(self, VerdictSource::Combined)
    }
}

// ============================================================================
// SCORE BREAKDOWN (Explainability)
// ============================================================================

/// Breakdown of how the final score was computed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub heuristic_score: u8,
    pub ai_score: u8,
    /// Weight given to the AI score (0.0 - 1.0)
    pub ai_weight: f32,
    /// Score before the known-scam floor
    pub combined_score: u8,
    /// True when external intel raised the score
    pub known_scam_floor: bool,
    pub final_score: u8,
}

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

/// Final classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// 0 - 100
    pub score: u8,
    pub label: Label,
    pub reasons: Vec<String>,
    pub ai_confidence: f32,
    pub breakdown: ScoreBreakdown,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            score: 0,
            label: Label::Safe,
            reasons: Vec::new(),
            ai_confidence: 0.0,
            breakdown: ScoreBreakdown::default(),
        }
    }
}
