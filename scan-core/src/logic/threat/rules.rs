//! Risk Label Rules & Thresholds
//!
//! Định nghĩa các threshold và trọng số cho việc gộp điểm.
//! KHÔNG chứa logic classify - chỉ constants và config.

use serde::{Deserialize, Serialize};

use super::types::Label;

// ============================================================================
// THRESHOLDS (Constants - không đổi lúc runtime)
// ============================================================================

/// At or below this score = SAFE
pub const SAFE_MAX_SCORE: u8 = 30;

/// At or below this score = CAUTION, above = DANGEROUS
pub const CAUTION_MAX_SCORE: u8 = 60;

// ============================================================================
// WEIGHTS
// ============================================================================

/// AI weight when the page content was fetched and sent to the model (70%)
pub const AI_WEIGHT_WITH_CONTENT: f32 = 0.7;

/// AI weight when the model only saw the URL (40%)
pub const AI_WEIGHT_WITHOUT_CONTENT: f32 = 0.4;

/// Minimum score once external intel reports a known scam
pub const KNOWN_SCAM_FLOOR: u8 = 80;

/// Maximum number of reasons returned to the client
pub const MAX_REASONS: usize = 8;

// ============================================================================
// CONFIGURABLE RULES (for runtime adjustment)
// ============================================================================

/// Score → label thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    /// At or below = SAFE
    pub safe_max: u8,
    /// At or below = CAUTION
    pub caution_max: u8,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            safe_max: SAFE_MAX_SCORE,
            caution_max: CAUTION_MAX_SCORE,
        }
    }
}

impl LabelThresholds {
    pub fn label_for(&self, score: u8) -> Label {
        if score <= self.safe_max {
            Label::Safe
        } else if score <= self.caution_max {
            Label::Caution
        } else {
            Label::Dangerous
        }
    }
}

/// Weights used when combining heuristic and AI scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub ai_with_content: f32,
    pub ai_without_content: f32,
    pub known_scam_floor: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ai_with_content: AI_WEIGHT_WITH_CONTENT,
            ai_without_content: AI_WEIGHT_WITHOUT_CONTENT,
            known_scam_floor: KNOWN_SCAM_FLOOR,
        }
    }
}

/// Full rule set handed to the classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub thresholds: LabelThresholds,
    pub weights: ScoreWeights,
    pub max_reasons: Option<usize>,
}

impl ScoringRules {
    pub fn max_reasons(&self) -> usize {
        self.max_reasons.unwrap_or(MAX_REASONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_boundaries() {
        let t = LabelThresholds::default();
        assert_eq!(t.label_for(0), Label::Safe);
        assert_eq!(t.label_for(30), Label::Safe);
        assert_eq!(t.label_for(31), Label::Caution);
        assert_eq!(t.label_for(60), Label::Caution);
        assert_eq!(t.label_for(61), Label::Dangerous);
        assert_eq!(t.label_for(100), Label::Dangerous);
    }

    #[test]
    fn test_known_scam_floor_is_dangerous() {
        let t = LabelThresholds::default();
        assert_eq!(t.label_for(KNOWN_SCAM_FLOOR), Label::Dangerous);
    }
}
