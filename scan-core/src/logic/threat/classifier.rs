//! Risk Classifier
//!
//! CHỈ chứa logic gộp điểm - không có types, không có I/O.
//! Input: HeuristicResult, AiVerdict
//! Output: Classification

use std::collections::HashSet;

use super::rules::ScoringRules;
use super::types::{Classification, Label, ScoreBreakdown};
use crate::logic::ai_bridge::AiVerdict;
use crate::logic::heuristics::HeuristicResult;

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify with default rules
pub fn classify(heuristic: &HeuristicResult, ai: &AiVerdict) -> Classification {
    classify_with_rules(heuristic, ai, &ScoringRules::default())
}

/// Classification with custom rules
pub fn classify_with_rules(
    heuristic: &HeuristicResult,
    ai: &AiVerdict,
    rules: &ScoringRules,
) -> Classification {
    // Unavailable AI contributes nothing; otherwise it weighs more when it saw the page
    let ai_weight = if !ai.is_available() {
        0.0
    } else if ai.content_fetched {
        rules.weights.ai_with_content
    } else {
        rules.weights.ai_without_content
    };

    let score = combine_scores(heuristic.score, ai.score, ai_weight);
    let label = rules.thresholds.label_for(score);

    let merged = heuristic.reasons.iter().chain(ai.reasons.iter()).cloned();
    let reasons = finalize_reasons(merged, label, rules.max_reasons());

    Classification {
        score,
        label,
        reasons,
        ai_confidence: ai.confidence,
        breakdown: ScoreBreakdown {
            heuristic_score: heuristic.score,
            ai_score: ai.score,
            ai_weight,
            combined_score: score,
            known_scam_floor: false,
            final_score: score,
        },
    }
}

/// `round(h * (1 - w) + ai * w)`, clamped to 0-100
pub fn combine_scores(heuristic: u8, ai: u8, ai_weight: f32) -> u8 {
    let w = ai_weight.clamp(0.0, 1.0);
    let combined = heuristic as f32 * (1.0 - w) + ai as f32 * w;
    combined.round().clamp(0.0, 100.0) as u8
}

/// Raise a classification to the known-scam floor and put intel sources first
pub fn escalate_known_scam(
    classification: &mut Classification,
    sources: &[String],
    rules: &ScoringRules,
) {
    if sources.is_empty() {
        return;
    }

    let floor = rules.weights.known_scam_floor;
    if classification.score < floor {
        classification.score = floor;
        classification.breakdown.known_scam_floor = true;
    }
    classification.breakdown.final_score = classification.score;
    classification.label = rules.thresholds.label_for(classification.score);

    let existing = std::mem::take(&mut classification.reasons);
    let prefixed = sources.iter().map(|s| format!("🚫 {}", s));
    // Generic "no issue" placeholders make no sense next to a scam hit
    let kept = existing.into_iter().filter(|r| !is_placeholder_reason(r));
    classification.reasons =
        finalize_reasons(prefixed.chain(kept), classification.label, rules.max_reasons());
}

/// Deduplicate (order preserving), cap, and fill in a default when empty
pub fn finalize_reasons<I>(reasons: I, label: Label, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut out: Vec<String> = reasons
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .take(max)
        .collect();

    if out.is_empty() {
        out.push(default_reason(label).to_string());
    }
    out
}

fn default_reason(label: Label) -> &'static str {
    match label {
        Label::Safe => "✅ Không phát hiện vấn đề",
        _ => "⚠️ Cần thận trọng",
    }
}

fn is_placeholder_reason(reason: &str) -> bool {
    reason == default_reason(Label::Safe) || reason == default_reason(Label::Caution)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic(score: u8, reasons: &[&str]) -> HeuristicResult {
        HeuristicResult {
            score,
            reasons: reasons.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn ai(score: u8, content_fetched: bool) -> AiVerdict {
        AiVerdict {
            score,
            confidence: 0.85,
            reasons: vec![],
            content_fetched,
        }
    }

    #[test]
    fn test_weight_with_content() {
        // 20 * 0.3 + 90 * 0.7 = 69
        let result = classify(&heuristic(20, &[]), &ai(90, true));
        assert_eq!(result.score, 69);
        assert_eq!(result.label, Label::Dangerous);
        assert!((result.breakdown.ai_weight - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_weight_without_content() {
        // 50 * 0.6 + 10 * 0.4 = 34
        let result = classify(&heuristic(50, &["x"]), &ai(10, false));
        assert_eq!(result.score, 34);
        assert_eq!(result.label, Label::Caution);
    }

    #[test]
    fn test_unavailable_ai_uses_heuristic_only() {
        let result = classify(&heuristic(55, &["TLD đáng ngờ: .xyz"]), &AiVerdict::unavailable(false));
        assert_eq!(result.score, 55);
        assert_eq!(result.ai_confidence, 0.0);
        assert_eq!(result.breakdown.ai_weight, 0.0);
    }

    #[test]
    fn test_default_reasons() {
        let safe = classify(&heuristic(0, &[]), &ai(0, true));
        assert_eq!(safe.reasons, vec!["✅ Không phát hiện vấn đề".to_string()]);

        let caution = classify(&heuristic(0, &[]), &ai(60, true));
        assert_eq!(caution.label, Label::Caution);
        assert_eq!(caution.reasons, vec!["⚠️ Cần thận trọng".to_string()]);
    }

    #[test]
    fn test_reasons_deduped_and_capped() {
        let many: Vec<String> = (0..12).map(|i| format!("r{}", i)).collect();
        let mut input = vec!["r0".to_string()];
        input.extend(many);
        let out = finalize_reasons(input, Label::Caution, 8);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0], "r0");
        assert_eq!(out[1], "r1");
    }

    #[test]
    fn test_known_scam_floor() {
        let rules = ScoringRules::default();
        let mut result = classify(&heuristic(0, &[]), &ai(0, true));
        assert_eq!(result.label, Label::Safe);

        escalate_known_scam(&mut result, &["VirusTotal: 5 engines phát hiện nguy hiểm".to_string()], &rules);
        assert_eq!(result.score, 80);
        assert_eq!(result.label, Label::Dangerous);
        assert!(result.breakdown.known_scam_floor);
        assert_eq!(result.reasons, vec!["🚫 VirusTotal: 5 engines phát hiện nguy hiểm".to_string()]);
    }

    #[test]
    fn test_floor_keeps_higher_score() {
        let rules = ScoringRules::default();
        let mut result = classify(&heuristic(95, &["🎰 Website cờ bạc!"]), &AiVerdict::unavailable(true));
        escalate_known_scam(&mut result, &["Giả mạo Shopee".to_string()], &rules);
        assert_eq!(result.score, 95);
        assert!(!result.breakdown.known_scam_floor);
        assert_eq!(result.reasons[0], "🚫 Giả mạo Shopee");
        assert_eq!(result.reasons[1], "🎰 Website cờ bạc!");
    }

    #[test]
    fn test_no_sources_is_noop() {
        let rules = ScoringRules::default();
        let mut result = classify(&heuristic(10, &[]), &ai(10, true));
        let before = result.clone();
        escalate_known_scam(&mut result, &[], &rules);
        assert_eq!(result, before);
    }

    #[test]
    fn test_combine_rounding() {
        assert_eq!(combine_scores(15, 0, 0.4), 9);
        assert_eq!(combine_scores(100, 100, 0.7), 100);
        assert_eq!(combine_scores(45, 0, 0.0), 45);
    }
}
