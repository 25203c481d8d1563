//! AI Bridge Types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::logic::website::html;

/// Max characters of visible text kept from a page
pub const CONTENT_TEXT_LIMIT: usize = 4000;

// ============================================================================
// VERDICT
// ============================================================================

/// Kết quả từ AI model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiVerdict {
    /// Risk score 0 - 100
    pub score: u8,
    /// 0.0 means the model was not consulted or answered garbage
    pub confidence: f32,
    pub reasons: Vec<String>,
    /// True when page content was available to the model
    pub content_fetched: bool,
}

impl AiVerdict {
    /// Model not configured or call failed
    pub fn unavailable(content_fetched: bool) -> Self {
        Self {
            score: 0,
            confidence: 0.0,
            reasons: Vec::new(),
            content_fetched,
        }
    }

    pub fn is_available(&self) -> bool {
        self.confidence > 0.0
    }
}

// ============================================================================
// PAGE CONTENT
// ============================================================================

/// Nội dung trang gửi cho model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebContent {
    pub title: String,
    pub description: String,
    pub text: String,
    pub has_login_form: bool,
    pub has_payment_form: bool,
}

impl WebContent {
    pub fn from_html(page: &str) -> Self {
        let lower = page.to_lowercase();
        Self {
            title: html::title(page),
            description: html::meta_description(page),
            text: html::visible_text(page, CONTENT_TEXT_LIMIT),
            has_login_form: html::has_password_input(page),
            has_payment_form: ["credit card", "creditcard", "credit-card", "thẻ tín dụng", "cvv"]
                .iter()
                .any(|k| lower.contains(k)),
        }
    }
}

// ============================================================================
// CLASSIFIER SEAM
// ============================================================================

/// LLM-backed URL classifier
#[async_trait]
pub trait AiClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Classify a URL. Never fails: errors degrade to [`AiVerdict::unavailable`].
    async fn classify(&self, url: &str, domain: &str, content: Option<&WebContent>) -> AiVerdict;
}

/// Classifier used when no model key is configured
pub struct DisabledClassifier;

#[async_trait]
impl AiClassifier for DisabledClassifier {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn classify(&self, _url: &str, _domain: &str, content: Option<&WebContent>) -> AiVerdict {
        AiVerdict::unavailable(content.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_content_from_html() {
        let page = r#"<title>Nhận quà</title><body>Nhập số thẻ tín dụng và CVV
            <input type='password'></body>"#;
        let content = WebContent::from_html(page);
        assert_eq!(content.title, "Nhận quà");
        assert!(content.has_login_form);
        assert!(content.has_payment_form);
        assert!(content.text.starts_with("Nhận quà"));
    }

    #[test]
    fn test_unavailable_verdict() {
        let v = AiVerdict::unavailable(true);
        assert!(!v.is_available());
        assert!(v.content_fetched);
        assert_eq!(v.score, 0);
    }
}
