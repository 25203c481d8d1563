//! Groq LLM Client
//!
//! Mục đích: hỏi LLM đánh giá URL có phải lừa đảo không
//!
//! Features:
//! - OpenAI-compatible chat completions
//! - Prompt tiếng Việt, trả về JSON {"score", "reasons"}
//! - Lỗi / thiếu key → verdict "unavailable", không bao giờ fail pipeline

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{AiClassifier, AiVerdict, WebContent};
use crate::error::{Result, ScanError};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 300;

/// Confidence assigned to any parsed model answer
pub const MODEL_CONFIDENCE: f32 = 0.85;

/// Characters of page text included in the prompt
const PROMPT_TEXT_LIMIT: usize = 2000;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\n?").expect("static regex"));
static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: GROQ_API_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl GroqConfig {
    /// Placeholder keys from sample env files count as missing
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty() && !k.contains("xxx"))
            .unwrap_or(false)
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelAnswer {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    reasons: Vec<String>,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct GroqClassifier {
    http: reqwest::Client,
    config: GroqConfig,
}

impl GroqClassifier {
    pub fn new(http: reqwest::Client, config: GroqConfig) -> Self {
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ScanError::NotConfigured("Groq"))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .timeout(self.config.timeout)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ScanError::InvalidApiKey("Groq"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Groq error {}: {}", status, body);
            return Err(ScanError::Http { service: "Groq", status: status.as_u16() });
        }

        let body: ChatResponse = response.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl AiClassifier for GroqClassifier {
    fn name(&self) -> &str {
        "groq"
    }

    async fn classify(&self, url: &str, domain: &str, content: Option<&WebContent>) -> AiVerdict {
        let content_fetched = content.is_some();
        if !self.is_configured() {
            return AiVerdict::unavailable(content_fetched);
        }

        let prompt = build_prompt(url, domain, content);
        match self.complete(&prompt).await {
            Ok(answer) => parse_model_answer(&answer, content_fetched).unwrap_or_else(|| {
                log::warn!("Groq answer for {} had no usable JSON", domain);
                AiVerdict::unavailable(content_fetched)
            }),
            Err(e) => {
                log::warn!("Groq classification failed for {}: {}", domain, e);
                AiVerdict::unavailable(content_fetched)
            }
        }
    }
}

// ============================================================================
// PROMPT & PARSING
// ============================================================================

pub fn build_prompt(url: &str, domain: &str, content: Option<&WebContent>) -> String {
    let content_info = match content {
        Some(c) => {
            let text: String = c.text.chars().take(PROMPT_TEXT_LIMIT).collect();
            format!(
                "TITLE: {}\nDESC: {}\nTEXT: {}\nLOGIN_FORM: {}\nPAYMENT_FORM: {}",
                c.title, c.description, text, c.has_login_form, c.has_payment_form
            )
        }
        None => "KHÔNG THỂ TRUY CẬP WEBSITE".to_string(),
    };

    format!(
        "Phân tích website lừa đảo VN. Trả về JSON:\n\
         {{\"score\":0-100,\"reasons\":[\"lý do\"]}}\n\n\
         TIÊU CHÍ:\n\
         - Cờ bạc/casino/lô đề: 80-100\n\
         - Phishing ngân hàng/ví: 80-100\n\
         - Lừa đầu tư/forex/crypto: 70-90\n\
         - Yêu cầu OTP/mật khẩu lạ: 60-80\n\
         - Kiếm tiền online/việc giả: 50-70\n\
         - Website bình thường: 0-30\n\n\
         URL: {}\n\
         DOMAIN: {}\n\
         {}",
        url, domain, content_info
    )
}

/// Extract the first JSON object of a model answer (code fences tolerated)
pub fn parse_model_answer(answer: &str, content_fetched: bool) -> Option<AiVerdict> {
    let cleaned = CODE_FENCE.replace_all(answer, "");
    let block = JSON_BLOCK.find(&cleaned)?;
    let parsed: ModelAnswer = serde_json::from_str(block.as_str()).ok()?;

    let score = parsed.score.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8;
    Some(AiVerdict {
        score,
        confidence: MODEL_CONFIDENCE,
        reasons: parsed.reasons.into_iter().map(|r| format!("🤖 {}", r)).collect(),
        content_fetched,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let v = parse_model_answer(r#"{"score": 92, "reasons": ["Cờ bạc online"]}"#, true).unwrap();
        assert_eq!(v.score, 92);
        assert_eq!(v.confidence, MODEL_CONFIDENCE);
        assert_eq!(v.reasons, vec!["🤖 Cờ bạc online".to_string()]);
        assert!(v.content_fetched);
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let answer = "Đây là kết quả:\n```json\n{\"score\": 150, \"reasons\": []}\n```";
        let v = parse_model_answer(answer, false).unwrap();
        assert_eq!(v.score, 100);
        assert!(v.reasons.is_empty());
    }

    #[test]
    fn test_parse_negative_and_missing_score() {
        assert_eq!(parse_model_answer(r#"{"score": -5}"#, false).unwrap().score, 0);
        assert_eq!(parse_model_answer(r#"{"reasons": ["x"]}"#, false).unwrap().score, 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_model_answer("không biết", true).is_none());
        assert!(parse_model_answer("{not json}", true).is_none());
    }

    #[test]
    fn test_placeholder_key_not_configured() {
        let mut config = GroqConfig::default();
        assert!(!config.is_configured());
        config.api_key = Some("gsk_xxxxxxxx".to_string());
        assert!(!config.is_configured());
        config.api_key = Some("gsk_real".to_string());
        assert!(config.is_configured());
    }

    #[test]
    fn test_prompt_without_content() {
        let prompt = build_prompt("https://a.vn/", "a.vn", None);
        assert!(prompt.contains("DOMAIN: a.vn"));
        assert!(prompt.contains("KHÔNG THỂ TRUY CẬP WEBSITE"));
        assert!(prompt.contains("{\"score\":0-100"));
    }

    #[tokio::test]
    async fn test_unconfigured_client_is_unavailable() {
        let client = GroqClassifier::new(reqwest::Client::new(), GroqConfig::default());
        let v = client.classify("https://a.vn/", "a.vn", None).await;
        assert!(!v.is_available());
        assert!(!v.content_fetched);
    }
}
