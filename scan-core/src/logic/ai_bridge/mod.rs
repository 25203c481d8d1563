//! AI Bridge - Hosted LLM Classifier
//!
//! Gửi URL + nội dung trang cho LLM (Groq, OpenAI-compatible API) và
//! đọc lại điểm rủi ro 0-100 kèm lý do.
//!
//! # Components
//! - `types`: AiVerdict, WebContent, AiClassifier trait
//! - `groq`: Groq chat-completions client + answer parsing

pub mod types;
pub mod groq;

pub use types::{AiClassifier, AiVerdict, WebContent, DisabledClassifier};
pub use groq::{GroqClassifier, GroqConfig, parse_model_answer};
