//! Website Module
//!
//! Đọc nội dung trang đã fetch để bổ sung ngữ cảnh cho kết quả scan
//! (lĩnh vực, công nghệ, tín hiệu rủi ro / tin cậy).
//!
//! # Components
//! - `html`: Regex extraction helpers (title, meta, text)
//! - `analyzer`: WebsiteInfo from HTML
//! - `category`: Category guess from domain only

pub mod html;
pub mod analyzer;
pub mod category;

pub use analyzer::{analyze_html, WebsiteInfo};
pub use category::{detect_category_from_domain, CategoryGuess};
