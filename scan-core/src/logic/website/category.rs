//! Quick category guess from the domain name alone

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static GAMBLING_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2,}(vip|club|win|bet|game)|(casino|slot|poker|bet|game)\d{2,}")
        .expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGuess {
    pub category: String,
    pub confidence: f32,
}

impl CategoryGuess {
    fn new(category: &str, confidence: f32) -> Self {
        Self {
            category: category.to_string(),
            confidence,
        }
    }
}

pub fn detect_category_from_domain(domain: &str) -> CategoryGuess {
    let d = domain.to_lowercase();

    if d.ends_with(".gov.vn") || d.ends_with(".edu.vn") {
        return CategoryGuess::new("Chính phủ/Giáo dục", 0.95);
    }

    if ["bank", "vietcom", "techcom", "bidv", "agri"].iter().any(|k| d.contains(k)) {
        return CategoryGuess::new("Ngân hàng", 0.8);
    }

    if ["shop", "store", "mart", "buy"].iter().any(|k| d.contains(k)) {
        return CategoryGuess::new("Thương mại điện tử", 0.7);
    }

    if GAMBLING_DOMAIN.is_match(&d) {
        return CategoryGuess::new("Cờ bạc", 0.9);
    }

    if ["news", "bao", "tin"].iter().any(|k| d.contains(k)) {
        return CategoryGuess::new("Tin tức", 0.6);
    }

    CategoryGuess::new("Chưa xác định", 0.3)
}
