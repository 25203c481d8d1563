//! Heuristic Rule Weights
//!
//! Điểm cộng cho từng luật. KHÔNG chứa logic - chỉ constants và regex.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// POINTS
// ============================================================================

pub const NO_HTTPS_POINTS: u32 = 15;
pub const LINK_SHORTENER_POINTS: u32 = 25;
pub const BIO_LINK_POINTS: u32 = 30;
pub const SUSPICIOUS_TLD_POINTS: u32 = 20;
pub const BRAND_IMPERSONATION_POINTS: u32 = 35;

/// Two or more gambling keywords
pub const GAMBLING_STRONG_POINTS: u32 = 50;
/// Exactly one gambling keyword
pub const GAMBLING_WEAK_POINTS: u32 = 25;

pub const GAMBLING_PATTERN_POINTS: u32 = 40;
pub const LUCKY_NUMBER_POINTS: u32 = 15;
pub const IP_HOST_POINTS: u32 = 30;
pub const CYRILLIC_POINTS: u32 = 40;
pub const LONG_DOMAIN_POINTS: u32 = 10;

/// Heuristic score ceiling
pub const MAX_SCORE: u32 = 100;

// ============================================================================
// PATTERNS
// ============================================================================

/// `88vip`, `win68` ...
pub static GAMBLING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d{2,3}(vip|club|win|bet|game|slot)|(vip|club|win|bet|game|slot)\d{2,3}")
        .expect("static regex")
});

pub static LUCKY_NUMBERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"68|88|99|789|888|666|777").expect("static regex"));

pub static IPV4_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("static regex"));

/// Homograph attack (Cyrillic look-alikes)
pub static CYRILLIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[а-яА-Я]").expect("static regex"));
