//! Central Rule Tables
//!
//! Single source of truth cho các bảng tĩnh dùng bởi heuristics,
//! phân loại domain và community intelligence.
//! To tune detection, only edit this file.

/// Crate version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by health checks
pub const APP_NAME: &str = "antiscam-api";

/// Maximum accepted URL length (characters)
pub const MAX_URL_LENGTH: usize = 2048;

/// DNS name limit (RFC 1035, without trailing dot)
pub const MAX_HOST_LENGTH: usize = 253;

/// Browser user agent used when fetching pages
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

// ============================================
// Heuristic tables
// ============================================

/// TLDs thường bị lạm dụng (rẻ hoặc miễn phí)
pub const SUSPICIOUS_TLDS: &[&str] = &[
    ".xyz", ".top", ".club", ".work", ".click",
    ".link", ".info", ".online", ".site", ".website",
    ".space", ".fun", ".icu", ".buzz", ".monster",
    ".tk", ".ml", ".ga", ".cf", ".gq", ".pw",
];

/// Link shortener services
pub const LINK_SHORTENERS: &[&str] = &[
    "bit.ly", "tinyurl.com", "goo.gl", "t.co", "ow.ly",
    "is.gd", "buff.ly", "adf.ly", "shorte.st", "bc.vc",
    "j.mp", "v.gd", "tr.im", "tiny.cc", "lnk.to",
    "rb.gy", "cutt.ly", "s.id", "shorturl.at", "rebrand.ly",
];

/// Bio link services, hay dùng làm landing page lừa đảo
pub const BIO_LINK_SERVICES: &[&str] = &[
    "linktr.ee", "lnk.bio", "bio.link", "linkin.bio",
    "lnkbio.me", "linkbio.co", "tap.bio", "campsite.bio",
    "beacons.ai", "hoo.be", "solo.to", "carrd.co",
    "bio.fm", "withkoji.com", "snipfeed.co", "stan.store",
    "allmylinks.com", "contactinbio.com", "lynk.id", "msha.ke",
    "milkshake.app", "direct.me", "flowpage.com", "link.space",
];

/// Cờ bạc / casino (bất hợp pháp tại VN)
pub const GAMBLING_KEYWORDS: &[&str] = &[
    "vip", "bet", "casino", "slot", "poker", "baccarat", "blackjack",
    "xoso", "xo-so", "lo-de", "lode", "soi-cau", "soicau",
    "game-bai", "gamebai", "danh-bai", "danhbai",
    "ca-cuoc", "cacuoc", "cuoc", "dat-cuoc", "datcuoc",
    "nha-cai", "nhacai", "bong-da", "bongda", "the-thao", "thethao",
    "tai-xiu", "taixiu", "xoc-dia", "xocdia", "bau-cua", "baucua",
    "no-hu", "nohu", "quay-hu", "quayhu", "jackpot",
    "win", "lucky", "bonus", "spin", "roll",
    "68", "88", "99", "789", "888", "666", "777", "168",
    "sv388", "sunwin", "iwin", "go88", "rik", "b52",
    "may88", "hit", "club", "fun", "live",
    "inn", "palace", "crown", "royal", "diamond", "gold", "king", "queen",
    "vegas", "monte", "atlantic", "roulette", "dice", "chip",
];

/// Thương hiệu hay bị giả mạo
pub const BRAND_KEYWORDS: &[&str] = &[
    "vietcombank", "techcombank", "vietinbank", "bidv", "mbbank",
    "tpbank", "vpbank", "acb", "sacombank", "hdbank",
    "shopee", "lazada", "tiki", "sendo",
    "facebook", "zalo", "google", "microsoft",
    "apple", "samsung", "grab", "gojek", "be",
    "momo", "zalopay", "vnpay", "viettelpay",
];

/// Scam keywords in URL path (Vietnamese slugs)
pub const SCAM_URL_KEYWORDS: &[&str] = &[
    "trung-thuong", "trungthuong", "nhan-qua", "nhanqua",
    "khuyen-mai", "khuyenmai", "giam-gia", "giamgia",
    "mien-phi", "mienphi", "free-gift", "freegift",
    "dau-tu", "dautu", "kiem-tien", "kiemtien",
    "lam-giau", "lamgiau", "x100", "x1000", "profit",
    "vay-tien", "vaytien", "vay-nhanh", "vaynhanh",
    "ho-tro", "hotro", "cskh", "support", "verify",
    "xac-minh", "xacminh", "cap-nhat", "capnhat",
    "dang-nhap", "dangnhap", "login", "signin",
    "nhan-tien", "nhantien", "rut-tien", "ruttien",
    "chuyen-khoan", "chuyenkhoan", "the-cao", "thecao",
];

/// Domain length above which a domain is considered suspicious
pub const LONG_DOMAIN_THRESHOLD: usize = 40;

// ============================================
// Official domains
// ============================================

/// Ngân hàng Việt Nam
pub const BANK_DOMAINS: &[&str] = &[
    "vietcombank.com.vn", "techcombank.com.vn", "vietinbank.vn", "bidv.com.vn",
    "mbbank.com.vn", "tpbank.vn", "vpbank.com.vn", "acb.com.vn",
    "sacombank.com.vn", "hdbank.com.vn", "ocb.com.vn", "msb.com.vn",
    "vib.com.vn", "eximbank.com.vn", "shb.com.vn", "seabank.com.vn",
    "lpbank.com.vn", "namabank.com.vn", "abbank.vn", "baovietbank.com.vn",
];

/// Thương mại điện tử
pub const ECOMMERCE_DOMAINS: &[&str] = &[
    "shopee.vn", "lazada.vn", "tiki.vn", "sendo.vn", "thegioididong.com",
    "dienmayxanh.com", "fptshop.com.vn", "cellphones.com.vn", "bachhoaxanh.com",
];

/// Cơ quan nhà nước
pub const GOV_DOMAINS: &[&str] = &[
    "gov.vn", "chinhphu.vn", "dangcongsan.vn", "quochoi.vn",
    "mof.gov.vn", "moit.gov.vn", "moet.gov.vn", "moh.gov.vn",
];

/// Mạng xã hội
pub const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com", "zalo.me", "tiktok.com", "youtube.com",
    "instagram.com", "twitter.com", "linkedin.com",
];

/// True if `domain` is one of the official domains or a subdomain of one
pub fn is_official_domain(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    BANK_DOMAINS
        .iter()
        .chain(ECOMMERCE_DOMAINS)
        .chain(GOV_DOMAINS)
        .chain(SOCIAL_DOMAINS)
        .any(|d| domain == *d || domain.ends_with(&format!(".{}", d)))
}

// ============================================
// Labels used by community verification
// ============================================

/// Labels an admin can assign when verifying a report
pub const REVIEW_LABELS: &[&str] = &["SAFE", "PHISHING", "SCAM", "SPAM", "MALWARE"];

/// Review labels that push a domain into the blocklist
pub const BLOCKING_REVIEW_LABELS: &[&str] = &["PHISHING", "SCAM", "MALWARE"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_official_domain_matches_subdomains() {
        assert!(is_official_domain("vietcombank.com.vn"));
        assert!(is_official_domain("portal.vietcombank.com.vn"));
        assert!(is_official_domain("thuvienphapluat.gov.vn"));
        assert!(!is_official_domain("vietcombank-login.xyz"));
    }

    #[test]
    fn test_blocking_labels_are_review_labels() {
        for label in BLOCKING_REVIEW_LABELS {
            assert!(REVIEW_LABELS.contains(label));
        }
    }
}
