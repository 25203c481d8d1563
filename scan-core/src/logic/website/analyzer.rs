//! Website Analyzer
//!
//! Phân tích chi tiết website: lĩnh vực, công nghệ, độ tin cậy.
//! Chạy trên HTML đã fetch sẵn, không tự gọi network.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::html;
use crate::constants::{is_official_domain, SCAM_URL_KEYWORDS};

// ============================================================================
// PATTERN TABLES
// ============================================================================

struct IndustryPattern {
    industry: &'static str,
    category: &'static str,
    sub_category: &'static str,
    keywords: &'static [&'static str],
}

/// Minimum keyword hits before an industry is assigned
const INDUSTRY_MIN_MATCHES: usize = 2;

/// Characters of page text scanned for industry keywords
const INDUSTRY_SCAN_CHARS: usize = 10_000;

const INDUSTRY_PATTERNS: &[IndustryPattern] = &[
    IndustryPattern {
        industry: "banking",
        category: "Tài chính",
        sub_category: "Ngân hàng",
        keywords: &["ngân hàng", "bank", "tài khoản", "chuyển tiền", "gửi tiết kiệm", "vay", "thẻ tín dụng", "internet banking", "mobile banking"],
    },
    IndustryPattern {
        industry: "ewallet",
        category: "Tài chính",
        sub_category: "Ví điện tử",
        keywords: &["ví điện tử", "e-wallet", "momo", "zalopay", "vnpay", "thanh toán", "nạp tiền", "rút tiền"],
    },
    IndustryPattern {
        industry: "ecommerce",
        category: "Thương mại điện tử",
        sub_category: "Mua sắm online",
        keywords: &["mua sắm", "shopping", "giỏ hàng", "đặt hàng", "freeship", "khuyến mãi", "sale", "sản phẩm", "giá"],
    },
    IndustryPattern {
        industry: "gambling",
        category: "Cờ bạc",
        sub_category: "Casino/Lô đề",
        keywords: &["casino", "slot", "poker", "baccarat", "lô đề", "xổ số", "cá cược", "cá độ", "nổ hũ", "game bài", "tài xỉu"],
    },
    IndustryPattern {
        industry: "investment",
        category: "Đầu tư",
        sub_category: "Tài chính/Crypto",
        keywords: &["đầu tư", "forex", "crypto", "bitcoin", "chứng khoán", "trading", "lợi nhuận", "lãi suất"],
    },
    IndustryPattern {
        industry: "news",
        category: "Tin tức",
        sub_category: "Báo chí",
        keywords: &["tin tức", "news", "báo", "thời sự", "bài viết", "phóng sự", "chuyên mục"],
    },
    IndustryPattern {
        industry: "education",
        category: "Giáo dục",
        sub_category: "Đào tạo",
        keywords: &["giáo dục", "học", "trường", "đại học", "khóa học", "đào tạo", "sinh viên", "giảng viên"],
    },
    IndustryPattern {
        industry: "government",
        category: "Chính phủ",
        sub_category: "Dịch vụ công",
        keywords: &["chính phủ", "bộ", "sở", "ubnd", "công an", "thuế", "hành chính", "dịch vụ công"],
    },
    IndustryPattern {
        industry: "healthcare",
        category: "Y tế",
        sub_category: "Chăm sóc sức khỏe",
        keywords: &["bệnh viện", "y tế", "sức khỏe", "bác sĩ", "thuốc", "khám bệnh", "điều trị"],
    },
    IndustryPattern {
        industry: "job",
        category: "Việc làm",
        sub_category: "Tuyển dụng",
        keywords: &["tuyển dụng", "việc làm", "job", "career", "ứng tuyển", "cv", "nhân sự", "lương"],
    },
    IndustryPattern {
        industry: "social",
        category: "Mạng xã hội",
        sub_category: "Social Media",
        keywords: &["mạng xã hội", "social", "bạn bè", "kết nối", "chia sẻ", "follow", "like"],
    },
    IndustryPattern {
        industry: "travel",
        category: "Du lịch",
        sub_category: "Đặt phòng/Tour",
        keywords: &["du lịch", "travel", "khách sạn", "vé máy bay", "tour", "booking", "resort"],
    },
    IndustryPattern {
        industry: "realestate",
        category: "Bất động sản",
        sub_category: "Mua bán/Cho thuê",
        keywords: &["bất động sản", "nhà đất", "căn hộ", "chung cư", "mua bán nhà", "cho thuê"],
    },
];

#[derive(Clone, Copy, PartialEq)]
enum TechKind {
    Framework,
    Cms,
    Other,
}

static TECH_PATTERNS: Lazy<Vec<(&'static str, TechKind, Regex)>> = Lazy::new(|| {
    [
        ("React", TechKind::Framework, r"(?i)react|__NEXT_DATA__|_next"),
        ("Next.js", TechKind::Framework, r"(?i)__NEXT_DATA__|_next/static"),
        ("Vue", TechKind::Framework, r"(?i)vue|__VUE__|v-app"),
        ("Angular", TechKind::Framework, r"(?i)ng-app|angular"),
        ("WordPress", TechKind::Cms, r"(?i)wp-content|wordpress"),
        ("Shopify", TechKind::Cms, r"(?i)shopify|cdn\.shopify"),
        ("Laravel", TechKind::Other, r"(?i)laravel|csrf-token"),
        ("Django", TechKind::Other, r"(?i)csrfmiddlewaretoken|django"),
        ("Bootstrap", TechKind::Other, r"(?i)bootstrap"),
        ("Tailwind", TechKind::Other, r"(?i)tailwind"),
        ("jQuery", TechKind::Other, r"(?i)jquery"),
        ("Google Analytics", TechKind::Other, r"(?i)google-analytics|gtag"),
        ("Facebook Pixel", TechKind::Other, r"(?i)fbevents|facebook.*pixel"),
        ("Cloudflare", TechKind::Other, r"(?i)cloudflare"),
        ("Google Fonts", TechKind::Other, r"(?i)fonts\.googleapis"),
        ("reCAPTCHA", TechKind::Other, r"(?i)recaptcha"),
    ]
    .into_iter()
    .map(|(name, kind, pattern)| (name, kind, Regex::new(pattern).expect("static regex")))
    .collect()
});

static PAYMENT_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)credit.?card|cvv|thẻ.?tín.?dụng|visa|mastercard").expect("static regex")
});
static CONTACT_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"contact|liên hệ|hotline|điện thoại|email").expect("static regex"));
static SOCIAL_LINKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)facebook\.com|twitter\.com|instagram\.com|youtube\.com|zalo").expect("static regex")
});
static PRIVACY_POLICY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"privacy|chính sách bảo mật|điều khoản riêng tư").expect("static regex")
});
static TERMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"terms|điều khoản|quy định").expect("static regex"));
static OG_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<meta[^>]*property=["']og:"#).expect("static regex"));
static SITEMAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sitemap").expect("static regex"));
static VIEWPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)viewport").expect("static regex"));

// ============================================================================
// RESULT
// ============================================================================

/// Thông tin website đã phân tích
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteInfo {
    pub title: String,
    pub description: String,
    pub favicon: Option<String>,
    pub language: String,

    pub category: String,
    pub industry: String,
    pub sub_category: String,

    pub has_ssl: bool,
    pub technologies: Vec<String>,
    pub framework: Option<String>,
    pub cms: Option<String>,

    pub has_login_form: bool,
    pub has_payment_form: bool,
    pub has_contact_info: bool,
    pub has_social_links: bool,
    pub has_privacy_policy: bool,
    pub has_terms_of_service: bool,
    pub has_meta_tags: bool,
    pub has_sitemap: bool,
    pub mobile_optimized: bool,

    pub risk_factors: Vec<String>,
    pub trust_factors: Vec<String>,
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// Analyze fetched HTML for the given URL
pub fn analyze_html(url: &str, domain: &str, html: &str) -> WebsiteInfo {
    let html_lower = html.to_lowercase();
    let title = html::title(html);
    let description = html::meta_description(html);

    let content_text = format!(
        "{} {} {}",
        title,
        description,
        html::raw_text(html, INDUSTRY_SCAN_CHARS)
    )
    .to_lowercase();

    let (industry, category, sub_category) = INDUSTRY_PATTERNS
        .iter()
        .find(|p| {
            p.keywords.iter().filter(|k| content_text.contains(*k)).count() >= INDUSTRY_MIN_MATCHES
        })
        .map(|p| (p.industry, p.category, p.sub_category))
        .unwrap_or(("Chưa xác định", "Khác", "Chưa phân loại"));

    let mut technologies = Vec::new();
    let mut framework = None;
    let mut cms = None;
    for (name, kind, pattern) in TECH_PATTERNS.iter() {
        if pattern.is_match(html) {
            technologies.push(name.to_string());
            match kind {
                TechKind::Framework => framework = Some(name.to_string()),
                TechKind::Cms => cms = Some(name.to_string()),
                TechKind::Other => {}
            }
        }
    }

    let has_ssl = url.to_lowercase().starts_with("https://");
    let has_login_form = html::has_password_input(html);
    let has_payment_form = PAYMENT_FORM.is_match(html);
    let has_contact_info = CONTACT_INFO.is_match(&html_lower);
    let has_social_links = SOCIAL_LINKS.is_match(html);
    let has_privacy_policy = PRIVACY_POLICY.is_match(&html_lower);
    let has_terms_of_service = TERMS.is_match(&html_lower);
    let mobile_optimized = VIEWPORT.is_match(html);

    let mut risk_factors = Vec::new();
    let mut trust_factors = Vec::new();

    if has_ssl {
        trust_factors.push("Có chứng chỉ SSL".to_string());
    } else {
        risk_factors.push("Không có HTTPS".to_string());
    }
    if has_login_form && !has_ssl {
        risk_factors.push("Form đăng nhập không bảo mật".to_string());
    }
    if has_payment_form && !has_ssl {
        risk_factors.push("Form thanh toán không bảo mật".to_string());
    }
    if industry == "gambling" {
        risk_factors.push("Website cờ bạc".to_string());
    }
    if !has_contact_info {
        risk_factors.push("Không có thông tin liên hệ".to_string());
    }
    if !has_privacy_policy {
        risk_factors.push("Không có chính sách bảo mật".to_string());
    }
    let url_lower = url.to_lowercase();
    if let Some(keyword) = SCAM_URL_KEYWORDS.iter().find(|k| url_lower.contains(*k)) {
        risk_factors.push(format!("URL chứa từ khóa đáng ngờ: {}", keyword));
    }

    if is_official_domain(domain) {
        trust_factors.push("Domain chính thức".to_string());
    }
    if has_contact_info {
        trust_factors.push("Có thông tin liên hệ".to_string());
    }
    if has_social_links {
        trust_factors.push("Có liên kết mạng xã hội".to_string());
    }
    if has_privacy_policy {
        trust_factors.push("Có chính sách bảo mật".to_string());
    }
    if has_terms_of_service {
        trust_factors.push("Có điều khoản sử dụng".to_string());
    }
    if mobile_optimized {
        trust_factors.push("Tối ưu cho mobile".to_string());
    }

    WebsiteInfo {
        title,
        description,
        favicon: html::favicon(html),
        language: html::language(html),
        category: category.to_string(),
        industry: industry.to_string(),
        sub_category: sub_category.to_string(),
        has_ssl,
        technologies,
        framework,
        cms,
        has_login_form,
        has_payment_form,
        has_contact_info,
        has_social_links,
        has_privacy_policy,
        has_terms_of_service,
        has_meta_tags: OG_META.is_match(html),
        has_sitemap: SITEMAP.is_match(html),
        mobile_optimized,
        risk_factors,
        trust_factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gambling_site() {
        let html = r#"<html><head><title>Nổ hũ club</title>
            <meta name="viewport" content="width=device-width"></head>
            <body>Casino online, tài xỉu, game bài đổi thưởng</body></html>"#;
        let info = analyze_html("http://go88.vin/nhan-qua", "go88.vin", html);

        assert_eq!(info.industry, "gambling");
        assert_eq!(info.category, "Cờ bạc");
        assert!(!info.has_ssl);
        assert!(info.risk_factors.contains(&"Website cờ bạc".to_string()));
        assert!(info.risk_factors.contains(&"Không có HTTPS".to_string()));
        assert!(info.risk_factors.iter().any(|r| r.contains("nhan-qua")));
        assert!(info.mobile_optimized);
    }

    #[test]
    fn test_trusted_bank_page() {
        let html = r#"<html lang="vi"><head><title>Vietcombank</title>
            <meta property="og:title" content="VCB">
            <script src="/wp-content/app.js"></script></head>
            <body>Ngân hàng số. Internet banking. Liên hệ hotline 1900.
            <a href="https://facebook.com/vcb">fb</a> Chính sách bảo mật. Điều khoản.</body></html>"#;
        let info = analyze_html("https://vietcombank.com.vn/", "vietcombank.com.vn", html);

        assert_eq!(info.industry, "banking");
        assert_eq!(info.cms.as_deref(), Some("WordPress"));
        assert!(info.has_meta_tags);
        assert!(info.has_contact_info);
        assert!(info.has_social_links);
        assert!(info.trust_factors.contains(&"Domain chính thức".to_string()));
        assert!(info.trust_factors.contains(&"Có chứng chỉ SSL".to_string()));
        assert!(!info.risk_factors.contains(&"Không có chính sách bảo mật".to_string()));
    }

    #[test]
    fn test_unknown_industry() {
        let info = analyze_html("https://example.com/", "example.com", "<html><body>hi</body></html>");
        assert_eq!(info.industry, "Chưa xác định");
        assert_eq!(info.category, "Khác");
        assert_eq!(info.language, "vi");
    }
}
