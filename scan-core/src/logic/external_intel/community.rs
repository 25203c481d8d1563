//! Community Intelligence (Vietnam)
//!
//! Seed lists do cộng đồng báo cáo: domain lừa đảo đã biết và domain chính thống
//! kèm thương hiệu. Dùng để seed blocklist/whitelist và phát hiện giả mạo thương hiệu.

use super::types::Severity;

/// Reason stored for community seeded blocklist rows
pub const COMMUNITY_REASON: &str = "Nguồn cộng đồng VN";
pub const COMMUNITY_SOURCE: &str = "community";

/// Known Vietnamese scam domains
pub const VN_SCAM_DOMAINS: &[&str] = &[
    // Gambling / casino
    "bumvip68.club",
    "go88.vin",
    "sunwin.club",
    "iwin68.club",
    "b52.club",
    "rik.vip",
    "yo88.club",
    "hit.club",
    "twin68.club",
    "789club.wine",
    "8xbet.com",
    "sv388.com",
    "kubet.com",
    "jun88.com",
    "f8bet.com",
    "new88.com",
    "shbet.com",
    "hi88.com",
    "mb66.com",
    "789bet.com",
    // Fake banks
    "vietcombank-login.xyz",
    "techcombank-verify.com",
    "mbbank-online.net",
    "tpbank-secure.com",
    "bidv-ebanking.xyz",
    "agribank-online.net",
    "vpbank-verify.com",
    "acb-secure.net",
    // Fake e-commerce
    "shopee-freeship.com",
    "lazada-sale.net",
    "tiki-deal.com",
    "sendo-promo.net",
    // Investment
    "binance-vn.com",
    "forex-vip.net",
    "crypto-invest.xyz",
    "bitcoin-profit.net",
    // Job scams
    "viec-online.com",
    "tuyen-ctv.net",
    "lam-tai-nha.com",
];

/// A trusted Vietnamese domain and the brand it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustedDomain {
    pub domain: &'static str,
    pub brand: &'static str,
    pub category: &'static str,
}

const fn trusted(domain: &'static str, brand: &'static str, category: &'static str) -> TrustedDomain {
    TrustedDomain { domain, brand, category }
}

pub const VN_TRUSTED_DOMAINS: &[TrustedDomain] = &[
    // Banks
    trusted("vietcombank.com.vn", "Vietcombank", "bank"),
    trusted("techcombank.com.vn", "Techcombank", "bank"),
    trusted("mbbank.com.vn", "MB Bank", "bank"),
    trusted("tpbank.vn", "TPBank", "bank"),
    trusted("acb.com.vn", "ACB", "bank"),
    trusted("bidv.com.vn", "BIDV", "bank"),
    trusted("agribank.com.vn", "Agribank", "bank"),
    trusted("vpbank.com.vn", "VPBank", "bank"),
    trusted("sacombank.com.vn", "Sacombank", "bank"),
    trusted("hdbank.com.vn", "HDBank", "bank"),
    trusted("vib.com.vn", "VIB", "bank"),
    trusted("msb.com.vn", "MSB", "bank"),
    trusted("ocb.com.vn", "OCB", "bank"),
    trusted("seabank.com.vn", "SeABank", "bank"),
    trusted("lpbank.com.vn", "LPBank", "bank"),
    trusted("vietinbank.vn", "VietinBank", "bank"),
    // E-wallets
    trusted("momo.vn", "MoMo", "ewallet"),
    trusted("zalopay.vn", "ZaloPay", "ewallet"),
    trusted("vnpay.vn", "VNPay", "ewallet"),
    trusted("shopeepay.vn", "ShopeePay", "ewallet"),
    // E-commerce
    trusted("shopee.vn", "Shopee", "ecommerce"),
    trusted("lazada.vn", "Lazada", "ecommerce"),
    trusted("tiki.vn", "Tiki", "ecommerce"),
    trusted("sendo.vn", "Sendo", "ecommerce"),
    trusted("thegioididong.com", "TGDĐ", "ecommerce"),
    trusted("dienmayxanh.com", "Điện Máy Xanh", "ecommerce"),
    trusted("bachhoaxanh.com", "Bách Hóa Xanh", "ecommerce"),
    trusted("cellphones.com.vn", "CellphoneS", "ecommerce"),
    trusted("fptshop.com.vn", "FPT Shop", "ecommerce"),
    // Government
    trusted("gov.vn", "Chính phủ", "government"),
    trusted("chinhphu.vn", "Chính phủ", "government"),
    trusted("dangcongsan.vn", "Đảng CSVN", "government"),
    trusted("quochoi.vn", "Quốc hội", "government"),
    trusted("mof.gov.vn", "Bộ Tài chính", "government"),
    trusted("sbv.gov.vn", "Ngân hàng NN", "government"),
    // News
    trusted("vnexpress.net", "VnExpress", "news"),
    trusted("tuoitre.vn", "Tuổi Trẻ", "news"),
    trusted("thanhnien.vn", "Thanh Niên", "news"),
    trusted("dantri.com.vn", "Dân Trí", "news"),
    trusted("vietnamnet.vn", "VietnamNet", "news"),
    trusted("vtv.vn", "VTV", "news"),
    trusted("vov.vn", "VOV", "news"),
    trusted("nhandan.vn", "Nhân Dân", "news"),
    // Tech / telecom
    trusted("fpt.com.vn", "FPT", "tech"),
    trusted("vng.com.vn", "VNG", "tech"),
    trusted("vingroup.net", "Vingroup", "tech"),
    trusted("viettel.com.vn", "Viettel", "telecom"),
    trusted("vnpt.com.vn", "VNPT", "telecom"),
    trusted("mobifone.vn", "MobiFone", "telecom"),
    // Education
    trusted("edu.vn", "Giáo dục", "education"),
    trusted("vnu.edu.vn", "ĐHQG HN", "education"),
    trusted("hust.edu.vn", "BKHN", "education"),
    trusted("ueh.edu.vn", "UEH", "education"),
    // Social
    trusted("facebook.com", "Facebook", "social"),
    trusted("zalo.me", "Zalo", "social"),
    trusted("tiktok.com", "TikTok", "social"),
    trusted("youtube.com", "YouTube", "social"),
    trusted("google.com", "Google", "tech"),
    trusted("google.com.vn", "Google VN", "tech"),
];

/// Severity for a seeded scam domain: fake banking / login pages rank higher
pub fn scam_seed_severity(domain: &str) -> Severity {
    if domain.contains("bank") || domain.contains("login") {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// "Giả mạo {brand}" for every trusted brand the domain imitates
pub fn brand_mimic_sources(domain: &str) -> Vec<String> {
    let domain = domain.to_lowercase();

    VN_TRUSTED_DOMAINS
        .iter()
        .filter(|t| {
            let brand: String = t.brand.to_lowercase().split_whitespace().collect();
            domain.contains(&brand)
                && domain != t.domain
                && !domain.ends_with(&format!(".{}", t.domain))
        })
        .map(|t| format!("Giả mạo {}", t.brand))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_severity() {
        assert_eq!(scam_seed_severity("vietcombank-login.xyz"), Severity::High);
        assert_eq!(scam_seed_severity("go88.vin"), Severity::Medium);
    }

    #[test]
    fn test_brand_mimic() {
        let sources = brand_mimic_sources("vietcombank-login.xyz");
        assert_eq!(sources, vec!["Giả mạo Vietcombank".to_string()]);

        // "MB Bank" → "mbbank"
        assert!(brand_mimic_sources("mbbank-online.net").contains(&"Giả mạo MB Bank".to_string()));
    }

    #[test]
    fn test_official_domain_not_mimic() {
        assert!(brand_mimic_sources("vietcombank.com.vn").is_empty());
        assert!(brand_mimic_sources("portal.vietcombank.com.vn").is_empty());
        assert!(brand_mimic_sources("example.org").is_empty());
    }

    #[test]
    fn test_seed_lists_have_no_overlap() {
        for scam in VN_SCAM_DOMAINS {
            assert!(VN_TRUSTED_DOMAINS.iter().all(|t| t.domain != *scam));
        }
    }
}
