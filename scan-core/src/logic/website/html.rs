//! HTML Extraction Helpers
//!
//! Regex-based extraction, đủ dùng cho việc đọc title/meta/text của trang.
//! Không parse DOM.

use once_cell::sync::Lazy;
use regex::Regex;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>([^<]*)</title>").expect("static regex"));
static META_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta[^>]*name=["']description["'][^>]*content=["']([^"']*)["']"#)
        .expect("static regex")
});
static FAVICON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<link[^>]*rel=["'](?:shortcut )?icon["'][^>]*href=["']([^"']*)["']"#)
        .expect("static regex")
});
static HTML_LANG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<html[^>]*lang=["']([^"']*)["']"#).expect("static regex"));
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").expect("static regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style.*?</style>").expect("static regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static PASSWORD_INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<input[^>]*type=["']password["']"#).expect("static regex")
});

pub fn title(html: &str) -> String {
    capture(&TITLE, html).unwrap_or_default()
}

pub fn meta_description(html: &str) -> String {
    capture(&META_DESCRIPTION, html).unwrap_or_default()
}

pub fn favicon(html: &str) -> Option<String> {
    capture(&FAVICON, html).filter(|s| !s.is_empty())
}

/// `<html lang>` or `vi` when absent
pub fn language(html: &str) -> String {
    capture(&HTML_LANG, html)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Visible text: scripts, styles and tags removed, whitespace collapsed
pub fn visible_text(html: &str, max_chars: usize) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(html, "");
    let without_styles = STYLE_BLOCK.replace_all(&without_scripts, "");
    let without_tags = TAG.replace_all(&without_styles, " ");
    let collapsed = WHITESPACE.replace_all(&without_tags, " ");
    collapsed.trim().chars().take(max_chars).collect()
}

/// Text with tags removed but scripts kept, as used for keyword matching
pub fn raw_text(html: &str, max_chars: usize) -> String {
    let limited: String = html.chars().take(max_chars).collect();
    TAG.replace_all(&limited, " ").into_owned()
}

pub fn has_password_input(html: &str) -> bool {
    PASSWORD_INPUT.is_match(html)
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="en"><head>
        <title> Đăng nhập Vietcombank </title>
        <meta name="description" content="Xác minh tài khoản">
        <link rel="icon" href="/favicon.ico">
        <style>body { color: red }</style>
        <script>var x = "<b>hidden</b>";</script>
        </head><body><h1>Hello</h1>   <p>world</p>
        <form><input type="password" name="p"></form></body></html>"#;

    #[test]
    fn test_extracts_metadata() {
        assert_eq!(title(PAGE), "Đăng nhập Vietcombank");
        assert_eq!(meta_description(PAGE), "Xác minh tài khoản");
        assert_eq!(favicon(PAGE).as_deref(), Some("/favicon.ico"));
        assert_eq!(language(PAGE), "en");
        assert!(has_password_input(PAGE));
    }

    #[test]
    fn test_visible_text() {
        let text = visible_text(PAGE, 4000);
        assert!(text.contains("Hello world"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
        assert_eq!(visible_text(PAGE, 5).chars().count(), 5);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(title("<p>no title</p>"), "");
        assert_eq!(language("<html>"), "vi");
        assert_eq!(favicon("<p>"), None);
    }
}
