//! Deny-list sanitizer for user-supplied CSS text.
//!
//! Every CSS string taken from notebook metadata passes through
//! [`sanitize_css_str`] before it is interpolated into HTML, either inside a
//! `<style>` block or a `style="..."` attribute.
//!
//! # Known limitation
//!
//! This is a pattern deny-list, not a CSS parser. It removes the listed
//! script-execution and remote-loading vectors (case-insensitive, tolerant of
//! whitespace between characters) but novel obfuscations it does not list,
//! such as CSS escape sequences (`j\61vascript:`) or comments splitting a
//! keyword (`java/**/script:`), are not recognized.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Keywords removed wherever they appear, with any whitespace between characters.
const DENIED: &[&str] = &[
    "javascript:",
    "expression(",
    "behavior:",
    "-moz-binding:",
    "@import",
    "data:",
];

static DENY_LIST: LazyLock<Vec<Regex>> =
    LazyLock::new(|| DENIED.iter().map(|word| spaced_pattern(word)).collect());

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());

/// URL schemes that turn a stylesheet link into inline or script content.
const DENIED_SCHEMES: &[&str] = &["javascript:", "data:"];

static DENIED_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    let schemes = DENIED_SCHEMES
        .iter()
        .map(|scheme| spaced_body(scheme))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^\s*(?:{schemes})")).unwrap()
});

/// `word` with optional whitespace between every character (`j a v a s c r i p t :`).
fn spaced_body(word: &str) -> String {
    word.chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect::<Vec<_>>()
        .join(r"\s*")
}

fn spaced_pattern(word: &str) -> Regex {
    Regex::new(&format!("(?i){}", spaced_body(word))).unwrap()
}

/// Whether a stylesheet URL uses a `javascript:` or `data:` scheme.
///
/// Matching is case-insensitive and tolerates whitespace anywhere in the
/// scheme, like the CSS deny-list.
pub fn is_denied_url(url: &str) -> bool {
    DENIED_SCHEME.is_match(url)
}

/// Sanitize a metadata value as CSS text.
///
/// Non-string values sanitize to the empty string.
pub fn sanitize_css(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_css_str(s),
        _ => String::new(),
    }
}

/// Strip script-execution vectors from CSS text.
///
/// Removes `javascript:`, `expression(`, `behavior:`, `-moz-binding:`,
/// `@import`, `data:`, and any HTML tag fragment. Double quotes become single
/// quotes and surrounding whitespace is trimmed.
///
/// Removal repeats until nothing changes, so a removal cannot splice two
/// fragments into a new denied keyword (`javajavascript:script:`).
pub fn sanitize_css_str(css: &str) -> String {
    let mut out = css.to_string();

    loop {
        let before = out.len();

        out = HTML_TAG.replace_all(&out, "").into_owned();
        // An unterminated tag could still open one once spliced into HTML
        out.retain(|c| c != '<');
        for pattern in DENY_LIST.iter() {
            out = pattern.replace_all(&out, "").into_owned();
        }

        if out.len() == before {
            break;
        }
    }

    out.replace('"', "'").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn collapsed_lower(s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    #[test]
    fn test_clean_declaration_unchanged() {
        let clean = "background-color: #e3f2fd; padding: 10px;";
        assert_eq!(sanitize_css_str(clean), clean);
        assert_eq!(sanitize_css_str("  padding: 10px;\n"), "padding: 10px;");
    }

    #[test]
    fn test_removes_javascript_url() {
        let out = sanitize_css_str("background: url('javascript:alert(1)');");
        assert!(!collapsed_lower(&out).contains("javascript:"));
        assert!(out.starts_with("background: url('"));
    }

    #[test]
    fn test_removes_spaced_and_mixed_case() {
        let out = sanitize_css_str("background: url('J a V a S c R i P t :alert(1)')");
        assert!(!collapsed_lower(&out).contains("javascript:"));

        let out = sanitize_css_str("width: EXPRESSION (alert('XSS'));");
        assert!(!collapsed_lower(&out).contains("expression("));
    }

    #[test]
    fn test_removes_each_denied_keyword() {
        let cases = [
            ("width: expression(alert('XSS'));", "expression("),
            ("behavior: url(script.htc);", "behavior:"),
            ("-moz-binding: url(evil.xml#xss);", "-moz-binding:"),
            ("@import url('evil.css');", "@import"),
            ("background: url(data:image/svg+xml;base64,PHN2Zz4=);", "data:"),
        ];

        for (input, keyword) in cases {
            let out = sanitize_css_str(input);
            assert!(
                !collapsed_lower(&out).contains(keyword),
                "{keyword} survived in {out:?}"
            );
        }
    }

    #[test]
    fn test_removes_html_tags() {
        let out = sanitize_css_str("color: red;</style><script>alert(1)</script>");
        assert!(!out.contains('<'));
        assert!(!out.contains("script>"));
        assert!(out.starts_with("color: red;"));
    }

    #[test]
    fn test_removes_unterminated_tag_opener() {
        let out = sanitize_css_str("color: red; </style");
        assert!(!out.contains('<'));
    }

    #[test]
    fn test_nested_keywords_do_not_reassemble() {
        let out = sanitize_css_str("url(javajavascript:script:alert(1))");
        assert!(!collapsed_lower(&out).contains("javascript:"));
    }

    #[test]
    fn test_denied_url_schemes() {
        assert!(is_denied_url("data:text/css,@import url(evil.css);"));
        assert!(is_denied_url("  DATA:text/css,body{}"));
        assert!(is_denied_url("j a v a s c r i p t :alert(1)"));
        assert!(is_denied_url("JavaScript:alert(1)"));

        assert!(!is_denied_url("https://example.com/theme.css"));
        assert!(!is_denied_url("css/data.css"));
        assert!(!is_denied_url("theme.css?v=data:1"));
    }

    #[test]
    fn test_double_quotes_become_single() {
        assert_eq!(
            sanitize_css_str(r#"font-family: "Fira Code";"#),
            "font-family: 'Fira Code';"
        );
    }

    #[test]
    fn test_non_string_and_empty() {
        assert_eq!(sanitize_css(&json!(42)), "");
        assert_eq!(sanitize_css(&json!(null)), "");
        assert_eq!(sanitize_css(&json!({"color": "red"})), "");
        assert_eq!(sanitize_css(&json!("")), "");
        assert_eq!(sanitize_css(&json!("   ")), "");
        assert_eq!(sanitize_css(&json!("color: red")), "color: red");
    }

    proptest! {
        #[test]
        fn prop_no_denied_keyword_survives(
            parts in prop::collection::vec(
                prop_oneof![
                    Just("javascript:".to_string()),
                    Just("JaVa ScRiPt :".to_string()),
                    Just("expression(".to_string()),
                    Just("behavior:".to_string()),
                    Just("-moz-binding:".to_string()),
                    Just("@import".to_string()),
                    Just("data:".to_string()),
                    Just("<b>".to_string()),
                    Just("<".to_string()),
                    "[a-z :;()@<>'\"-]{0,6}",
                ],
                0..8
            )
        ) {
            let input: String = parts.concat();
            let out = collapsed_lower(&sanitize_css_str(&input));
            for &word in DENIED {
                prop_assert!(!out.contains(word), "{} survived in {:?}", word, out);
            }
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('"'));
        }

        #[test]
        fn prop_sanitize_is_idempotent(input in "[a-zA-Z0-9 :;()#@<>'\"-]{0,40}") {
            let once = sanitize_css_str(&input);
            prop_assert_eq!(sanitize_css_str(&once), once.clone());
        }
    }
}
