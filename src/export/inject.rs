//! Style injection into rendered HTML.
//!
//! Turns the styles recorded in [`Resources`] into `<style>` and `<link>`
//! elements and splices them in front of the first `</head>`. This is a plain
//! string operation on the finished document; it does not parse HTML.
//!
//! # Example
//!
//! ```
//! use nbstyle::Resources;
//! use nbstyle::export::augment;
//! use nbstyle::style::StyleValue;
//!
//! let mut resources = Resources::new();
//! resources.styles.insert("cell-0".into(), StyleValue::from("padding: 10px;"));
//!
//! let html = augment("<html><head></head><body></body></html>", &resources);
//! assert!(html.contains("#cell-0 { padding: 10px; }"));
//! ```

use std::fmt::Write;

use memchr::memmem;

use crate::resources::Resources;
use crate::style::{NotebookStyles, StyleRecord, is_css_ident, is_denied_url, sanitize_css_str};
use crate::util::escape_html;

const HEAD_CLOSE: &str = "</head>";

/// Build one `<style>` block with a `#selector { ... }` rule per cell style.
///
/// Rules follow the record's insertion order. Every declaration is
/// sanitized again here, since records may hold pass-through mappings or
/// values a caller inserted directly. Blank values and selector ids that are
/// not CSS identifiers are skipped; with nothing left to emit the result is
/// the empty string.
pub fn generate_style_block(styles: &StyleRecord) -> String {
    let mut rules = String::new();

    for (selector, value) in styles {
        if !is_css_ident(selector) {
            log::warn!("skipping style with invalid selector id {selector:?}");
            continue;
        }
        let css = sanitize_css_str(&value.to_css());
        if css.is_empty() {
            continue;
        }
        writeln!(rules, "#{selector} {{ {css} }}").unwrap();
    }

    if rules.is_empty() {
        return String::new();
    }

    format!("<style>\n/* Custom cell styles */\n{rules}</style>\n")
}

/// Build one `<link rel="stylesheet">` per notebook stylesheet, in order.
///
/// `javascript:` and `data:` URLs are skipped.
pub fn generate_stylesheet_links(styles: &NotebookStyles) -> String {
    let mut links = String::new();
    for href in &styles.stylesheets {
        if is_denied_url(href) {
            log::warn!("skipping stylesheet with a denied URL scheme: {href:?}");
            continue;
        }
        writeln!(links, "<link rel=\"stylesheet\" href=\"{}\">", escape_html(href)).unwrap();
    }
    links
}

/// Build the inline notebook `<style>` block, if the notebook has one.
pub fn generate_notebook_style_block(styles: &NotebookStyles) -> String {
    match styles.style.as_deref().map(str::trim) {
        Some(css) if !css.is_empty() => format!("<style>\n{css}\n</style>\n"),
        _ => String::new(),
    }
}

/// All style fragments for an export: cell rules, then stylesheet links,
/// then the inline notebook style.
pub fn style_fragments(resources: &Resources) -> String {
    let mut fragments = generate_style_block(&resources.styles);

    if let Some(notebook) = &resources.notebook_styles {
        fragments.push_str(&generate_stylesheet_links(notebook));
        fragments.push_str(&generate_notebook_style_block(notebook));
    }

    fragments
}

/// Insert the style fragments for `resources` before the first `</head>`,
/// matched case-insensitively.
///
/// With no fragments the input is returned unchanged. Without a `</head>`
/// the fragments are dropped and the input is returned unchanged. Calling
/// this twice duplicates the injected elements.
pub fn augment(html: &str, resources: &Resources) -> String {
    let fragments = style_fragments(resources);
    if fragments.is_empty() {
        return html.to_string();
    }

    // ASCII lowercasing keeps byte offsets, so `pos` indexes `html` too
    let lower = html.to_ascii_lowercase();
    let Some(pos) = memmem::find(lower.as_bytes(), HEAD_CLOSE.as_bytes()) else {
        log::warn!(
            "rendered HTML has no {HEAD_CLOSE}; dropping {} bytes of styles",
            fragments.len()
        );
        return html.to_string();
    };

    let mut out = String::with_capacity(html.len() + fragments.len());
    out.push_str(&html[..pos]);
    out.push_str(&fragments);
    out.push_str(&html[pos..]);
    out
}
