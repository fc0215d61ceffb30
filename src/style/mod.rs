//! Style values extracted from notebook metadata.
//!
//! A cell may carry three style keys, each either raw CSS declarations
//! (`"padding: 10px;"`) or a property mapping (`{"color": "red"}`):
//!
//! | metadata key   | region          | selector id         |
//! |----------------|-----------------|---------------------|
//! | `style`        | whole cell      | `cell-{i}`          |
//! | `input-style`  | input/code area | `cell-{i}-input`    |
//! | `output-style` | rendered output | `cell-{i}-output`   |
//!
//! The notebook itself may carry `style` (inline CSS) and `stylesheet`
//! (one URL or a list of URLs).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod sanitize;

pub use sanitize::{is_denied_url, sanitize_css, sanitize_css_str};

/// Selector id -> style, in insertion (document) order.
pub type StyleRecord = IndexMap<String, StyleValue>;

/// A normalized style: raw declarations or a property mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Css(String),
    Properties(IndexMap<String, String>),
}

impl StyleValue {
    /// Normalize a metadata value.
    ///
    /// Strings are sanitized. Mappings keep their property order; each value
    /// is sanitized unless `pass_through` is set. Any other shape yields `None`.
    pub fn from_metadata(value: &Value, pass_through: bool) -> Option<Self> {
        match value {
            Value::String(css) => Some(StyleValue::Css(sanitize_css_str(css))),
            Value::Object(map) => Some(StyleValue::Properties(normalize_properties(
                map,
                pass_through,
            ))),
            other => {
                log::warn!("ignoring style metadata of unsupported shape: {other}");
                None
            }
        }
    }

    /// Render as a CSS declaration list.
    ///
    /// Strings are emitted verbatim; mappings as `prop: val` joined with `; `.
    pub fn to_css(&self) -> String {
        match self {
            StyleValue::Css(css) => css.clone(),
            StyleValue::Properties(props) => props
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// True if rendering this value would produce no declarations.
    pub fn is_blank(&self) -> bool {
        match self {
            StyleValue::Css(css) => css.trim().is_empty(),
            StyleValue::Properties(props) => props.is_empty(),
        }
    }

    /// Convert back to a metadata value (for template write-back).
    pub fn to_value(&self) -> Value {
        match self {
            StyleValue::Css(css) => Value::String(css.clone()),
            StyleValue::Properties(props) => Value::Object(
                props
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(css: &str) -> Self {
        StyleValue::Css(css.to_string())
    }
}

fn normalize_properties(map: &Map<String, Value>, pass_through: bool) -> IndexMap<String, String> {
    let mut props = IndexMap::with_capacity(map.len());

    for (name, value) in map {
        if !is_css_ident(name) {
            log::warn!("dropping style property with invalid name {name:?}");
            continue;
        }

        let raw = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                log::warn!("dropping style property {name:?} with unsupported value {other}");
                continue;
            }
        };

        let value = if pass_through {
            raw
        } else {
            sanitize_css_str(&raw)
        };
        if value.is_empty() {
            continue;
        }

        props.insert(name.clone(), value);
    }

    props
}

/// Property names must be plain CSS identifiers (`background-color`, `--accent`).
pub(crate) fn is_css_ident(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Which region of a cell a style applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Cell,
    Input,
    Output,
}

impl StyleKind {
    pub const ALL: [StyleKind; 3] = [StyleKind::Cell, StyleKind::Input, StyleKind::Output];

    /// Deterministic selector id for this region of cell `index`.
    pub fn selector_id(self, index: usize) -> String {
        match self {
            StyleKind::Cell => format!("cell-{index}"),
            StyleKind::Input => format!("cell-{index}-input"),
            StyleKind::Output => format!("cell-{index}-output"),
        }
    }

    /// Metadata key the style is read from by default.
    pub fn default_metadata_key(self) -> &'static str {
        match self {
            StyleKind::Cell => "style",
            StyleKind::Input => "input-style",
            StyleKind::Output => "output-style",
        }
    }

    /// Cell metadata key the normalized value is written back to for templates.
    pub fn template_key(self) -> &'static str {
        match self {
            StyleKind::Cell => "cell_style",
            StyleKind::Input => "input_style",
            StyleKind::Output => "output_style",
        }
    }
}

/// Document-level styles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookStyles {
    /// Inline CSS for an extra `<style>` block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Stylesheet URLs, in cascade order.
    #[serde(default, rename = "stylesheet", skip_serializing_if = "Vec::is_empty")]
    pub stylesheets: Vec<String>,
}

impl NotebookStyles {
    /// Read `style` and `stylesheet` from notebook metadata.
    ///
    /// Returns `None` when neither key carries a recognized value.
    pub fn from_metadata(metadata: &Map<String, Value>) -> Option<Self> {
        let style = match metadata.get("style") {
            Some(Value::String(css)) => Some(sanitize_css_str(css)),
            Some(other) => {
                log::warn!("ignoring notebook style of unsupported shape: {other}");
                None
            }
            None => None,
        };

        let stylesheets = match metadata.get("stylesheet") {
            Some(Value::String(url)) => vec![url.trim().to_string()],
            Some(Value::Array(urls)) => urls
                .iter()
                .filter_map(|url| match url.as_str() {
                    Some(url) => Some(url.trim().to_string()),
                    None => {
                        log::warn!("ignoring non-string stylesheet entry: {url}");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                log::warn!("ignoring notebook stylesheet of unsupported shape: {other}");
                Vec::new()
            }
            None => Vec::new(),
        };
        let stylesheets: Vec<String> = stylesheets
            .into_iter()
            .filter(|url| !url.is_empty())
            .filter(|url| {
                let denied = is_denied_url(url);
                if denied {
                    log::warn!("dropping stylesheet with a denied URL scheme: {url:?}");
                }
                !denied
            })
            .collect();

        if style.is_none() && stylesheets.is_empty() {
            return None;
        }

        Some(Self { style, stylesheets })
    }
}
