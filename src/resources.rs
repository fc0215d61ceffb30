//! The resources side-channel threaded through an export.
//!
//! Every pipeline stage reads and writes the same [`Resources`] value. Style
//! stages own `styles` and `notebook_styles` only; anything another stage or
//! the caller stored under [`Resources::extra`] is left untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::style::{NotebookStyles, StyleRecord};

/// Per-export side-channel shared by all pipeline stages.
///
/// Use a fresh instance per export: reusing one across exports merges their
/// cell styles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Cell styles keyed by selector id (`cell-0`, `cell-0-input`, ...).
    #[serde(default)]
    pub styles: StyleRecord,
    /// Document-level styles; absent when the notebook declares none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_styles: Option<NotebookStyles>,
    /// Extension of the exported artifact (`.html`, `.pdf`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_extension: Option<String>,
    #[serde(default)]
    pub metadata: ResourceMetadata,
    /// Keys owned by other stages or the caller.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where the notebook came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Notebook name without extension.
    #[serde(default)]
    pub name: String,
    /// Directory the notebook was read from; relative image paths resolve against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<std::path::PathBuf>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources for a notebook read from `path`.
    pub fn for_path(path: &std::path::Path) -> Self {
        Self {
            metadata: ResourceMetadata {
                name: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.parent().map(std::path::Path::to_path_buf),
            },
            ..Self::default()
        }
    }

    /// True if neither cell nor notebook styles would emit anything.
    pub fn has_styles(&self) -> bool {
        self.styles.values().any(|v| !v.is_blank())
            || self
                .notebook_styles
                .as_ref()
                .is_some_and(|nb| {
                    !nb.stylesheets.is_empty()
                        || nb.style.as_deref().is_some_and(|s| !s.trim().is_empty())
                })
    }
}
