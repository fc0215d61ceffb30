//! Style extraction: cell and notebook style metadata into [`Resources`].

use crate::notebook::{Cell, Notebook};
use crate::resources::Resources;
use crate::style::{NotebookStyles, StyleKind, StyleValue};

use super::Preprocessor;

/// Configuration for [`StyleExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleExtractorConfig {
    /// Cell metadata key for the whole-cell style (default `style`).
    pub style_key: String,
    /// Cell metadata key for the input-region style (default `input-style`).
    pub input_style_key: String,
    /// Cell metadata key for the output-region style (default `output-style`).
    pub output_style_key: String,
    /// Keep mapping values as written instead of sanitizing each one.
    /// Only for consumers that treat the mapping as structured CSS.
    pub pass_through_mappings: bool,
}

impl Default for StyleExtractorConfig {
    fn default() -> Self {
        Self {
            style_key: StyleKind::Cell.default_metadata_key().to_string(),
            input_style_key: StyleKind::Input.default_metadata_key().to_string(),
            output_style_key: StyleKind::Output.default_metadata_key().to_string(),
            pass_through_mappings: false,
        }
    }
}

impl StyleExtractorConfig {
    /// Metadata key configured for a style kind.
    pub fn key_for(&self, kind: StyleKind) -> &str {
        match kind {
            StyleKind::Cell => &self.style_key,
            StyleKind::Input => &self.input_style_key,
            StyleKind::Output => &self.output_style_key,
        }
    }
}

/// Collects style metadata into `resources.styles` and `resources.notebook_styles`.
///
/// Each recognized cell style is stored under its selector id and written
/// back to the cell metadata (`cell_style`, `input_style`, `output_style`)
/// so a renderer can apply it without consulting the resources.
///
/// # Example
///
/// ```
/// use nbstyle::notebook::{Cell, Notebook};
/// use nbstyle::preprocess::{Preprocessor, StyleExtractor};
/// use nbstyle::Resources;
/// use serde_json::json;
///
/// let mut nb = Notebook::with_cells(vec![
///     Cell::code("x = 1").with_metadata("style", json!({"color": "red"})),
/// ]);
/// let mut resources = Resources::new();
/// StyleExtractor::new().preprocess(&mut nb, &mut resources);
///
/// assert_eq!(resources.styles["cell-0"].to_css(), "color: red");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StyleExtractor {
    config: StyleExtractorConfig,
}

impl StyleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: StyleExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &StyleExtractorConfig {
        &self.config
    }
}

impl Preprocessor for StyleExtractor {
    fn preprocess(&self, notebook: &mut Notebook, resources: &mut Resources) {
        if let Some(styles) = NotebookStyles::from_metadata(&notebook.metadata) {
            log::debug!(
                "notebook styles: inline={} stylesheets={}",
                styles.style.is_some(),
                styles.stylesheets.len()
            );
            resources.notebook_styles = Some(styles);
        }

        for (index, cell) in notebook.cells.iter_mut().enumerate() {
            self.preprocess_cell(cell, resources, index);
        }
    }

    fn preprocess_cell(&self, cell: &mut Cell, resources: &mut Resources, index: usize) {
        for kind in StyleKind::ALL {
            let Some(raw) = cell.metadata.get(self.config.key_for(kind)) else {
                continue;
            };
            let Some(value) = StyleValue::from_metadata(raw, self.config.pass_through_mappings)
            else {
                continue;
            };

            let selector = kind.selector_id(index);
            log::debug!("{selector}: {}", value.to_css());

            cell.metadata
                .insert(kind.template_key().to_string(), value.to_value());
            resources.styles.insert(selector, value);
        }
    }
}
