//! Styled HTML exporter.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::notebook::Notebook;
use crate::preprocess::{Preprocessor, StyleExtractor, StyleExtractorConfig};
use crate::resources::Resources;

use super::Exporter;
use super::images::EmbedderChain;
use super::inject::augment;
use super::render::{BasicRenderer, HtmlRenderer, Template};

/// Configuration for HTML export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlConfig {
    /// Embed markdown images (attachments and local files) as data URIs. Default true.
    pub embed_images: bool,
    /// Markup conventions for the built-in renderer.
    pub template: Template,
    /// Directory relative image paths resolve against. Defaults to the
    /// notebook's directory, then the working directory.
    pub base_dir: Option<PathBuf>,
    /// Metadata keys and mapping handling for style extraction.
    pub extractor: StyleExtractorConfig,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            embed_images: true,
            template: Template::default(),
            base_dir: None,
            extractor: StyleExtractorConfig::default(),
        }
    }
}

/// HTML exporter with cell and notebook style support.
///
/// The pipeline is fixed: preprocessors (style extraction first), then the
/// renderer, then style injection before `</head>`.
///
/// # Example
///
/// ```
/// use nbstyle::export::HtmlExporter;
/// use nbstyle::notebook::{Cell, Notebook};
/// use serde_json::json;
///
/// let nb = Notebook::with_cells(vec![
///     Cell::code("x = 1").with_metadata("style", json!({"color": "blue"})),
/// ]);
/// let (html, resources) = HtmlExporter::new().from_notebook(&nb)?;
///
/// assert!(html.contains("#cell-0 { color: blue }"));
/// assert_eq!(resources.output_extension.as_deref(), Some(".html"));
/// # Ok::<(), nbstyle::Error>(())
/// ```
pub struct HtmlExporter {
    config: HtmlConfig,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    renderer: Option<Box<dyn HtmlRenderer>>,
}

impl HtmlExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::with_config(HtmlConfig::default())
    }

    /// Create an exporter with custom settings.
    pub fn with_config(config: HtmlConfig) -> Self {
        let extractor = StyleExtractor::new().with_config(config.extractor.clone());
        Self {
            config,
            preprocessors: vec![Box::new(extractor)],
            renderer: None,
        }
    }

    /// Append a preprocessor; it runs after the ones already registered.
    pub fn register_preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Replace the built-in renderer.
    pub fn with_renderer(mut self, renderer: impl HtmlRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn config(&self) -> &HtmlConfig {
        &self.config
    }

    /// Run the full pipeline, returning the styled HTML document.
    ///
    /// `resources` is updated in place; keys other stages own are kept.
    pub fn convert(&self, notebook: &mut Notebook, resources: &mut Resources) -> Result<String> {
        for preprocessor in &self.preprocessors {
            preprocessor.preprocess(notebook, resources);
        }

        let html = match &self.renderer {
            Some(renderer) => renderer.render(notebook, resources)?,
            None => self.basic_renderer(resources).render(notebook, resources)?,
        };

        resources.output_extension = Some(".html".to_string());
        log::debug!(
            "injecting {} cell styles (notebook styles: {})",
            resources.styles.len(),
            resources.notebook_styles.is_some()
        );
        Ok(augment(&html, resources))
    }

    /// Export a notebook with fresh resources.
    pub fn from_notebook(&self, notebook: &Notebook) -> Result<(String, Resources)> {
        let mut notebook = notebook.clone();
        let mut resources = Resources::new();
        let html = self.convert(&mut notebook, &mut resources)?;
        Ok((html, resources))
    }

    /// Read and export a notebook file.
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<(String, Resources)> {
        let path = path.as_ref();
        let mut notebook = Notebook::open(path)?;
        let mut resources = Resources::for_path(path);
        let html = self.convert(&mut notebook, &mut resources)?;
        Ok((html, resources))
    }

    fn basic_renderer(&self, resources: &Resources) -> BasicRenderer {
        let renderer = BasicRenderer::new(self.config.template);
        if !self.config.embed_images {
            return renderer;
        }

        let base_dir = self
            .config
            .base_dir
            .clone()
            .or_else(|| resources.metadata.path.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        renderer.with_embedder(EmbedderChain::standard(base_dir))
    }
}

impl Default for HtmlExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for HtmlExporter {
    fn export<W: Write>(
        &self,
        notebook: &mut Notebook,
        resources: &mut Resources,
        writer: &mut W,
    ) -> Result<()> {
        let html = self.convert(notebook, resources)?;
        writer.write_all(html.as_bytes())?;
        Ok(())
    }
}
