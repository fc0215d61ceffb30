//! Export module for writing styled notebooks.
//!
//! Provides the `Exporter` trait and format-specific implementations.
//!
//! # Architecture
//!
//! An export runs in two phases around the renderer:
//! - preprocessors (the style extractor) record styles in [`Resources`]
//! - the [`HtmlRenderer`] produces a complete HTML document
//! - [`augment`] splices the recorded styles in before `</head>`
//!
//! [`PdfExporter`] wraps the HTML pipeline and hands the result to a
//! [`PdfBackend`].
//!
//! # Example
//!
//! ```no_run
//! use nbstyle::export::{Exporter, HtmlExporter};
//! use nbstyle::{Notebook, Resources};
//! use std::fs::File;
//!
//! let mut nb = Notebook::open("input.ipynb")?;
//! let mut resources = Resources::for_path("input.ipynb".as_ref());
//! let mut file = File::create("output.html")?;
//!
//! HtmlExporter::new().export(&mut nb, &mut resources, &mut file)?;
//! # Ok::<(), nbstyle::Error>(())
//! ```

use std::io::Write;

use crate::error::Result;
use crate::notebook::Notebook;
use crate::resources::Resources;

mod html;
mod images;
mod inject;
mod pdf;
mod render;

pub use html::{HtmlConfig, HtmlExporter};
pub use images::{AttachmentEmbedder, EmbedderChain, FileEmbedder, ImageEmbedder, embed_img_tags};
pub use inject::{
    augment, generate_notebook_style_block, generate_style_block, generate_stylesheet_links,
    style_fragments,
};
pub use pdf::{ChromiumBackend, PdfBackend, PdfConfig, PdfExporter};
pub use render::{BasicRenderer, HtmlRenderer, Template};

/// Trait for exporting notebooks to specific formats.
///
/// Exporters hold their configuration; `export` runs the pipeline with the
/// caller's resources and writes the artifact to any `Write` destination:
/// - `std::fs::File` for disk output
/// - `Vec<u8>` for in-memory output
pub trait Exporter {
    /// Export the notebook to the provided writer.
    fn export<W: Write>(
        &self,
        notebook: &mut Notebook,
        resources: &mut Resources,
        writer: &mut W,
    ) -> Result<()>;
}
