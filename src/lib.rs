//! # nbstyle
//!
//! Notebook to HTML (and PDF) export with per-cell and per-notebook CSS.
//!
//! ## Features
//!
//! - Cell metadata `style`, `input-style` and `output-style` become CSS rules
//!   targeting `#cell-{i}`, `#cell-{i}-input` and `#cell-{i}-output`
//! - Notebook metadata `style` and `stylesheet` add an inline block and
//!   `<link>` elements
//! - Every CSS string is sanitized against script-execution vectors
//! - Markdown images and attachments are embedded as data URIs
//! - PDF output through a headless browser
//!
//! ## Quick Start
//!
//! ```no_run
//! use nbstyle::HtmlExporter;
//!
//! let (html, _resources) = HtmlExporter::new().from_path("analysis.ipynb")?;
//! std::fs::write("analysis.html", html)?;
//! # Ok::<(), nbstyle::Error>(())
//! ```
//!
//! ## The two stages
//!
//! Extraction and injection are usable on their own:
//!
//! ```
//! use nbstyle::{Notebook, Resources, StyleExtractor, augment};
//! use nbstyle::notebook::Cell;
//! use nbstyle::preprocess::Preprocessor;
//! use serde_json::json;
//!
//! let mut nb = Notebook::with_cells(vec![
//!     Cell::code("x = 1").with_metadata("style", json!("padding: 10px;")),
//! ]);
//! let mut resources = Resources::new();
//! StyleExtractor::new().preprocess(&mut nb, &mut resources);
//!
//! let html = augment("<html><head></head><body></body></html>", &resources);
//! assert!(html.contains("#cell-0 { padding: 10px; }"));
//! ```

pub mod error;
pub mod export;
pub mod notebook;
pub mod preprocess;
pub mod resources;
pub mod style;
pub(crate) mod util;

pub use error::{Error, Result};
pub use export::{Exporter, HtmlConfig, HtmlExporter, PdfConfig, PdfExporter, Template, augment};
pub use notebook::{Cell, CellType, Notebook, Output};
pub use preprocess::{Preprocessor, StyleExtractor, StyleExtractorConfig};
pub use resources::Resources;
pub use style::{NotebookStyles, StyleKind, StyleRecord, StyleValue, sanitize_css, sanitize_css_str};
