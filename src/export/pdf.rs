//! PDF export through a headless browser.
//!
//! [`PdfExporter`] runs the styled HTML pipeline and hands the finished
//! document to a [`PdfBackend`]. The built-in [`ChromiumBackend`] drives a
//! locally installed Chromium/Chrome with `--print-to-pdf`.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::{Error, Result};
use crate::notebook::Notebook;
use crate::resources::Resources;

use super::Exporter;
use super::html::HtmlExporter;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Executable names tried on `PATH`, in order.
const CHROMIUM_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "microsoft-edge",
];

/// Environment variables that may name the browser executable.
const CHROMIUM_ENV: &[&str] = &["CHROMIUM_PATH", "CHROME_PATH"];

/// Characters escaped when turning a file path into a `file://` URL.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Configuration for PDF rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfConfig {
    /// Pass `--no-sandbox` to the browser (needed when running as root in containers).
    pub disable_sandbox: bool,
}

/// Turns a finished HTML document into PDF bytes.
pub trait PdfBackend {
    fn render_pdf(&self, html: &str, config: &PdfConfig) -> Result<Vec<u8>>;
}

/// Headless Chromium backend.
#[derive(Debug, Clone, Default)]
pub struct ChromiumBackend {
    executable: Option<PathBuf>,
}

impl ChromiumBackend {
    /// Locate a browser from `CHROMIUM_PATH`/`CHROME_PATH`, then `PATH`.
    pub fn detect() -> Self {
        let from_env = CHROMIUM_ENV
            .iter()
            .filter_map(|var| env::var_os(var))
            .map(PathBuf::from)
            .find(|path| path.is_file());

        let executable = from_env.or_else(|| {
            let dirs = env::var_os("PATH")
                .map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
                .unwrap_or_default();
            find_executable(CHROMIUM_NAMES, &dirs)
        });

        Self { executable }
    }

    /// Use an explicit browser executable.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}

/// First `name` found as a file in any of `dirs`.
fn find_executable(names: &[&str], dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        names.iter().find_map(|name| {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            let exe = candidate.with_extension(env::consts::EXE_EXTENSION);
            (!env::consts::EXE_EXTENSION.is_empty() && exe.is_file()).then_some(exe)
        })
    })
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    let prefix = if path.starts_with('/') { "file://" } else { "file:///" };
    format!("{prefix}{}", utf8_percent_encode(&path, PATH_SET))
}

impl PdfBackend for ChromiumBackend {
    fn render_pdf(&self, html: &str, config: &PdfConfig) -> Result<Vec<u8>> {
        let exe = self
            .executable
            .as_deref()
            .filter(|path| path.is_file())
            .ok_or_else(|| {
                Error::BackendUnavailable(
                    "No suitable chromium executable found; set CHROMIUM_PATH or pass --chromium"
                        .to_string(),
                )
            })?;

        let dir = tempfile::tempdir()?;
        let input = dir.path().join("notebook.html");
        let output = dir.path().join("notebook.pdf");
        fs::write(&input, html)?;

        let mut cmd = Command::new(exe);
        cmd.args(["--headless", "--disable-gpu", "--no-pdf-header-footer"])
            .arg(format!("--print-to-pdf={}", output.display()));
        if config.disable_sandbox {
            cmd.arg("--no-sandbox");
        }
        cmd.arg(file_url(&input));

        log::debug!("running {}", exe.display());
        let result = cmd.output()?;
        if !result.status.success() {
            return Err(Error::Pdf(format!(
                "{} exited with {}: {}",
                exe.file_name().unwrap_or(OsStr::new("browser")).to_string_lossy(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let pdf = fs::read(&output)?;
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(Error::Pdf("browser output is not a PDF".to_string()));
        }
        Ok(pdf)
    }
}

/// PDF exporter composed over the styled HTML exporter.
///
/// # Example
///
/// ```no_run
/// use nbstyle::export::{ChromiumBackend, PdfConfig, PdfExporter};
/// use nbstyle::notebook::Notebook;
///
/// let nb = Notebook::open("report.ipynb")?;
/// let exporter = PdfExporter::new()
///     .with_backend(ChromiumBackend::detect())
///     .with_config(PdfConfig { disable_sandbox: true });
/// let (pdf, _resources) = exporter.from_notebook(&nb)?;
/// std::fs::write("report.pdf", pdf)?;
/// # Ok::<(), nbstyle::Error>(())
/// ```
pub struct PdfExporter {
    html: HtmlExporter,
    /// `None` until one is set; [`ChromiumBackend::detect`] runs at convert time.
    backend: Option<Box<dyn PdfBackend>>,
    config: PdfConfig,
}

impl PdfExporter {
    /// Default HTML pipeline. Without [`with_backend`](Self::with_backend),
    /// Chromium is located when the first PDF is printed.
    pub fn new() -> Self {
        Self {
            html: HtmlExporter::new(),
            backend: None,
            config: PdfConfig::default(),
        }
    }

    pub fn with_html_exporter(mut self, html: HtmlExporter) -> Self {
        self.html = html;
        self
    }

    pub fn with_backend(mut self, backend: impl PdfBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    /// Render the styled HTML and print it to PDF.
    pub fn convert(&self, notebook: &mut Notebook, resources: &mut Resources) -> Result<Vec<u8>> {
        let html = self.html.convert(notebook, resources)?;
        let pdf = match &self.backend {
            Some(backend) => backend.render_pdf(&html, &self.config)?,
            None => ChromiumBackend::detect().render_pdf(&html, &self.config)?,
        };
        resources.output_extension = Some(".pdf".to_string());
        Ok(pdf)
    }

    /// Export a notebook with fresh resources.
    pub fn from_notebook(&self, notebook: &Notebook) -> Result<(Vec<u8>, Resources)> {
        let mut notebook = notebook.clone();
        let mut resources = Resources::new();
        let pdf = self.convert(&mut notebook, &mut resources)?;
        Ok((pdf, resources))
    }

    /// Read and export a notebook file.
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<(Vec<u8>, Resources)> {
        let path = path.as_ref();
        let mut notebook = Notebook::open(path)?;
        let mut resources = Resources::for_path(path);
        let pdf = self.convert(&mut notebook, &mut resources)?;
        Ok((pdf, resources))
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for PdfExporter {
    fn export<W: Write>(
        &self,
        notebook: &mut Notebook,
        resources: &mut Resources,
        writer: &mut W,
    ) -> Result<()> {
        let pdf = self.convert(notebook, resources)?;
        writer.write_all(&pdf)?;
        Ok(())
    }
}
