//! nbstyle - styled notebook export

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use nbstyle::export::{ChromiumBackend, HtmlConfig, HtmlExporter, PdfConfig, PdfExporter};
use nbstyle::preprocess::Preprocessor;
use nbstyle::{Notebook, Resources, StyleExtractor, StyleExtractorConfig, Template};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Pdf,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Pdf => "pdf",
        }
    }
}

#[derive(Parser)]
#[command(name = "nbstyle")]
#[command(version, about = "Export notebooks to HTML or PDF with cell style metadata", long_about = None)]
#[command(after_help = "EXAMPLES:
    nbstyle report.ipynb                 Write report.html
    nbstyle report.ipynb --to pdf        Write report.pdf via headless Chromium
    nbstyle -i report.ipynb              List styled cells without converting")]
struct Cli {
    /// Input notebook (.ipynb)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (defaults to INPUT with the format's extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "html")]
    to: Format,

    /// Markup template
    #[arg(long, default_value = "lab")]
    template: Template,

    /// Leave image references as links instead of embedding them
    #[arg(long)]
    no_embed_images: bool,

    /// Cell metadata key holding the whole-cell style
    #[arg(long, value_name = "KEY", default_value = "style")]
    style_key: String,

    /// Chromium/Chrome executable for PDF export
    #[arg(long, value_name = "PATH")]
    chromium: Option<PathBuf>,

    /// Run the browser without its sandbox (containers running as root)
    #[arg(long)]
    no_sandbox: bool,

    /// List styled cells without converting
    #[arg(short, long)]
    info: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,

    /// More logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = if cli.info {
        show_info(&cli)
    } else {
        convert(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn extractor_config(cli: &Cli) -> StyleExtractorConfig {
    StyleExtractorConfig {
        style_key: cli.style_key.clone(),
        ..Default::default()
    }
}

fn show_info(cli: &Cli) -> nbstyle::Result<()> {
    let mut nb = Notebook::open(&cli.input)?;
    let mut resources = Resources::for_path(&cli.input);
    StyleExtractor::new()
        .with_config(extractor_config(cli))
        .preprocess(&mut nb, &mut resources);

    println!("File: {}", cli.input.display());
    if let Some(title) = nb.title() {
        println!("Title: {title}");
    }
    println!("Cells: {}", nb.cells.len());
    println!("Styled regions: {}", resources.styles.len());
    for (selector, value) in &resources.styles {
        println!("  #{selector} {{ {} }}", value.to_css());
    }
    if let Some(styles) = &resources.notebook_styles {
        for href in &styles.stylesheets {
            println!("Stylesheet: {href}");
        }
        if let Some(style) = &styles.style {
            println!("Notebook style: {style}");
        }
    }

    Ok(())
}

fn convert(cli: &Cli) -> nbstyle::Result<()> {
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, cli.to));

    let html = HtmlExporter::with_config(HtmlConfig {
        embed_images: !cli.no_embed_images,
        template: cli.template,
        base_dir: None,
        extractor: extractor_config(cli),
    });

    let (bytes, resources) = match cli.to {
        Format::Html => {
            let (html, resources) = html.from_path(&cli.input)?;
            (html.into_bytes(), resources)
        }
        Format::Pdf => {
            let backend = match &cli.chromium {
                Some(path) => ChromiumBackend::at(path),
                None => ChromiumBackend::detect(),
            };
            PdfExporter::new()
                .with_html_exporter(html)
                .with_backend(backend)
                .with_config(PdfConfig {
                    disable_sandbox: cli.no_sandbox,
                })
                .from_path(&cli.input)?
        }
    };

    fs::write(&output, &bytes)?;

    if !cli.quiet {
        println!(
            "Wrote {} ({} bytes, {} styled regions)",
            output.display(),
            bytes.len(),
            resources.styles.len()
        );
    }
    Ok(())
}

fn default_output(input: &Path, format: Format) -> PathBuf {
    input.with_extension(format.extension())
}
