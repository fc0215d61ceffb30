//! Notebook to HTML rendering.
//!
//! [`HtmlRenderer`] is the seam between the style pipeline and whatever
//! turns a notebook into markup. [`BasicRenderer`] is the built-in
//! implementation: one `<div>` per cell carrying the selector ids the style
//! injector targets, with the write-back style metadata applied inline.

use std::fmt::Write;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::notebook::{Cell, CellType, MimeBundle, Notebook, Output, mime_text};
use crate::resources::Resources;
use crate::style::{StyleKind, StyleValue};
use crate::util::escape_html;

use super::images::{ImageEmbedder, embed_img_tags};

/// Renders a notebook to a complete HTML document.
pub trait HtmlRenderer {
    fn render(&self, notebook: &Notebook, resources: &Resources) -> Result<String>;
}

/// Markup conventions for the rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Template {
    /// JupyterLab class names (`jp-Cell`, `jp-InputArea`, ...).
    #[default]
    Lab,
    /// Classic notebook class names (`cell`, `input_area`, ...).
    Classic,
}

impl Template {
    pub fn name(self) -> &'static str {
        match self {
            Template::Lab => "lab",
            Template::Classic => "classic",
        }
    }

    fn classes(self) -> &'static Classes {
        match self {
            Template::Lab => &LAB,
            Template::Classic => &CLASSIC,
        }
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lab" => Ok(Template::Lab),
            "classic" => Ok(Template::Classic),
            other => Err(format!("unknown template {other:?} (expected lab or classic)")),
        }
    }
}

struct Classes {
    body: &'static str,
    code_cell: &'static str,
    markdown_cell: &'static str,
    raw_cell: &'static str,
    input: &'static str,
    prompt: &'static str,
    code: &'static str,
    markdown: &'static str,
    output_area: &'static str,
    output: &'static str,
    stderr: &'static str,
    error: &'static str,
    base_css: &'static str,
}

static LAB: Classes = Classes {
    body: "jp-Notebook",
    code_cell: "jp-Cell jp-CodeCell",
    markdown_cell: "jp-Cell jp-MarkdownCell",
    raw_cell: "jp-Cell jp-RawCell",
    input: "jp-Cell-inputWrapper jp-InputArea",
    prompt: "jp-InputPrompt",
    code: "jp-CodeMirrorEditor highlight",
    markdown: "jp-RenderedMarkdown jp-RenderedHTMLCommon",
    output_area: "jp-Cell-outputWrapper jp-OutputArea",
    output: "jp-OutputArea-output",
    stderr: "jp-RenderedText jp-OutputArea-stderr",
    error: "jp-RenderedText jp-OutputArea-error",
    base_css: "\
body.jp-Notebook { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 60rem; padding: 1rem; }
.jp-Cell { margin: 0.5rem 0; padding: 0.25rem; }
.jp-InputArea { display: flex; gap: 0.5rem; }
.jp-InputPrompt { color: #303f9f; font-family: monospace; min-width: 5rem; text-align: right; }
.jp-CodeMirrorEditor { background: #f5f5f5; flex: 1; margin: 0; overflow-x: auto; padding: 0.5rem; }
.jp-OutputArea-output { margin: 0.25rem 0 0 5.5rem; overflow-x: auto; }
.jp-OutputArea-stderr { background: #fdd; }
.jp-OutputArea-error { background: #fdd; }
img { max-width: 100%; }
",
};

static CLASSIC: Classes = Classes {
    body: "notebook",
    code_cell: "cell code_cell",
    markdown_cell: "cell text_cell",
    raw_cell: "cell raw_cell",
    input: "input",
    prompt: "prompt input_prompt",
    code: "input_area highlight",
    markdown: "text_cell_render rendered_html",
    output_area: "output_wrapper output",
    output: "output_area",
    stderr: "output_stderr",
    error: "output_error",
    base_css: "\
body.notebook { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; margin: 0 auto; max-width: 940px; }
div.cell { border: 1px solid transparent; margin: 0.5em 0; padding: 5px; }
div.input { display: flex; }
div.prompt { color: #303f9f; font-family: monospace; min-width: 14ex; text-align: right; }
pre.input_area { background: #f7f7f7; border: 1px solid #cfcfcf; flex: 1; margin: 0; padding: 0.4em; }
div.output_area { margin-left: 14ex; overflow-x: auto; }
pre.output_stderr, pre.output_error { background: #fdd; }
img { max-width: 100%; }
",
};

/// Built-in renderer.
///
/// Every cell becomes `<div id="cell-{i}">` with an input region
/// `id="cell-{i}-input"` and, for code cells, an output region
/// `id="cell-{i}-output"`. Style metadata written back by the style
/// extractor (`cell_style`, `input_style`, `output_style`) becomes an inline
/// `style` attribute on the matching element.
pub struct BasicRenderer {
    template: Template,
    embedder: Option<Box<dyn ImageEmbedder>>,
}

impl BasicRenderer {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            embedder: None,
        }
    }

    /// Embed images referenced from markdown cells.
    pub fn with_embedder(mut self, embedder: impl ImageEmbedder + 'static) -> Self {
        self.embedder = Some(Box::new(embedder));
        self
    }

    pub fn template(&self) -> Template {
        self.template
    }
}

impl Default for BasicRenderer {
    fn default() -> Self {
        Self::new(Template::default())
    }
}

impl HtmlRenderer for BasicRenderer {
    fn render(&self, notebook: &Notebook, resources: &Resources) -> Result<String> {
        let classes = self.template.classes();
        let title = notebook
            .title()
            .or_else(|| Some(resources.metadata.name.clone()).filter(|n| !n.is_empty()))
            .unwrap_or_else(|| "Notebook".to_string());

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        writeln!(out, "<title>{}</title>", escape_html(&title)).unwrap();
        writeln!(out, "<style>\n{}</style>", classes.base_css).unwrap();
        out.push_str("</head>\n");
        writeln!(out, "<body class=\"{}\">\n<main>", classes.body).unwrap();

        for (index, cell) in notebook.cells.iter().enumerate() {
            self.render_cell(&mut out, cell, index);
        }

        out.push_str("</main>\n</body>\n</html>\n");
        Ok(out)
    }
}

impl BasicRenderer {
    fn render_cell(&self, out: &mut String, cell: &Cell, index: usize) {
        let classes = self.template.classes();
        let class = match cell.cell_type {
            CellType::Code => classes.code_cell,
            CellType::Markdown => classes.markdown_cell,
            CellType::Raw => classes.raw_cell,
        };

        open_div(out, cell, index, StyleKind::Cell, class);

        match cell.cell_type {
            CellType::Code => {
                open_div(out, cell, index, StyleKind::Input, classes.input);
                let prompt = cell
                    .execution_count
                    .map_or_else(|| " ".to_string(), |n| n.to_string());
                writeln!(out, "<div class=\"{}\">In&nbsp;[{prompt}]:</div>", classes.prompt).unwrap();
                writeln!(out, "<pre class=\"{}\">{}</pre>", classes.code, escape_html(&cell.source))
                    .unwrap();
                out.push_str("</div>\n");

                open_div(out, cell, index, StyleKind::Output, classes.output_area);
                for output in &cell.outputs {
                    self.render_output(out, output);
                }
                out.push_str("</div>\n");
            }
            CellType::Markdown => {
                open_div(out, cell, index, StyleKind::Input, classes.input);
                writeln!(out, "<div class=\"{}\">", classes.markdown).unwrap();
                let embedder = self.embedder.as_deref().map(|e| (e, cell));
                out.push_str(&render_markdown(&cell.source, embedder));
                out.push_str("</div>\n</div>\n");
            }
            CellType::Raw => {
                if is_html_raw_cell(cell) {
                    open_div(out, cell, index, StyleKind::Input, classes.input);
                    out.push_str(&cell.source);
                    out.push_str("\n</div>\n");
                }
            }
        }

        out.push_str("</div>\n");
    }

    fn render_output(&self, out: &mut String, output: &Output) {
        let classes = self.template.classes();

        match output {
            Output::Stream { name, text } => {
                if name == "stderr" {
                    write!(out, "<pre class=\"{} {}\">", classes.output, classes.stderr).unwrap();
                } else {
                    write!(out, "<pre class=\"{}\">", classes.output).unwrap();
                }
                writeln!(out, "{}</pre>", escape_html(text)).unwrap();
            }
            Output::ExecuteResult { data, .. } | Output::DisplayData { data, .. } => {
                if let Some(body) = render_mime_bundle(data) {
                    writeln!(out, "<div class=\"{}\">{body}</div>", classes.output).unwrap();
                }
            }
            Output::Error { traceback, ename, evalue } => {
                let text = if traceback.is_empty() {
                    format!("{ename}: {evalue}")
                } else {
                    strip_ansi(&traceback.join("\n"))
                };
                writeln!(
                    out,
                    "<pre class=\"{} {}\">{}</pre>",
                    classes.output,
                    classes.error,
                    escape_html(&text)
                )
                .unwrap();
            }
            Output::Unknown => {}
        }
    }
}

/// Open a cell region `<div>` with its selector id and inline style.
fn open_div(out: &mut String, cell: &Cell, index: usize, kind: StyleKind, class: &str) {
    write!(out, "<div id=\"{}\" class=\"{class}\"", kind.selector_id(index)).unwrap();
    if let Some(style) = inline_style(cell, kind) {
        write!(out, " style=\"{}\"", escape_html(&style)).unwrap();
    }
    out.push_str(">\n");
}

/// Inline style from the template write-back key, sanitized again since the
/// metadata may not have come through the extractor.
fn inline_style(cell: &Cell, kind: StyleKind) -> Option<String> {
    let value = cell.metadata.get(kind.template_key())?;
    let style = StyleValue::from_metadata(value, false)?;
    (!style.is_blank()).then(|| style.to_css())
}

fn is_html_raw_cell(cell: &Cell) -> bool {
    ["raw_mimetype", "format"]
        .iter()
        .filter_map(|key| cell.metadata.get(*key).and_then(Value::as_str))
        .any(|mime| mime.eq_ignore_ascii_case("text/html"))
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Render markdown, embedding images through `embedder` when given.
fn render_markdown(source: &str, embedder: Option<(&dyn ImageEmbedder, &Cell)>) -> String {
    let parser = Parser::new_ext(source, markdown_options());
    let mut html_output = String::new();

    let Some((embedder, cell)) = embedder else {
        html::push_html(&mut html_output, parser);
        return html_output;
    };

    let events = parser.map(|event| match event {
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = match embedder.embed(&dest_url, cell) {
                Some(uri) => CowStr::from(uri),
                None => dest_url,
            };
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        Event::Html(raw) => Event::Html(embed_img_tags(&raw, cell, embedder).into()),
        Event::InlineHtml(raw) => Event::InlineHtml(embed_img_tags(&raw, cell, embedder).into()),
        other => other,
    });
    html::push_html(&mut html_output, events);
    html_output
}

/// Pick the richest displayable representation of a mime bundle.
fn render_mime_bundle(data: &MimeBundle) -> Option<String> {
    if let Some(html) = mime_text(data, "text/html") {
        return Some(html);
    }
    if let Some(svg) = mime_text(data, "image/svg+xml") {
        return Some(format!(
            "<img src=\"data:image/svg+xml;base64,{}\">",
            STANDARD.encode(svg)
        ));
    }
    for mime in ["image/png", "image/jpeg", "image/gif"] {
        if let Some(payload) = mime_text(data, mime) {
            let payload: String = payload.split_whitespace().collect();
            return Some(format!("<img src=\"data:{mime};base64,{payload}\">"));
        }
    }
    if let Some(markdown) = mime_text(data, "text/markdown") {
        return Some(render_markdown(&markdown, None));
    }
    mime_text(data, "text/plain").map(|text| format!("<pre>{}</pre>", escape_html(&text)))
}

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::images::AttachmentEmbedder;
    use serde_json::json;

    fn render(nb: &Notebook) -> String {
        BasicRenderer::default().render(nb, &Resources::new()).unwrap()
    }

    #[test]
    fn test_document_skeleton() {
        let html = render(&Notebook::with_cells(vec![Cell::markdown("# Report")]));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Report</title>"));
        assert_eq!(html.matches("</head>").count(), 1);
        assert!(html.contains("<h1>Report</h1>"));
    }

    #[test]
    fn test_selector_ids_on_regions() {
        let mut cell = Cell::code("print(1)");
        cell.execution_count = Some(2);
        let cell = cell.with_output(Output::stdout("1\n"));
        let html = render(&Notebook::with_cells(vec![Cell::markdown("text"), cell]));

        assert!(html.contains("<div id=\"cell-0\" class=\"jp-Cell jp-MarkdownCell\">"));
        assert!(html.contains("<div id=\"cell-0-input\""));
        assert!(html.contains("<div id=\"cell-1\" class=\"jp-Cell jp-CodeCell\">"));
        assert!(html.contains("<div id=\"cell-1-input\""));
        assert!(html.contains("<div id=\"cell-1-output\""));
        assert!(html.contains("In&nbsp;[2]:"));
        assert!(html.contains("print(1)"));
        assert!(html.contains(">1\n</pre>"));
    }

    #[test]
    fn test_inline_styles_from_write_back_keys() {
        let cell = Cell::code("x")
            .with_metadata("cell_style", json!("background-color: #e3f2fd; padding: 10px;"))
            .with_metadata("output_style", json!({"border": "1px solid red"}));
        let html = render(&Notebook::with_cells(vec![cell]));

        assert!(html.contains(
            "<div id=\"cell-0\" class=\"jp-Cell jp-CodeCell\" style=\"background-color: #e3f2fd; padding: 10px;\">"
        ));
        assert!(html.contains("id=\"cell-0-output\" class=\"jp-Cell-outputWrapper jp-OutputArea\" style=\"border: 1px solid red\""));
        assert!(!html.contains("id=\"cell-0-input\" class=\"jp-Cell-inputWrapper jp-InputArea\" style"));
    }

    #[test]
    fn test_inline_style_cannot_break_attribute() {
        let cell = Cell::code("x").with_metadata(
            "cell_style",
            json!("color: red\" onmouseover=\"alert(1)"),
        );
        let html = render(&Notebook::with_cells(vec![cell]));
        assert!(!html.contains("\" onmouseover"));
    }

    #[test]
    fn test_classic_template() {
        let html = BasicRenderer::new(Template::Classic)
            .render(&Notebook::with_cells(vec![Cell::code("x")]), &Resources::new())
            .unwrap();
        assert!(html.contains("<body class=\"notebook\">"));
        assert!(html.contains("class=\"cell code_cell\""));
    }

    #[test]
    fn test_template_from_str() {
        assert_eq!("lab".parse::<Template>(), Ok(Template::Lab));
        assert_eq!("Classic".parse::<Template>(), Ok(Template::Classic));
        assert!("reveal".parse::<Template>().is_err());
        assert_eq!(Template::Classic.name(), "classic");
    }

    #[test]
    fn test_rich_outputs() {
        let cell = Cell::code("x")
            .with_output(Output::display("text/html", "<table><tr><td>1</td></tr></table>"))
            .with_output(Output::display("image/png", "iVBORw0KGgo=\n"))
            .with_output(Output::display("text/plain", "<object>"))
            .with_output(Output::Error {
                ename: "ValueError".into(),
                evalue: "bad".into(),
                traceback: vec!["\u{1b}[0;31mValueError\u{1b}[0m: bad".into()],
            });
        let html = render(&Notebook::with_cells(vec![cell]));

        assert!(html.contains("<table><tr><td>1</td></tr></table>"));
        assert!(html.contains("<img src=\"data:image/png;base64,iVBORw0KGgo=\">"));
        assert!(html.contains("<pre>&lt;object&gt;</pre>"));
        assert!(html.contains("ValueError: bad"));
        assert!(!html.contains('\u{1b}'));
    }

    #[test]
    fn test_svg_output_is_data_uri() {
        let cell = Cell::code("x").with_output(Output::display("image/svg+xml", "<svg></svg>"));
        let html = render(&Notebook::with_cells(vec![cell]));
        assert!(html.contains("data:image/svg+xml;base64,PHN2Zz48L3N2Zz4="));
        assert!(!html.contains("<svg>"));
    }

    #[test]
    fn test_raw_cells() {
        let html_raw = Cell::raw("<b>raw</b>").with_metadata("raw_mimetype", json!("text/html"));
        let latex_raw = Cell::raw("\\LaTeX").with_metadata("raw_mimetype", json!("text/latex"));
        let html = render(&Notebook::with_cells(vec![html_raw, latex_raw]));

        assert!(html.contains("<b>raw</b>"));
        assert!(!html.contains("LaTeX"));
    }

    #[test]
    fn test_markdown_attachment_embedding() {
        let mut bundle = MimeBundle::new();
        bundle.insert("image/png".into(), json!("iVBORw0KGgo="));
        let cell = Cell::markdown("![plot](attachment:plot.png)\n\n<img src=\"attachment:plot.png\">")
            .with_attachment("plot.png", bundle);

        let html = BasicRenderer::default()
            .with_embedder(AttachmentEmbedder)
            .render(&Notebook::with_cells(vec![cell.clone()]), &Resources::new())
            .unwrap();
        assert_eq!(html.matches("data:image/png;base64,iVBORw0KGgo=").count(), 2);
        assert!(!html.contains("attachment:plot.png"));

        let plain = render(&Notebook::with_cells(vec![cell]));
        assert!(plain.contains("attachment:plot.png"));
    }

    #[test]
    fn test_title_fallbacks() {
        let mut resources = Resources::new();
        resources.metadata.name = "analysis".into();
        let html = BasicRenderer::default()
            .render(&Notebook::with_cells(vec![Cell::code("x")]), &resources)
            .unwrap();
        assert!(html.contains("<title>analysis</title>"));

        let html = render(&Notebook::new());
        assert!(html.contains("<title>Notebook</title>"));
    }
}
