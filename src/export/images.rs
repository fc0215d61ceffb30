//! Image embedding for markdown cells.
//!
//! An [`ImageEmbedder`] turns an image reference into a self-contained
//! `data:` URI so the exported HTML needs no sibling files. Embedders are
//! plain values the exporter configures; [`EmbedderChain`] tries several in
//! order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::notebook::{Cell, mime_text};
use crate::util::image_media_type;

/// Resolves an image `src` to a `data:` URI.
pub trait ImageEmbedder {
    /// Return the embedded URI, or `None` to leave `src` as written.
    fn embed(&self, src: &str, cell: &Cell) -> Option<String>;
}

/// Resolves `attachment:<name>` references from the cell's attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentEmbedder;

impl ImageEmbedder for AttachmentEmbedder {
    fn embed(&self, src: &str, cell: &Cell) -> Option<String> {
        let name = src.strip_prefix("attachment:")?;
        let name = percent_decode_str(name).decode_utf8().ok()?;

        let Some(bundle) = cell.attachments.get(&*name) else {
            log::warn!("cell references missing attachment {name:?}");
            return None;
        };
        let mime = bundle.keys().find(|mime| mime.starts_with("image/"))?;
        let payload: String = mime_text(bundle, mime)?
            .split_whitespace()
            .collect();

        Some(format!("data:{mime};base64,{payload}"))
    }
}

/// Reads relative image paths from disk, resolved against a base directory.
#[derive(Debug, Clone)]
pub struct FileEmbedder {
    base_dir: PathBuf,
}

impl FileEmbedder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl ImageEmbedder for FileEmbedder {
    fn embed(&self, src: &str, _cell: &Cell) -> Option<String> {
        if has_scheme(src) || src.starts_with("//") {
            return None;
        }

        let path = percent_decode_str(src).decode_utf8().ok()?;
        let path = self.base_dir.join(&*path);
        let mime = image_media_type(&path)?;

        match fs::read(&path) {
            Ok(bytes) => Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes))),
            Err(e) => {
                log::warn!("cannot embed image {}: {e}", path.display());
                None
            }
        }
    }
}

/// `http:`, `data:`, `attachment:` and friends; not a Windows drive letter.
fn has_scheme(src: &str) -> bool {
    match src.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Tries each embedder in turn; the first that resolves wins.
#[derive(Default)]
pub struct EmbedderChain {
    embedders: Vec<Box<dyn ImageEmbedder>>,
}

impl EmbedderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attachments first, then files under `base_dir`.
    pub fn standard(base_dir: impl Into<PathBuf>) -> Self {
        Self::new()
            .with(AttachmentEmbedder)
            .with(FileEmbedder::new(base_dir))
    }

    pub fn with(mut self, embedder: impl ImageEmbedder + 'static) -> Self {
        self.embedders.push(Box::new(embedder));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.embedders.is_empty()
    }
}

impl ImageEmbedder for EmbedderChain {
    fn embed(&self, src: &str, cell: &Cell) -> Option<String> {
        self.embedders.iter().find_map(|e| e.embed(src, cell))
    }
}

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Rewrite the `src` of every `<img>` tag in a raw HTML fragment.
pub fn embed_img_tags(html: &str, cell: &Cell, embedder: &dyn ImageEmbedder) -> String {
    IMG_SRC
        .replace_all(html, |caps: &Captures| {
            let src = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            match embedder.embed(src, cell) {
                Some(uri) => format!("{}\"{uri}\"", &caps[1]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::MimeBundle;
    use serde_json::json;
    use tempfile::TempDir;

    const PNG_B64: &str = "iVBORw0KGgo=";

    fn cell_with_attachment() -> Cell {
        let mut bundle = MimeBundle::new();
        bundle.insert("image/png".into(), json!(PNG_B64));
        Cell::markdown("![plot](attachment:plot.png)").with_attachment("plot.png", bundle)
    }

    #[test]
    fn test_attachment_embedder() {
        let cell = cell_with_attachment();
        assert_eq!(
            AttachmentEmbedder.embed("attachment:plot.png", &cell).as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
        assert_eq!(AttachmentEmbedder.embed("attachment:other.png", &cell), None);
        assert_eq!(AttachmentEmbedder.embed("plot.png", &cell), None);
    }

    #[test]
    fn test_attachment_name_percent_decoded() {
        let mut bundle = MimeBundle::new();
        bundle.insert("image/jpeg".into(), json!(["/9j/", "4AAQ\n"]));
        let cell = Cell::markdown("").with_attachment("my image.jpg", bundle);

        assert_eq!(
            AttachmentEmbedder.embed("attachment:my%20image.jpg", &cell).as_deref(),
            Some("data:image/jpeg;base64,/9j/4AAQ")
        );
    }

    #[test]
    fn test_file_embedder() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/dot.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let embedder = FileEmbedder::new(dir.path());
        let cell = Cell::markdown("");

        assert_eq!(
            embedder.embed("img/dot.png", &cell).as_deref(),
            Some("data:image/png;base64,iVBORw==")
        );
        assert_eq!(embedder.embed("img/missing.png", &cell), None);
        assert_eq!(embedder.embed("https://example.com/a.png", &cell), None);
        assert_eq!(embedder.embed("//cdn.example.com/a.png", &cell), None);
        assert_eq!(embedder.embed("notes.txt", &cell), None);
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://x"));
        assert!(has_scheme("attachment:a.png"));
        assert!(has_scheme("data:image/png;base64,AAA"));
        assert!(!has_scheme("img/a.png"));
        assert!(!has_scheme("C:/images/a.png"));
    }

    #[test]
    fn test_chain_first_match_wins() {
        let dir = TempDir::new().unwrap();
        let chain = EmbedderChain::standard(dir.path());
        let cell = cell_with_attachment();

        assert!(!chain.is_empty());
        assert_eq!(
            chain.embed("attachment:plot.png", &cell).as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
        assert_eq!(chain.embed("missing.png", &cell), None);
    }

    #[test]
    fn test_embed_img_tags() {
        let cell = cell_with_attachment();
        let html = r#"<p><img alt="a" src="attachment:plot.png"> <IMG SRC='elsewhere.png'></p>"#;

        let out = embed_img_tags(html, &cell, &AttachmentEmbedder);
        assert_eq!(
            out,
            r#"<p><img alt="a" src="data:image/png;base64,iVBORw0KGgo="> <IMG SRC='elsewhere.png'></p>"#
        );
    }
}
