//! Notebook document model (nbformat v4).
//!
//! The reader is deliberately lenient: every metadata mapping is kept as raw
//! JSON so style stages can inspect shapes they recognize and ignore the rest.
//! Key order is preserved throughout, which matters for CSS property order.
//!
//! # Example
//!
//! ```
//! use nbstyle::notebook::{Cell, Notebook};
//! use serde_json::json;
//!
//! let mut nb = Notebook::new();
//! nb.cells.push(Cell::code("print('hi')").with_metadata("style", json!({"color": "red"})));
//! assert_eq!(nb.cells.len(), 1);
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::util::decode_text;

mod output;

pub use output::{MimeBundle, Output, mime_text};

/// A notebook: ordered cells plus document-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
}

fn default_nbformat() -> u32 {
    4
}

impl Default for Notebook {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }
}

impl Notebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notebook from a list of cells.
    pub fn with_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Self::default()
        }
    }

    /// Set a document-level metadata entry (builder style).
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Parse a notebook from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let nb: Notebook = serde_json::from_str(json)?;
        if nb.nbformat < 4 {
            return Err(Error::InvalidNotebook(format!(
                "nbformat {} is not supported (need 4)",
                nb.nbformat
            )));
        }
        Ok(nb)
    }

    /// Parse a notebook from raw file bytes, tolerating a BOM or legacy encodings.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_json(&decode_text(bytes))
    }

    /// Read and parse a notebook file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Serialize back to nbformat JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Notebook title: `metadata.title`, falling back to the first markdown heading.
    pub fn title(&self) -> Option<String> {
        if let Some(title) = self.metadata.get("title").and_then(Value::as_str)
            && !title.trim().is_empty()
        {
            return Some(title.trim().to_string());
        }

        self.cells
            .iter()
            .filter(|c| c.cell_type == CellType::Markdown)
            .flat_map(|c| c.source.lines())
            .find_map(|line| {
                let heading = line.trim_start().strip_prefix('#')?;
                let text = heading.trim_start_matches('#').trim();
                (!text.is_empty()).then(|| text.to_string())
            })
    }
}

/// Kind of notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "multiline")]
    pub source: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Inline attachments (markdown and raw cells): name -> mime bundle.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attachments: IndexMap<String, MimeBundle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<i64>,
}

impl Cell {
    fn new(cell_type: CellType, source: impl Into<String>) -> Self {
        Self {
            cell_type,
            id: None,
            source: source.into(),
            metadata: Map::new(),
            attachments: IndexMap::new(),
            outputs: Vec::new(),
            execution_count: None,
        }
    }

    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellType::Code, source)
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellType::Markdown, source)
    }

    pub fn raw(source: impl Into<String>) -> Self {
        Self::new(CellType::Raw, source)
    }

    /// Set a metadata entry (builder style).
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Append an output (builder style).
    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Add an attachment (builder style).
    pub fn with_attachment(mut self, name: impl Into<String>, bundle: MimeBundle) -> Self {
        self.attachments.insert(name.into(), bundle);
        self
    }
}

/// nbformat stores multi-line strings either as one string or a list of lines.
pub(crate) fn multiline<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Multiline {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match Multiline::deserialize(deserializer)? {
        Multiline::One(s) => s,
        Multiline::Many(lines) => lines.concat(),
        Multiline::Missing(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r##"{
        "cells": [
            {
                "cell_type": "markdown",
                "metadata": {"style": "color: red;"},
                "source": ["# Title\n", "Some text"]
            },
            {
                "cell_type": "code",
                "execution_count": 3,
                "metadata": {"input-style": {"background": "#eee", "padding": "4px"}},
                "outputs": [
                    {"output_type": "stream", "name": "stdout", "text": ["hello\n"]}
                ],
                "source": "print('hello')"
            }
        ],
        "metadata": {"stylesheet": ["a.css", "b.css"]},
        "nbformat": 4,
        "nbformat_minor": 5
    }"##;

    #[test]
    fn test_parse_sample() {
        let nb = Notebook::from_json(SAMPLE).unwrap();

        assert_eq!(nb.cells.len(), 2);
        assert_eq!(nb.cells[0].cell_type, CellType::Markdown);
        assert_eq!(nb.cells[0].source, "# Title\nSome text");
        assert_eq!(nb.cells[1].execution_count, Some(3));
        assert_eq!(nb.cells[1].outputs.len(), 1);
        assert_eq!(nb.metadata["stylesheet"], json!(["a.css", "b.css"]));
    }

    #[test]
    fn test_metadata_key_order_preserved() {
        let nb = Notebook::from_json(SAMPLE).unwrap();
        let style = nb.cells[1].metadata["input-style"].as_object().unwrap();
        let keys: Vec<_> = style.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["background", "padding"]);
    }

    #[test]
    fn test_reject_old_nbformat() {
        let err = Notebook::from_json(r#"{"cells": [], "metadata": {}, "nbformat": 3}"#);
        assert!(matches!(err, Err(Error::InvalidNotebook(_))));
    }

    #[test]
    fn test_from_bytes_with_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(SAMPLE.as_bytes());
        let nb = Notebook::from_bytes(&bytes).unwrap();
        assert_eq!(nb.cells.len(), 2);
    }

    #[test]
    fn test_title() {
        let nb = Notebook::from_json(SAMPLE).unwrap();
        assert_eq!(nb.title().as_deref(), Some("Title"));

        let nb = nb.with_metadata("title", json!("Explicit"));
        assert_eq!(nb.title().as_deref(), Some("Explicit"));

        assert_eq!(Notebook::new().title(), None);
    }

    #[test]
    fn test_round_trip_keeps_metadata() {
        let nb = Notebook::with_cells(vec![
            Cell::code("x = 1").with_metadata("style", json!({"color": "blue"})),
        ]);
        let json = nb.to_json().unwrap();
        let back = Notebook::from_json(&json).unwrap();
        assert_eq!(back, nb);
    }
}
