//! Code cell outputs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::multiline;

/// A mime bundle: media type -> payload (a string or a list of lines).
pub type MimeBundle = IndexMap<String, Value>;

/// Fetch a mime bundle entry as text, joining list-of-lines payloads.
pub fn mime_text(bundle: &MimeBundle, mime: &str) -> Option<String> {
    match bundle.get(mime)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(lines.iter().filter_map(Value::as_str).collect()),
        // JSON payloads (application/json, widget state) are not text
        _ => None,
    }
}

/// One output of a code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        #[serde(default)]
        name: String,
        #[serde(default, deserialize_with = "multiline")]
        text: String,
    },
    ExecuteResult {
        #[serde(default)]
        data: MimeBundle,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        execution_count: Option<i64>,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

impl Output {
    /// A `stream` output on stdout.
    pub fn stdout(text: impl Into<String>) -> Self {
        Output::Stream {
            name: "stdout".to_string(),
            text: text.into(),
        }
    }

    /// A `display_data` output with a single mime entry.
    pub fn display(mime: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut data = MimeBundle::new();
        data.insert(mime.into(), Value::String(payload.into()));
        Output::DisplayData {
            data,
            metadata: Map::new(),
        }
    }

    /// The mime bundle of a rich output, if any.
    pub fn data(&self) -> Option<&MimeBundle> {
        match self {
            Output::ExecuteResult { data, .. } | Output::DisplayData { data, .. } => Some(data),
            _ => None,
        }
    }
}
