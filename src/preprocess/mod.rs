//! Preprocessing stages run before a notebook is rendered.
//!
//! A [`Preprocessor`] walks the notebook and records derived data in the
//! shared [`Resources`]. Stages are infallible: malformed metadata means
//! "nothing to record", never an error.

use crate::notebook::{Cell, Notebook};
use crate::resources::Resources;

mod style;

pub use style::{StyleExtractor, StyleExtractorConfig};

/// A stage that inspects or augments a notebook ahead of rendering.
///
/// The default `preprocess` visits every cell in document order with its
/// zero-based index.
pub trait Preprocessor {
    fn preprocess(&self, notebook: &mut Notebook, resources: &mut Resources) {
        for (index, cell) in notebook.cells.iter_mut().enumerate() {
            self.preprocess_cell(cell, resources, index);
        }
    }

    fn preprocess_cell(&self, _cell: &mut Cell, _resources: &mut Resources, _index: usize) {}
}
