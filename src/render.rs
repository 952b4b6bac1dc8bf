//! The page-rendering seam.
//!
//! Generation ends by handing a finished [`Gallery`] to a [`Renderer`]. HTML
//! templating lives outside this crate; the bundled [`ManifestRenderer`]
//! writes the model as `gallery.json` so any front end can consume it.
//!
//! ```text
//! <output>/
//! ├── gallery.json
//! └── static/...
//! ```

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::Gallery;

pub const MANIFEST_FILENAME: &str = "gallery.json";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Renderer {
    /// Write pages for `gallery` under `output`.
    fn render(&self, gallery: &Gallery, output: &Path) -> Result<(), RenderError>;
}

/// Writes the gallery model as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestRenderer;

impl Renderer for ManifestRenderer {
    fn render(&self, gallery: &Gallery, output: &Path) -> Result<(), RenderError> {
        fs::create_dir_all(output)?;
        let json = serde_json::to_string_pretty(gallery)?;
        fs::write(output.join(MANIFEST_FILENAME), json)?;
        Ok(())
    }
}
