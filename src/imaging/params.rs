//! Parameter types for media operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`process`](crate::process) module (which decides
//! which files to create) and the [`backend`](super::backend) (which does the
//! pixel and subprocess work). Swapping in a mock backend for tests needs no
//! change to the processing logic.

use std::path::PathBuf;

use super::orientation::Orientation;

/// JPEG encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// A named longest-edge target, e.g. `small` = 400px.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSize {
    pub name: String,
    pub edge: u32,
}

impl VariantSize {
    pub fn new(name: &str, edge: u32) -> Self {
        Self {
            name: name.to_string(),
            edge,
        }
    }

    /// `small`/400, `medium`/800, `large`/1600, `full`/2560.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("small", 400),
            Self::new("medium", 800),
            Self::new("large", 1600),
            Self::new("full", 2560),
        ]
    }
}

/// One output file of a resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeTarget {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Decode `source` once, upright it, and write every target from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub orientation: Orientation,
    pub quality: Quality,
    pub targets: Vec<ResizeTarget>,
}

/// Grab one video frame as a JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParams {
    pub video: PathBuf,
    pub output: PathBuf,
    pub at_seconds: f64,
}
