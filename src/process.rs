//! Media processor: turns one source file into its derived outputs.
//!
//! Images get a set of longest-edge JPEG variants; videos get a poster frame
//! and a copy of the original. Every output lands at a deterministic path so
//! the output tree doubles as the [`cache`](crate::cache).
//!
//! ## Output Structure
//!
//! ```text
//! <output>/
//! └── static/
//!     ├── thumbs/
//!     │   └── trip-one/
//!     │       ├── IMG_0001_small.jpg     # 400px longest edge
//!     │       ├── IMG_0001_medium.jpg    # 800px
//!     │       ├── IMG_0001_large.jpg     # 1600px
//!     │       ├── IMG_0001_full.jpg      # 2560px
//!     │       └── clip_poster.jpg        # video poster frame
//!     └── videos/
//!         └── trip-one/
//!             └── clip.mp4               # copied original
//! ```
//!
//! Paths recorded in the gallery model are relative to `<output>` and always
//! use `/` separators.
//!
//! The processor itself is stateless apart from its settings. The
//! [`generate`](crate::generate) module decides which photos to process and
//! how many at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::cache;
use crate::config::GalleryConfig;
use crate::imaging::{
    BackendError, FrameParams, MediaBackend, Quality, ResizeParams, ResizeTarget, VariantSize,
    plan_variants,
};
use crate::naming::VIDEO_EXTENSIONS;

/// Size name used for video poster frames in a photo's variant map.
pub const POSTER: &str = "poster";

/// Seconds into a video tried in turn for the poster frame.
pub const DEFAULT_POSTER_OFFSETS: [f64; 2] = [1.0, 0.0];

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Media processing failed: {0}")]
    Media(#[from] BackendError),
    #[error("No variants to generate for {0}")]
    NothingToGenerate(PathBuf),
    #[error("Could not extract a poster frame from {video}: {reason}")]
    PosterFailed { video: PathBuf, reason: String },
}

/// Whether an output was reused or written during this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantStatus {
    /// Existing output was fresh; nothing was decoded or copied.
    Cached,
    /// Decoded and re-encoded (image variants, posters).
    Encoded,
    /// Byte-for-byte copied (video originals).
    Copied,
}

impl VariantStatus {
    pub fn is_cached(self) -> bool {
        self == VariantStatus::Cached
    }
}

/// Result of [`MediaProcessor::process_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    /// Size name → output-relative path, only for sizes actually produced.
    pub variants: BTreeMap<String, String>,
    /// Upright (post-orientation) pixel dimensions.
    pub width: u32,
    pub height: u32,
    pub status: VariantStatus,
}

/// A single generated file: a poster or a copied video.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducedFile {
    pub path: String,
    pub status: VariantStatus,
}

/// Deterministic output paths under an output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn thumbs_dir(&self, album_id: &str) -> PathBuf {
        self.root.join("static").join("thumbs").join(album_id)
    }

    pub fn videos_dir(&self, album_id: &str) -> PathBuf {
        self.root.join("static").join("videos").join(album_id)
    }

    pub fn variant_file(photo_id: &str, size: &str) -> String {
        format!("{photo_id}_{size}.jpg")
    }

    /// Poster filename. A photo ID that still carries a media extension has
    /// it stripped so `clip.mp4` and `clip` share one poster.
    pub fn poster_file(photo_id: &str) -> String {
        let base = Path::new(photo_id)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .map(|ext| &photo_id[..photo_id.len() - ext.len() - 1])
            .unwrap_or(photo_id);
        format!("{base}_poster.jpg")
    }

    /// Copied-video filename: the source's lowercased extension, appended
    /// only when the photo ID does not already end with it.
    pub fn video_file(photo_id: &str, source: &Path) -> String {
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        if ext.is_empty() || photo_id.to_lowercase().ends_with(&ext) {
            photo_id.to_string()
        } else {
            format!("{photo_id}{ext}")
        }
    }

    fn relative(kind: &str, album_id: &str, file: &str) -> String {
        format!("static/{kind}/{album_id}/{file}")
    }
}

/// Produces variants, posters and video copies for one source file at a time.
///
/// Generic over [`MediaBackend`] so tests can count decoder calls with a
/// mock instead of encoding real images.
pub struct MediaProcessor<'a, B: MediaBackend> {
    backend: &'a B,
    layout: OutputLayout,
    sizes: Vec<VariantSize>,
    quality: Quality,
    poster_offsets: Vec<f64>,
}

impl<'a, B: MediaBackend> MediaProcessor<'a, B> {
    /// Processor with stock sizes, quality and poster offsets.
    pub fn new(backend: &'a B, output_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            layout: OutputLayout::new(output_root),
            sizes: VariantSize::defaults(),
            quality: Quality::default(),
            poster_offsets: DEFAULT_POSTER_OFFSETS.to_vec(),
        }
    }

    pub fn from_config(
        backend: &'a B,
        output_root: impl Into<PathBuf>,
        config: &GalleryConfig,
    ) -> Self {
        Self::new(backend, output_root)
            .with_sizes(config.variant_sizes())
            .with_quality(config.quality())
            .with_poster_offsets(config.video.poster_offsets.clone())
    }

    pub fn with_sizes(mut self, sizes: Vec<VariantSize>) -> Self {
        self.sizes = sizes;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_poster_offsets(mut self, offsets: Vec<f64>) -> Self {
        self.poster_offsets = offsets;
        self
    }

    /// Generate the size variants of one image.
    ///
    /// Reads the header and orientation to decide which sizes apply, then
    /// skips the decoder entirely if every planned variant is at least as
    /// new as the source. Otherwise all planned variants are rewritten from
    /// a single decode.
    pub fn process_image(
        &self,
        source: &Path,
        album_id: &str,
        photo_id: &str,
    ) -> Result<ProcessedImage, ProcessError> {
        let stored = self.backend.identify(source)?;
        let orientation = self.backend.orientation(source);
        let (width, height) = orientation.apply_to_dimensions(stored.width, stored.height);

        let plan = plan_variants((width, height), &self.sizes);
        if plan.is_empty() {
            return Err(ProcessError::NothingToGenerate(source.to_path_buf()));
        }

        let dir = self.layout.thumbs_dir(album_id);
        let targets: Vec<ResizeTarget> = plan
            .iter()
            .map(|p| ResizeTarget {
                output: dir.join(OutputLayout::variant_file(photo_id, &p.name)),
                width: p.width,
                height: p.height,
            })
            .collect();

        let fresh = cache::all_fresh(
            targets.iter().map(|t| t.output.as_path()),
            cache::modified(source),
        );
        let status = if fresh {
            debug!(source = %source.display(), "variants up to date");
            VariantStatus::Cached
        } else {
            fs::create_dir_all(&dir)?;
            self.backend.resize(&ResizeParams {
                source: source.to_path_buf(),
                orientation,
                quality: self.quality,
                targets,
            })?;
            VariantStatus::Encoded
        };

        let variants = plan
            .iter()
            .map(|p| {
                let file = OutputLayout::variant_file(photo_id, &p.name);
                (p.name.clone(), OutputLayout::relative("thumbs", album_id, &file))
            })
            .collect();

        Ok(ProcessedImage {
            variants,
            width,
            height,
            status,
        })
    }

    /// Extract a poster frame for a video.
    ///
    /// Each configured offset is tried in order; a video shorter than the
    /// first offset falls through to the next. A missing `ffmpeg` fails
    /// immediately since retrying cannot help.
    pub fn extract_thumbnail(
        &self,
        video: &Path,
        album_id: &str,
        photo_id: &str,
    ) -> Result<ProducedFile, ProcessError> {
        let file = OutputLayout::poster_file(photo_id);
        let dir = self.layout.thumbs_dir(album_id);
        let output = dir.join(&file);
        let path = OutputLayout::relative("thumbs", album_id, &file);

        if cache::is_fresh(&output, cache::modified(video)) {
            return Ok(ProducedFile {
                path,
                status: VariantStatus::Cached,
            });
        }

        fs::create_dir_all(&dir)?;
        let mut last_error = None;
        for &at_seconds in &self.poster_offsets {
            // A leftover poster must not pass for a frame this attempt wrote
            remove_if_present(&output)?;
            let params = FrameParams {
                video: video.to_path_buf(),
                output: output.clone(),
                at_seconds,
            };
            match self.backend.extract_frame(&params) {
                Ok(()) if output.exists() => {
                    return Ok(ProducedFile {
                        path,
                        status: VariantStatus::Encoded,
                    });
                }
                Ok(()) => {
                    debug!(video = %video.display(), at_seconds, "no frame written");
                    last_error = Some(BackendError::ProcessingFailed(format!(
                        "no frame written at {at_seconds}s"
                    )));
                }
                Err(e @ BackendError::ToolMissing(_)) => return Err(e.into()),
                Err(e) => {
                    debug!(video = %video.display(), at_seconds, error = %e, "poster attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(ProcessError::PosterFailed {
            video: video.to_path_buf(),
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no poster offsets configured".to_string()),
        })
    }

    /// Copy a video into `static/videos/<album>/`, unless an up-to-date
    /// copy is already there.
    pub fn copy_video_to_static(
        &self,
        video: &Path,
        album_id: &str,
        photo_id: &str,
    ) -> Result<ProducedFile, ProcessError> {
        let file = OutputLayout::video_file(photo_id, video);
        let dir = self.layout.videos_dir(album_id);
        let dest = dir.join(&file);
        let path = OutputLayout::relative("videos", album_id, &file);

        if cache::is_fresh(&dest, cache::modified(video)) {
            return Ok(ProducedFile {
                path,
                status: VariantStatus::Cached,
            });
        }

        fs::create_dir_all(&dir)?;
        fs::copy(video, &dest)?;
        Ok(ProducedFile {
            path,
            status: VariantStatus::Copied,
        })
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
