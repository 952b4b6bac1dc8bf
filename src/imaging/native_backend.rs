//! Production media backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Capture data / orientation | `kamadak-exif` via [`exif`](super::exif) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Video dimensions / poster | `ffprobe` / `ffmpeg` via [`VideoTools`] |
//!
//! HEIF/HEIC files are recognized by the scanner, but no pure-Rust decoder
//! for them is compiled in; they fail at decode time like any corrupt file.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::backend::{BackendError, Dimensions, MediaBackend};
use super::exif;
use super::ffmpeg::VideoTools;
use super::orientation::Orientation;
use super::params::{FrameParams, Quality, ResizeParams};
use crate::types::CaptureData;

/// `image` crate for stills, external tools for video.
#[derive(Debug, Clone, Default)]
pub struct NativeBackend {
    tools: VideoTools,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(tools: VideoTools) -> Self {
        Self { tools }
    }
}

/// Load and decode an image from disk, guessing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn save_jpeg(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = JpegEncoder::new_with_quality(writer, quality.value() as u8);
    encoder.encode_image(&rgb).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
    })
}

impl MediaBackend for NativeBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_capture(&self, path: &Path) -> Result<Option<CaptureData>, BackendError> {
        exif::extract_image_metadata(path)
    }

    fn orientation(&self, path: &Path) -> Orientation {
        exif::get_orientation(path)
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = params.orientation.apply(load_image(&params.source)?);
        for target in &params.targets {
            let resized = if (target.width, target.height) == (img.width(), img.height()) {
                img.clone()
            } else {
                img.resize_exact(target.width, target.height, FilterType::Lanczos3)
            };
            save_jpeg(&resized, &target.output, params.quality)?;
        }
        Ok(())
    }

    fn probe_video(&self, path: &Path) -> Result<Dimensions, BackendError> {
        self.tools.get_video_dimensions(path)
    }

    fn extract_frame(&self, params: &FrameParams) -> Result<(), BackendError> {
        self.tools.extract_frame(params)
    }
}
