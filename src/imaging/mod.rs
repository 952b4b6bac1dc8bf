//! Media processing: stills in pure Rust, video through `ffmpeg`/`ffprobe`.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **EXIF capture data** | `kamadak-exif` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Video probe / poster** | `ffprobe` / `ffmpeg` subprocesses |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for variant dimension math (unit testable)
//! - **Parameters**: Data structures describing media operations
//! - **Orientation**: EXIF orientation codes and their pixel transforms
//! - **Backend**: [`MediaBackend`] trait + [`NativeBackend`]

pub mod backend;
pub mod calculations;
pub mod exif;
pub mod ffmpeg;
pub mod native_backend;
pub mod orientation;
mod params;

pub use backend::{BackendError, Dimensions, MediaBackend};
pub use calculations::{PlannedVariant, plan_variants, scale_to_edge};
pub use ffmpeg::VideoTools;
pub use native_backend::NativeBackend;
pub use orientation::Orientation;
pub use params::{FrameParams, Quality, ResizeParams, ResizeTarget, VariantSize};
