//! Generator configuration.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the source root next to the album directories and is entirely optional:
//! stock defaults are used for everything it does not mention.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! sizes = [
//!   { name = "small", edge = 400 },
//!   { name = "medium", edge = 800 },
//!   { name = "large", edge = 1600 },
//!   { name = "full", edge = 2560 },
//! ]
//! quality = 95              # JPEG quality (1-100)
//!
//! [processing]
//! workers = 4               # Photos processed at once within an album
//!
//! [metadata]
//! file = "gallery.yaml"     # Relative to the source root, or absolute
//!
//! [video]
//! ffmpeg = "ffmpeg"
//! ffprobe = "ffprobe"
//! poster_offsets = [1.0, 0.0]
//!
//! [site]
//! title = "Photo Gallery"
//! base_url = ""
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [processing]
//! workers = 8
//! ```
//!
//! Arrays replace the default wholesale, so a custom `sizes` list must name
//! every size wanted. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::imaging::{Quality, VariantSize};
use crate::metadata;

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Generator configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Variant sizes and encoding quality.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Where the metadata file lives.
    pub metadata: MetadataConfig,
    /// External video tools.
    pub video: VideoConfig,
    /// Defaults handed to the page renderer.
    pub site: SiteConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "images.sizes must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for size in &self.images.sizes {
            if size.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "images.sizes names must not be empty".into(),
                ));
            }
            if size.name == "poster" {
                return Err(ConfigError::Validation(
                    "images.sizes name \"poster\" is reserved for video frames".into(),
                ));
            }
            if size.edge == 0 {
                return Err(ConfigError::Validation(format!(
                    "images.sizes edge for \"{}\" must be non-zero",
                    size.name
                )));
            }
            if !seen.insert(size.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "images.sizes name \"{}\" is listed twice",
                    size.name
                )));
            }
        }
        if self.processing.workers == 0 {
            return Err(ConfigError::Validation(
                "processing.workers must be at least 1".into(),
            ));
        }
        if self.metadata.file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "metadata.file must not be empty".into(),
            ));
        }
        if self.video.poster_offsets.is_empty() {
            return Err(ConfigError::Validation(
                "video.poster_offsets must not be empty".into(),
            ));
        }
        if self
            .video
            .poster_offsets
            .iter()
            .any(|s| !s.is_finite() || *s < 0.0)
        {
            return Err(ConfigError::Validation(
                "video.poster_offsets must be non-negative seconds".into(),
            ));
        }
        Ok(())
    }

    /// The configured sizes as imaging parameters, in file order.
    pub fn variant_sizes(&self) -> Vec<VariantSize> {
        self.images
            .sizes
            .iter()
            .map(|s| VariantSize::new(&s.name, s.edge))
            .collect()
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.images.quality)
    }

    /// Metadata file path: `metadata.file` resolved against `source_root`.
    pub fn metadata_path(&self, source_root: &Path) -> PathBuf {
        resolve_in_source(source_root, Path::new(&self.metadata.file))
    }

    /// Like [`metadata_path`](Self::metadata_path), but an explicit
    /// `override_file` (e.g. from the command line) wins. A relative
    /// override is still taken relative to `source_root`.
    pub fn metadata_path_with(&self, source_root: &Path, override_file: Option<&Path>) -> PathBuf {
        match override_file {
            Some(file) => resolve_in_source(source_root, file),
            None => self.metadata_path(source_root),
        }
    }
}

fn resolve_in_source(source_root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        source_root.join(file)
    }
}

/// One named variant size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeConfig {
    /// Size name used in output filenames (`<photo>_<name>.jpg`).
    pub name: String,
    /// Longest-edge target in pixels.
    pub edge: u32,
}

/// Variant generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Longest-edge sizes to generate. The smallest is always produced.
    pub sizes: Vec<SizeConfig>,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        let size = |name: &str, edge| SizeConfig {
            name: name.to_string(),
            edge,
        };
        Self {
            sizes: vec![
                size("small", 400),
                size("medium", 800),
                size("large", 1600),
                size("full", 2560),
            ],
            quality: 95,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum photos processed concurrently within one album.
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub file: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            file: metadata::DEFAULT_FILENAME.to_string(),
        }
    }
}

/// External video tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Frame extraction program (name on `PATH` or a full path).
    pub ffmpeg: String,
    /// Stream probing program.
    pub ffprobe: String,
    /// Seconds into the video to try for the poster frame, in order.
    pub poster_offsets: Vec<f64>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            poster_offsets: vec![1.0, 0.0],
        }
    }
}

/// Renderer defaults. A non-empty title in the metadata file wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub title: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Photo Gallery".to_string(),
            base_url: String::new(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(GalleryConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the source root.
pub fn load_config(source_root: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(load_raw_config(source_root)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Purtypics Configuration
# =======================
# Place this file in the source directory, next to the album folders.
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Image variants
# ---------------------------------------------------------------------------
[images]
# Longest-edge sizes written to static/thumbs/<album>/<photo>_<name>.jpg.
# Sizes at or above the source's longest edge are skipped, except the
# smallest, which every photo gets (small sources are scaled up to it).
sizes = [
  { name = "small", edge = 400 },
  { name = "medium", edge = 800 },
  { name = "large", edge = 1600 },
  { name = "full", edge = 2560 },
]

# JPEG quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Photos processed at the same time within one album.
workers = 4

# ---------------------------------------------------------------------------
# Metadata file (titles, descriptions, hidden flags, cover photos)
# ---------------------------------------------------------------------------
[metadata]
# Relative to the source directory, or absolute. YAML or JSON.
file = "gallery.yaml"

# ---------------------------------------------------------------------------
# Video tools
# ---------------------------------------------------------------------------
[video]
ffmpeg = "ffmpeg"
ffprobe = "ffprobe"
# Seconds into the clip to grab the poster frame from, tried in order.
poster_offsets = [1.0, 0.0]

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Used when the metadata file has no title.
title = "Photo Gallery"
base_url = ""
"##
}
