//! Gallery metadata store.
//!
//! A single file (YAML by default, JSON when the extension says so) holds
//! gallery-wide fields and two override maps keyed by source path:
//!
//! ```yaml
//! title: Family Photos
//! author: Jo
//! show_locations: true
//! albums:
//!   /photos/Trip_One:
//!     title: Lisbon, spring
//!     cover_photo: IMG_0042.jpg
//!   Old_Stuff:
//!     hidden: true
//! photos:
//!   /photos/Trip_One/IMG_0007.jpg:
//!     hidden: true
//!   Trip_One/IMG_0010.jpg:
//!     description: The tram up to the castle
//! ```
//!
//! Keys are looked up by the absolute source path first (what the editor
//! writes), then by the path relative to the source root with `/`
//! separators (what people write by hand).
//!
//! Empty strings mean "no override": every text field goes through
//! [`resolve`], so a blank `title:` falls back to the scanned default.
//!
//! The store is plain data. Loading happens once per generation run and the
//! generator never writes back; [`save`] exists for the editor side.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

use crate::types::SortOrder;

/// Default metadata filename, relative to the source root.
pub const DEFAULT_FILENAME: &str = "gallery.yaml";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported metadata format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub copyright: String,
    pub show_locations: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub albums: BTreeMap<String, AlbumMetadata>,
    #[serde(deserialize_with = "null_as_default")]
    pub photos: BTreeMap<String, PhotoMetadata>,
}

/// Album-level overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Free-form display date; `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
    /// Filename (not ID) of the photo to use as cover.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cover_photo: String,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
    pub sort_order: SortOrder,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub custom_order: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Photo-level overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<i64>,
}

fn is_false(b: &bool) -> bool {
    !b
}

/// `albums:` with nothing under it parses as null; treat that as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<Format, MetadataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "yaml" | "yml" => Ok(Format::Yaml),
        "json" => Ok(Format::Json),
        _ => Err(MetadataError::UnsupportedFormat(if ext.is_empty() {
            path.display().to_string()
        } else {
            format!(".{ext}")
        })),
    }
}

/// Load the metadata file at `path`.
///
/// A missing file yields empty metadata, as does a file with only
/// whitespace. A present file that fails to parse is an error, as is an
/// extension other than `.yaml`, `.yml` or `.json`.
pub fn load(path: &Path) -> Result<GalleryMetadata, MetadataError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(GalleryMetadata::default());
        }
        Err(e) => return Err(e.into()),
    };
    let format = format_of(path)?;
    if content.trim().is_empty() {
        return Ok(GalleryMetadata::default());
    }
    let meta = match format {
        Format::Yaml => serde_yaml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    };
    Ok(meta)
}

/// Write `meta` to `path` in the format its extension names.
pub fn save(meta: &GalleryMetadata, path: &Path) -> Result<(), MetadataError> {
    let data = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(meta)?,
        Format::Json => serde_json::to_string_pretty(meta)?,
    };
    fs::write(path, data)?;
    Ok(())
}

/// Root-relative lookup key with `/` separators, e.g. `Trip_One/IMG_1.jpg`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn lookup<'a, T>(
    map: &'a BTreeMap<String, T>,
    root: &Path,
    path: &Path,
) -> Option<&'a T> {
    if map.is_empty() {
        return None;
    }
    map.get(path.to_string_lossy().as_ref())
        .or_else(|| relative_key(root, path).and_then(|key| map.get(&key)))
}

impl GalleryMetadata {
    /// Overrides for the album whose directory is `album_path`.
    pub fn album(&self, root: &Path, album_path: &Path) -> Option<&AlbumMetadata> {
        lookup(&self.albums, root, album_path)
    }

    /// Overrides for the photo at `photo_path`.
    pub fn photo(&self, root: &Path, photo_path: &Path) -> Option<&PhotoMetadata> {
        lookup(&self.photos, root, photo_path)
    }
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value (trimmed).
///
/// ```text
/// title:       resolve(&[override_title, scanned_title])
/// description: resolve(&[override_description])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}
