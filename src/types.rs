//! Gallery data model shared by every pipeline step.
//!
//! The scanner creates [`Album`]s and [`Photo`]s, the generator enriches and
//! filters them in place, and the final [`Gallery`] is handed to a
//! [`Renderer`](crate::render::Renderer) as plain, serializable data.

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// GPS position recorded by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsData {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// Capture metadata read from a photo's EXIF block.
///
/// Every field is optional because cameras, phones and editing tools write
/// wildly different subsets. `orientation` always holds a valid EXIF code
/// (1–8); anything unreadable is normalized to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    /// F-number as a decimal ratio, e.g. `2.8`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
    /// `1/250` for fast exposures, `2.5s` for long ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
    /// Focal length in whole millimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsData>,
    pub orientation: u16,
}

impl Default for CaptureData {
    fn default() -> Self {
        Self {
            taken_at: None,
            camera: None,
            lens: None,
            iso: None,
            aperture: None,
            shutter_speed: None,
            focal_length: None,
            gps: None,
            orientation: 1,
        }
    }
}

/// Layout hint derived from pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Wide,
    Tall,
    Normal,
}

/// How photos inside an album are ordered.
///
/// Stored as a free-form string in the metadata file; empty or unknown
/// values mean date order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortOrder {
    #[default]
    Date,
    Name,
    Custom,
}

impl From<String> for SortOrder {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Self::Name,
            "custom" => Self::Custom,
            _ => Self::Date,
        }
    }
}

impl From<SortOrder> for String {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Date => "date",
            SortOrder::Name => "name",
            SortOrder::Custom => "custom",
        }
        .to_string()
    }
}

/// A single photo or video inside an album.
///
/// Serialized for the renderer with its derived `aspect_class`; `hidden`
/// and `sort_index` only matter inside the generator and are left out.
#[derive(Debug, Clone)]
pub struct Photo {
    /// Filename stem, unique within the album.
    pub id: String,
    pub filename: String,
    pub title: String,
    pub description: Option<String>,
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub capture: Option<CaptureData>,
    /// Size name (`small`, `medium`, `large`, `full`, or `poster`) to
    /// output-relative path.
    pub variants: BTreeMap<String, String>,
    pub is_video: bool,
    /// Output-relative path of the copied original, videos only.
    pub video_path: Option<String>,
    pub hidden: bool,
    pub tags: Vec<String>,
    /// Explicit position for albums in custom order.
    pub sort_index: Option<i64>,
}

impl Serialize for Photo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Photo", 12)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("filename", &self.filename)?;
        state.serialize_field("title", &self.title)?;
        match &self.description {
            Some(description) => state.serialize_field("description", description)?,
            None => state.skip_field("description")?,
        }
        state.serialize_field("source_path", &self.source_path)?;
        state.serialize_field("width", &self.width)?;
        state.serialize_field("height", &self.height)?;
        state.serialize_field("aspect_class", &self.aspect_class())?;
        match &self.capture {
            Some(capture) => state.serialize_field("capture", capture)?,
            None => state.skip_field("capture")?,
        }
        state.serialize_field("variants", &self.variants)?;
        state.serialize_field("is_video", &self.is_video)?;
        match &self.video_path {
            Some(path) => state.serialize_field("video_path", path)?,
            None => state.skip_field("video_path")?,
        }
        if self.tags.is_empty() {
            state.skip_field("tags")?;
        } else {
            state.serialize_field("tags", &self.tags)?;
        }
        state.end()
    }
}

impl Photo {
    pub fn taken_at(&self) -> Option<NaiveDateTime> {
        self.capture.as_ref().and_then(|c| c.taken_at)
    }

    /// `wide` above 3:2, `tall` below 3:4, `normal` otherwise (including
    /// unknown dimensions).
    pub fn aspect_class(&self) -> AspectClass {
        if self.width == 0 || self.height == 0 {
            return AspectClass::Normal;
        }
        let ratio = self.width as f64 / self.height as f64;
        if ratio > 1.5 {
            AspectClass::Wide
        } else if ratio < 0.75 {
            AspectClass::Tall
        } else {
            AspectClass::Normal
        }
    }
}

/// One gallery section, built from one immediate subdirectory of the source.
#[derive(Debug, Clone, Serialize)]
pub struct Album {
    /// Sanitized directory name, used in output paths.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_path: PathBuf,
    pub photos: Vec<Photo>,
    /// Photo ID of the cover image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip)]
    pub hidden: bool,
    /// Newest capture timestamp among the album's photos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// Display date set in the metadata file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip)]
    pub sort_order: SortOrder,
    #[serde(skip)]
    pub custom_order: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Album {
    /// Newest capture timestamp, `None` when no photo carries one.
    pub fn newest_capture(&self) -> Option<NaiveDateTime> {
        self.photos.iter().filter_map(Photo::taken_at).max()
    }
}

/// The finished model handed to the page renderer.
#[derive(Debug, Clone, Serialize)]
pub struct Gallery {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub copyright: String,
    pub show_locations: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_url: String,
    pub albums: Vec<Album>,
}
