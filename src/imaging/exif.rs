//! EXIF capture data.
//!
//! Reads the fields the gallery shows next to a photo and the orientation
//! code used to upright pixels before resizing. Uses `kamadak-exif`, which
//! handles JPEG, TIFF, PNG, WebP and HEIF containers.
//!
//! Missing metadata is normal: screenshots, exports and most PNGs carry
//! none. "No EXIF block" therefore comes back as `Ok(None)`, and callers
//! treat any error here as "proceed without metadata".

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, Field, In, Rational, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::backend::BackendError;
use super::orientation::Orientation;
use crate::types::{CaptureData, GpsData};

fn read_exif(path: &Path) -> Result<Option<Exif>, BackendError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_) | exif::Error::NotSupported(_) | exif::Error::BlankValue(_)) => {
            Ok(None)
        }
        Err(exif::Error::Io(e)) => Err(BackendError::Io(e)),
        Err(e) => Err(BackendError::ProcessingFailed(format!(
            "unreadable EXIF in {}: {e}",
            path.display()
        ))),
    }
}

/// Extract capture metadata from an image file.
///
/// `Ok(None)` when the file has no EXIF block at all. Individual tags that
/// are missing or malformed are left as `None` in the result.
pub fn extract_image_metadata(path: &Path) -> Result<Option<CaptureData>, BackendError> {
    let Some(exif) = read_exif(path)? else {
        return Ok(None);
    };

    let camera = match (ascii(&exif, Tag::Make), ascii(&exif, Tag::Model)) {
        (Some(make), Some(model)) => Some(format!("{make} {model}").trim().to_string()),
        _ => None,
    };

    Ok(Some(CaptureData {
        taken_at: timestamp(&exif),
        camera,
        lens: ascii(&exif, Tag::LensModel),
        iso: field(&exif, Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0)),
        aperture: rational(&exif, Tag::FNumber).and_then(ratio),
        shutter_speed: rational(&exif, Tag::ExposureTime)
            .and_then(|r| format_shutter(r.num, r.denom)),
        focal_length: rational(&exif, Tag::FocalLength)
            .and_then(ratio)
            .map(|mm| mm as u32),
        gps: gps(&exif),
        orientation: orientation_of(&exif).exif_code(),
    }))
}

/// Read only the orientation code. Returns `Normal` on any failure.
pub fn get_orientation(path: &Path) -> Orientation {
    match read_exif(path) {
        Ok(Some(exif)) => orientation_of(&exif),
        _ => Orientation::Normal,
    }
}

fn orientation_of(exif: &Exif) -> Orientation {
    field(exif, Tag::Orientation)
        .and_then(|f| f.value.get_uint(0))
        .map(Orientation::from_exif)
        .unwrap_or_default()
}

fn field(exif: &Exif, tag: Tag) -> Option<&Field> {
    exif.get_field(tag, In::PRIMARY)
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &field(exif, tag)?.value {
        Value::Ascii(parts) => {
            let raw = parts.first()?;
            let text = String::from_utf8_lossy(raw);
            let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn rational(exif: &Exif, tag: Tag) -> Option<Rational> {
    match &field(exif, tag)?.value {
        Value::Rational(values) => values.first().copied(),
        _ => None,
    }
}

fn ratio(r: Rational) -> Option<f64> {
    (r.denom != 0).then(|| r.num as f64 / r.denom as f64)
}

fn timestamp(exif: &Exif) -> Option<NaiveDateTime> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .find_map(|tag| match &field(exif, tag)?.value {
            Value::Ascii(parts) => parse_exif_datetime(parts.first()?),
            _ => None,
        })
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` value. Zeroed placeholders
/// (`0000:00:00 00:00:00`) yield `None`.
pub fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?.and_hms_opt(
        dt.hour as u32,
        dt.minute as u32,
        dt.second as u32,
    )
}

fn gps(exif: &Exif) -> Option<GpsData> {
    let coordinate = |value_tag, ref_tag| {
        let values = match &field(exif, value_tag)?.value {
            Value::Rational(values) => values.clone(),
            _ => return None,
        };
        let reference = ascii(exif, ref_tag).unwrap_or_default();
        dms_to_decimal(&values, &reference)
    };

    let latitude = coordinate(Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let longitude = coordinate(Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    let below_sea_level = field(exif, Tag::GPSAltitudeRef)
        .and_then(|f| f.value.get_uint(0))
        == Some(1);
    let altitude = rational(exif, Tag::GPSAltitude)
        .and_then(ratio)
        .map(|alt| if below_sea_level { -alt } else { alt });

    Some(GpsData {
        latitude,
        longitude,
        altitude,
    })
}

/// Degrees/minutes/seconds to signed decimal degrees. South and West
/// references are negative. Needs all three components.
pub fn dms_to_decimal(dms: &[Rational], reference: &str) -> Option<f64> {
    let [d, m, s] = dms else {
        return None;
    };
    let decimal = ratio(*d)? + ratio(*m)? / 60.0 + ratio(*s)? / 3600.0;
    if reference.eq_ignore_ascii_case("S") || reference.eq_ignore_ascii_case("W") {
        Some(-decimal)
    } else {
        Some(decimal)
    }
}

/// Format an exposure time: `1/250` when the denominator dominates,
/// `2.5s` otherwise.
pub fn format_shutter(num: u32, denom: u32) -> Option<String> {
    if num == 0 || denom == 0 {
        return None;
    }
    if denom > num {
        Some(format!("1/{}", denom / num))
    } else {
        Some(format!("{:.1}s", num as f64 / denom as f64))
    }
}
