//! Shared test utilities for the purtypics test suite.
//!
//! Builds throwaway source trees and looks things up in a generated
//! [`Gallery`] with panics that name what was available.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = source_tree(&[("Trip_One", &["a.jpg", "b.jpg"]), ("empty_dir", &[])]);
//! write_metadata(&tmp, "photos:\n  Trip_One/b.jpg:\n    hidden: true\n");
//! // sources live under tmp/src, outputs go to tmp/out
//!
//! let album = find_album(&result.gallery, "Trip One");
//! let photo = find_photo(album, "a.jpg");
//! ```

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::types::{Album, Gallery, Photo};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create `tmp/src/<album>/<file>` for every entry.
///
/// Files hold placeholder bytes; use [`write_jpeg`] when a test needs a
/// decodable image.
pub fn source_tree(albums: &[(&str, &[&str])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (album, files) in albums {
        let dir = tmp.path().join("src").join(album);
        fs::create_dir_all(&dir).unwrap();
        for file in *files {
            fs::write(dir.join(file), b"not really an image").unwrap();
        }
    }
    tmp
}

/// Write `tmp/src/gallery.yaml`.
pub fn write_metadata(tmp: &TempDir, yaml: &str) {
    let src = tmp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("gallery.yaml"), yaml).unwrap();
}

/// Move every source file's mtime `secs` into the past so outputs written
/// afterwards are strictly newer.
pub fn backdate_sources(tmp: &TempDir, secs: u64) {
    let when = SystemTime::now() - Duration::from_secs(secs);
    for entry in walkdir::WalkDir::new(tmp.path().join("src")) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            set_mtime(entry.path(), when);
        }
    }
}

/// Set `path`'s mtime an hour ahead, newer than any output.
pub fn touch_future(path: &Path) {
    set_mtime(path, SystemTime::now() + Duration::from_secs(3600));
}

fn set_mtime(path: &Path, when: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

/// Write a real JPEG of the given size with a simple gradient.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

// =========================================================================
// Gallery lookups: panic with a clear message on miss
// =========================================================================

/// Find an album by title. Panics if not found.
pub fn find_album<'a>(gallery: &'a Gallery, title: &str) -> &'a Album {
    gallery
        .albums
        .iter()
        .find(|a| a.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = gallery.albums.iter().map(|a| a.title.as_str()).collect();
            panic!("album '{title}' not found. Available: {titles:?}")
        })
}

/// Find a photo by filename within an album. Panics if not found.
pub fn find_photo<'a>(album: &'a Album, filename: &str) -> &'a Photo {
    album
        .photos
        .iter()
        .find(|p| p.filename == filename)
        .unwrap_or_else(|| {
            let names: Vec<&str> = album.photos.iter().map(|p| p.filename.as_str()).collect();
            panic!(
                "photo '{filename}' not found in album '{}'. Available: {names:?}",
                album.title
            )
        })
}
