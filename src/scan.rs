//! Filesystem scanning.
//!
//! Stage 1 of the generation pipeline. Every immediate subdirectory of the
//! source root is a candidate album; its recognized media files (one level
//! only) become the album's photos.
//!
//! ```text
//! photos/                      # Source root
//! ├── gallery.yaml             # Metadata overrides (optional)
//! ├── config.toml              # Generator settings (optional)
//! ├── Trip_One/                # Album "Trip One"
//! │   ├── IMG_0001.jpg
//! │   ├── IMG_0002.JPG
//! │   ├── clip.mov             # Video: gets a poster frame
//! │   └── notes.txt            # Ignored
//! ├── empty_dir/               # No media: dropped silently
//! └── .thumbnails/             # Dot entries are skipped
//! ```
//!
//! Entries are visited in filename order so that IDs, default covers and
//! tie-breaks are the same on every machine. Directories nested inside an
//! album are not scanned.
//!
//! The scan produces the raw model: no metadata overrides, no dimensions,
//! no capture data. The generator fills those in.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::naming::{self, MediaKind};
use crate::types::{Album, Photo, SortOrder};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read source directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Scan `root` for albums.
///
/// Fails only when `root` itself cannot be listed. An album directory that
/// cannot be read is logged and skipped; one without media is dropped.
pub fn scan(root: &Path) -> Result<Vec<Album>, ScanError> {
    let unreadable = |source| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    };

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .map_err(unreadable)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && !is_dot_entry(p))
        .collect();
    dirs.sort();

    let mut albums = Vec::new();
    for dir in dirs {
        match scan_album(&dir) {
            Ok(album) if album.photos.is_empty() => {
                debug!(album = %dir.display(), "no media files, skipping");
            }
            Ok(album) => albums.push(album),
            Err(e) => {
                warn!(album = %dir.display(), error = %e, "cannot read album directory, skipping");
            }
        }
    }

    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for album in &mut albums {
        // Two directories can sanitize to the same ID ("a b" and "a-b");
        // suffix later ones so output paths stay distinct.
        let count = seen.entry(album.id.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            album.id = format!("{}-{}", album.id, count);
        }
    }

    Ok(albums)
}

fn scan_album(dir: &Path) -> Result<Album, walkdir::Error> {
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut photos = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 means the album directory itself could not be opened
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || is_dot_entry(entry.path()) {
            continue;
        }
        let Some(kind) = naming::media_kind(entry.path()) else {
            continue;
        };
        photos.push(build_photo(entry.path(), kind));
    }

    let cover = photos.first().map(|p: &Photo| p.id.clone());
    Ok(Album {
        id: naming::album_id(&dir_name),
        title: naming::album_title(&dir_name),
        description: None,
        source_path: dir.to_path_buf(),
        photos,
        cover,
        hidden: false,
        created_at: None,
        date: None,
        sort_order: SortOrder::Date,
        custom_order: Vec::new(),
        tags: Vec::new(),
    })
}

fn build_photo(path: &Path, kind: MediaKind) -> Photo {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let id = naming::photo_id(&filename);
    Photo {
        title: id.clone(),
        id,
        filename,
        description: None,
        source_path: path.to_path_buf(),
        width: 0,
        height: 0,
        capture: None,
        variants: BTreeMap::new(),
        is_video: kind == MediaKind::Video,
        video_path: None,
        hidden: false,
        tags: Vec::new(),
        sort_index: None,
    }
}

fn is_dot_entry(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
