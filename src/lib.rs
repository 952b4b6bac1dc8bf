//! # Purtypics
//!
//! A static photo and video gallery generator. Your filesystem is the data
//! source: each directory under the source root becomes an album, its
//! images and videos become the album's entries, and a single metadata file
//! carries titles, descriptions and hidden flags.
//!
//! # Architecture: One Pipeline, Many Photos
//!
//! A run goes through four steps, all driven by [`generate::Generator`]:
//!
//! ```text
//! 1. Scan       photos/         →  raw albums        (directory listing)
//! 2. Override   gallery.yaml    →  titles, hidden    (metadata store)
//! 3. Process    each photo      →  static/thumbs/    (variants, posters, video copies)
//! 4. Render     sorted albums   →  gallery.json      (renderer seam)
//! ```
//!
//! Step 3 is the expensive one. Photos of one album are processed on a
//! bounded worker pool; albums are processed one after another. Every
//! output is cached on disk and only regenerated when its source is newer,
//! so a second run over an unchanged tree does no decoding at all.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the source root one level deep and builds the raw album model |
//! | [`metadata`] | Loads and saves the YAML/JSON metadata file; path-keyed overrides |
//! | [`process`] | Media processor: image variants, video posters, video copies |
//! | [`generate`] | The orchestrator: overrides, bounded pool, filtering, sorting |
//! | [`progress`] | Typed progress events and the pollable progress tracker |
//! | [`render`] | The page-renderer seam and the JSON manifest renderer |
//! | [`cache`] | mtime-based cache validity and cache statistics |
//! | [`config`] | `config.toml` loading, validation and stock defaults |
//! | [`types`] | Album, Photo and capture data shared by every stage |
//! | [`naming`] | Media extensions, album IDs and default titles |
//! | [`imaging`] | Decode, resize, EXIF, orientation and ffmpeg tooling |
//! | [`output`] | CLI output formatting for progress and summaries |
//!
//! # Design Decisions
//!
//! ## Failures Stay Small
//!
//! A photo that cannot be decoded, or a video without ffmpeg installed, is
//! dropped from its album and reported. Only an unreadable source root, an
//! empty source, a broken metadata file or a cancelled run fail the whole
//! generation.
//!
//! ## Deterministic Order
//!
//! Photos are sorted by capture time, with undated photos last and
//! filenames breaking ties. Albums are sorted newest first by their newest
//! photo. Nothing in the ordering depends on the wall clock or on the order
//! in which workers finish.
//!
//! ## JPEG Variants via the `image` Crate
//!
//! Stills are decoded, oriented and resized with the `image` crate
//! (Lanczos3) and written as JPEG. Only video needs external programs:
//! `ffprobe` for dimensions and `ffmpeg` for poster frames. Their absence
//! fails the affected videos, never image-only albums.
//!
//! ## Events, Not Strings
//!
//! Progress is a closed set of [`progress::ProgressEvent`]s. The CLI prints
//! them; a long-lived server folds them into a
//! [`progress::ProgressTracker`] and polls `{percent, status, error}`.

pub mod cache;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod progress;
pub mod render;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
