//! CLI output formatting for the `generate` and `check` commands.
//!
//! # Information-First Display
//!
//! Every entity leads with its positional index and title; filesystem paths
//! and statuses follow as indented context lines. The same helpers
//! ([`entity_header`], [`photo_line`]) are used for every command so an
//! album looks the same in `check` output as in a generation run.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Albums
//! 001 Trip One (3 photos)
//!     Source: Trip_One/
//!     001 IMG_0001.jpg
//!     002 IMG_0002.jpg (hidden)
//!     003 clip.mov (video)
//! 002 Old Stuff (1 photos) (hidden)
//!     Source: Old_Stuff/
//!
//! Config
//!     config.toml
//!     gallery.yaml
//! ```
//!
//! ## Generate
//!
//! ```text
//! Scanning for albums...
//! Found 1 albums with 3 photos
//! Trip One (3 photos)
//!     001/003 IMG_0001.jpg: encoded
//!     002/003 IMG_0002.jpg: hidden
//!     003/003 clip.mov: failed (ffmpeg not found; install it to process videos)
//! Generating pages...
//! Gallery generated
//! ```
//!
//! Photo lines arrive in completion order, not filename order, because
//! photos are processed in parallel.
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure apart from the existence checks in the config
//! section of `check`.

use std::path::Path;

use crate::generate::GenerateResult;
use crate::metadata::GalleryMetadata;
use crate::process::VariantStatus;
use crate::progress::{PhotoOutcome, ProgressEvent};
use crate::types::Album;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 Trip One (5 photos)
/// 001 Trip One
/// ```
fn entity_header(index: usize, title: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({} photos)", format_index(index), title, n),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Format a photo line: titled photos show the title with the filename in
/// parens, untitled ones just the filename.
///
/// ```text
/// 001 The Tram (IMG_0001.jpg)   // titled
/// 001 IMG_0001.jpg              // title is the default
/// ```
fn photo_line(index: usize, title: &str, filename: &str) -> String {
    let default_title = crate::naming::photo_id(filename);
    if title.is_empty() || title == default_title {
        format!("{} {}", format_index(index), filename)
    } else {
        format!("{} {} ({})", format_index(index), title, filename)
    }
}

fn status_label(status: VariantStatus) -> &'static str {
    match status {
        VariantStatus::Cached => "cached",
        VariantStatus::Encoded => "encoded",
        VariantStatus::Copied => "copied",
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the scanned source tree with metadata overrides applied.
///
/// Hidden albums and photos are listed with a `(hidden)` marker so the
/// output doubles as an audit of the metadata file.
pub fn format_scan_output(
    albums: &[Album],
    metadata: &GalleryMetadata,
    source_root: &Path,
    metadata_path: &Path,
) -> Vec<String> {
    let mut lines = vec!["Albums".to_string()];

    for (i, album) in albums.iter().enumerate() {
        let overrides = metadata.album(source_root, &album.source_path);
        let title = overrides
            .map(|m| m.title.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(album.title.as_str());
        let mut header = entity_header(i + 1, title, Some(album.photos.len()));
        if overrides.is_some_and(|m| m.hidden) {
            header.push_str(" (hidden)");
        }
        lines.push(header);

        let dir_name = album
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!("{}Source: {}/", indent(1), dir_name));

        for (j, photo) in album.photos.iter().enumerate() {
            let photo_meta = metadata.photo(source_root, &photo.source_path);
            let title = photo_meta
                .map(|m| m.title.trim())
                .filter(|t| !t.is_empty())
                .unwrap_or(photo.title.as_str());
            let mut line = format!("{}{}", indent(1), photo_line(j + 1, title, &photo.filename));
            if photo.is_video {
                line.push_str(" (video)");
            }
            if photo_meta.is_some_and(|m| m.hidden) {
                line.push_str(" (hidden)");
            }
            lines.push(line);
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join(crate::config::CONFIG_FILENAME).exists() {
        lines.push(format!("{}{}", indent(1), crate::config::CONFIG_FILENAME));
    }
    if metadata_path.exists() {
        let shown = metadata_path
            .strip_prefix(source_root)
            .unwrap_or(metadata_path);
        lines.push(format!("{}{}", indent(1), shown.display()));
    }

    lines
}

/// Print check output to stdout.
pub fn print_scan_output(
    albums: &[Album],
    metadata: &GalleryMetadata,
    source_root: &Path,
    metadata_path: &Path,
) {
    for line in format_scan_output(albums, metadata, source_root, metadata_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_event(event: &ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::AlbumStarted { name, photos } => {
            vec![format!("{} ({} photos)", name, photos)]
        }
        ProgressEvent::PhotoProcessed {
            current,
            total,
            filename,
            outcome,
            ..
        } => {
            let width = total.to_string().len().max(3);
            let detail = match outcome {
                PhotoOutcome::Processed { status } => status_label(*status).to_string(),
                PhotoOutcome::Hidden => "hidden".to_string(),
                PhotoOutcome::Failed(reason) => format!("failed ({})", reason),
                PhotoOutcome::Cancelled => "cancelled".to_string(),
            };
            vec![format!(
                "{}{:0>w$}/{:0>w$} {}: {}",
                indent(1),
                current,
                total,
                filename,
                detail,
                w = width
            )]
        }
        // Per-album failure details are listed in the summary
        ProgressEvent::AlbumFinished { .. } => Vec::new(),
        other => vec![other.message()],
    }
}

/// Format the end-of-run summary: per-album counts, failures, cache stats.
pub fn format_summary(result: &GenerateResult) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, album) in result.gallery.albums.iter().enumerate() {
        lines.push(entity_header(i + 1, &album.title, Some(album.photos.len())));
    }
    for title in &result.hidden_albums {
        lines.push(format!("{}{} (hidden)", indent(1), title));
    }

    let failed: Vec<_> = result.reports.iter().filter(|r| !r.is_clean()).collect();
    if !failed.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for report in failed {
            lines.push(format!(
                "{}{} ({} failed)",
                indent(1),
                report.title,
                report.failures.len()
            ));
            for failure in &report.failures {
                lines.push(format!(
                    "{}{}: {}",
                    indent(2),
                    failure.filename,
                    failure.reason
                ));
            }
        }
    }

    let photos: usize = result.gallery.albums.iter().map(|a| a.photos.len()).sum();
    lines.push(String::new());
    lines.push(format!(
        "Generated {} albums, {} photos",
        result.gallery.albums.len(),
        photos
    ));
    lines.push(format!("Cache: {}", result.cache_stats));
    lines
}

/// Print the run summary to stdout.
pub fn print_summary(result: &GenerateResult) {
    for line in format_summary(result) {
        println!("{}", line);
    }
}
