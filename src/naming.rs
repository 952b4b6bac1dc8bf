//! Naming conventions for albums and photos.
//!
//! The scanner derives every identifier and default title from the
//! filesystem:
//!
//! - `Trip_One/` → album ID `Trip_One`, title "Trip One"
//! - `Summer Trip (2023)/` → album ID `Summer-Trip-2023`, title "Summer Trip (2023)"
//! - `IMG_0042.JPG` → photo ID and title `IMG_0042`
//!
//! Album IDs end up in output paths (`static/thumbs/<album>/…`), so they are
//! restricted to URL- and filesystem-safe characters. Photo IDs are used as
//! is: they come from filenames that already live on the same filesystem.

use std::path::Path;

/// Recognized still-image extensions (compared lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heif", "heic"];

/// Recognized video extensions (compared lowercase).
pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "avi"];

const MAX_ID_LEN: usize = 80;

/// What kind of media a file is, judged by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify a path by its extension, case-insensitively.
///
/// Returns `None` for anything outside the recognized sets, including files
/// without an extension.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Sanitize a directory name into an album ID.
///
/// - Keeps ASCII alphanumerics, `-` and `_`
/// - Replaces every other character with `-`, collapsing runs
/// - Strips leading and trailing dashes
/// - Truncates to 80 bytes at the last dash before the limit
///
/// A name with nothing usable left (e.g. `"***"`) becomes `"album"`.
pub fn album_id(dir_name: &str) -> String {
    let mut collapsed = String::with_capacity(dir_name.len());
    let mut prev_dash = false;
    for c in dir_name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }

    let trimmed = collapsed.trim_matches('-');
    let id = if trimmed.len() <= MAX_ID_LEN {
        trimmed
    } else {
        let truncated = &trimmed[..MAX_ID_LEN];
        match truncated.rfind('-') {
            Some(pos) if pos > 0 => &truncated[..pos],
            _ => truncated,
        }
    };

    if id.is_empty() {
        "album".to_string()
    } else {
        id.to_string()
    }
}

/// Default album title: the directory name with underscores as spaces.
pub fn album_title(dir_name: &str) -> String {
    dir_name.replace('_', " ")
}

/// Photo ID and default title: the filename without its extension.
pub fn photo_id(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_recognizes_images_case_insensitively() {
        assert_eq!(media_kind(Path::new("a.jpg")), Some(MediaKind::Image));
        assert_eq!(media_kind(Path::new("a.JPEG")), Some(MediaKind::Image));
        assert_eq!(media_kind(Path::new("a.HeIc")), Some(MediaKind::Image));
        assert_eq!(media_kind(Path::new("a.webp")), Some(MediaKind::Image));
    }

    #[test]
    fn media_kind_recognizes_videos() {
        assert_eq!(media_kind(Path::new("clip.MOV")), Some(MediaKind::Video));
        assert_eq!(media_kind(Path::new("clip.mp4")), Some(MediaKind::Video));
        assert_eq!(media_kind(Path::new("clip.avi")), Some(MediaKind::Video));
    }

    #[test]
    fn media_kind_rejects_everything_else() {
        assert_eq!(media_kind(Path::new("notes.txt")), None);
        assert_eq!(media_kind(Path::new("gallery.yaml")), None);
        assert_eq!(media_kind(Path::new("README")), None);
        assert_eq!(media_kind(Path::new("anim.gif")), None);
        assert_eq!(media_kind(Path::new("clip.mkv")), None);
    }

    #[test]
    fn album_id_keeps_safe_names() {
        assert_eq!(album_id("Trip_One"), "Trip_One");
        assert_eq!(album_id("2023-italy"), "2023-italy");
    }

    #[test]
    fn album_id_replaces_unsafe_characters() {
        assert_eq!(album_id("Summer Trip (2023)"), "Summer-Trip-2023");
        assert_eq!(album_id("a / b"), "a-b");
        assert_eq!(album_id("Café"), "Caf");
    }

    #[test]
    fn album_id_falls_back_when_nothing_survives() {
        assert_eq!(album_id("***"), "album");
        assert_eq!(album_id(""), "album");
    }

    #[test]
    fn album_id_truncates_at_dash() {
        let long = format!("{}-{}", "a".repeat(70), "b".repeat(20));
        assert_eq!(album_id(&long), "a".repeat(70));
    }

    #[test]
    fn album_title_replaces_underscores() {
        assert_eq!(album_title("Trip_One"), "Trip One");
        assert_eq!(album_title("no_more__gaps"), "no more  gaps");
        assert_eq!(album_title("Plain"), "Plain");
    }

    #[test]
    fn photo_id_strips_extension_only() {
        assert_eq!(photo_id("IMG_0042.JPG"), "IMG_0042");
        assert_eq!(photo_id("archive.tar.jpg"), "archive.tar");
        assert_eq!(photo_id("noext"), "noext");
    }
}
