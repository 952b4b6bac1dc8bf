//! Modification-time cache for generated media.
//!
//! There is no manifest: the output tree itself is the cache. A generated
//! file is valid when it exists and its modification time is at or after
//! the source file's. Decoding and resizing are the slow part of a run, so
//! the process stage checks validity before touching the decoder.
//!
//! Image variants are checked as a set. If any variant of a photo is
//! missing or stale, every variant of that photo is regenerated, so a
//! source edited mid-run never leaves sizes from two different versions
//! side by side. Video posters and copied originals follow the same rule
//! one file at a time.
//!
//! A stale or missing source mtime (some network filesystems do not report
//! one) is treated as "always regenerate".

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Modification time of `path`, `None` if unavailable.
pub fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when `output` exists and is not older than `source_mtime`.
pub fn is_fresh(output: &Path, source_mtime: Option<SystemTime>) -> bool {
    match (source_mtime, modified(output)) {
        (Some(source), Some(out)) => out >= source,
        _ => false,
    }
}

/// True when every output is fresh. An empty set is never fresh.
pub fn all_fresh<'a>(
    outputs: impl IntoIterator<Item = &'a Path>,
    source_mtime: Option<SystemTime>,
) -> bool {
    let mut any = false;
    for output in outputs {
        any = true;
        if !is_fresh(output, source_mtime) {
            return false;
        }
    }
    any
}

/// Summary of cache performance for a generation run.
///
/// Counted per photo: a photo whose variants were all reused is one hit.
/// `copies` counts video originals copied into the output tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }

    pub fn merge(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.copies += other.copies;
        self.misses += other.misses;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} regenerated ({} total)",
                self.hits,
                self.misses,
                self.total()
            )?;
        } else {
            write!(f, "{} regenerated", self.misses)?;
        }
        if self.copies > 0 {
            write!(f, ", {} videos copied", self.copies)?;
        }
        Ok(())
    }
}
