//! Gallery generation: the orchestrator that drives a whole run.
//!
//! ```text
//! idle → scanning → processing albums → rendering pages → complete
//!                                                   ↘ error (from any step)
//! ```
//!
//! ## Sequence
//!
//! 1. Load the metadata file. A missing file means no overrides; a file that
//!    fails to parse aborts the run.
//! 2. Scan the source root. No albums at all aborts the run.
//! 3. Apply album overrides. Hidden albums are dropped here, before any
//!    photo is touched.
//! 4. Process each album's photos on a dedicated pool of
//!    `processing.workers` threads (4 by default). Albums run one after
//!    another. A photo that fails is reported and left out; its siblings
//!    carry on.
//! 5. Drop hidden and failed photos, then albums left empty.
//! 6. Sort photos within each album, then albums newest first.
//! 7. Hand the finished [`Gallery`] to a [`Renderer`].
//!
//! ## Ordering
//!
//! Photo order inside the pool is arbitrary; the final order comes only from
//! the sort in step 6, which never consults the wall clock:
//!
//! - **Date** (default): oldest capture first. Photos without a capture
//!   timestamp go last. Ties break on filename.
//! - **Name**: by filename.
//! - **Custom**: filenames listed in `custom_order` first, in that order;
//!   then photos with a `sort_index`, ascending; then the rest by date.
//!
//! Albums are ordered by their newest capture, newest first. An album with
//! no timestamped photo sorts to the front. Ties break on album ID.
//!
//! ## Failure granularity
//!
//! | Failure | Effect |
//! |---|---|
//! | Source root unreadable, no albums, bad metadata file | run fails |
//! | Album directory unreadable | album skipped during scan |
//! | Decode error, missing ffmpeg, write error | photo dropped, counted in [`AlbumReport`] |
//! | No EXIF, missing ffprobe | photo kept without that data |

use chrono::{DateTime, NaiveDate};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStats;
use crate::config::GalleryConfig;
use crate::imaging::{MediaBackend, NativeBackend, VideoTools};
use crate::metadata::{self, AlbumMetadata, GalleryMetadata, MetadataError, PhotoMetadata};
use crate::process::{MediaProcessor, POSTER, ProcessError, VariantStatus};
use crate::progress::{CancelToken, PhotoOutcome, ProgressEvent, ProgressTracker};
use crate::render::{ManifestRenderer, RenderError, Renderer};
use crate::scan::{self, ScanError};
use crate::types::{Album, Gallery, Photo, SortOrder};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to load metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("Failed to scan source: {0}")]
    Scan(#[from] ScanError),
    #[error("No albums found in {0}")]
    NoAlbums(PathBuf),
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Failed to render pages: {0}")]
    Render(#[from] RenderError),
    #[error("Generation cancelled")]
    Cancelled,
}

/// One photo that was dropped from the gallery because processing failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFailure {
    pub filename: String,
    pub reason: String,
}

/// Per-album outcome counts.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumReport {
    pub id: String,
    pub title: String,
    pub processed: usize,
    pub hidden: usize,
    pub failures: Vec<PhotoFailure>,
}

impl AlbumReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything a caller needs after a successful run.
#[derive(Debug)]
pub struct GenerateResult {
    pub gallery: Gallery,
    pub reports: Vec<AlbumReport>,
    /// Titles of albums hidden by metadata.
    pub hidden_albums: Vec<String>,
    pub cache_stats: CacheStats,
}

/// Run the full pipeline with the production backend and the JSON renderer.
pub fn generate(
    source: &Path,
    output: &Path,
    config: &GalleryConfig,
    events: Option<Sender<ProgressEvent>>,
) -> Result<GenerateResult, GenerateError> {
    let backend = NativeBackend::with_tools(VideoTools::new(
        config.video.ffmpeg.as_str(),
        config.video.ffprobe.as_str(),
    ));
    let mut generator = Generator::new(source, output, config.clone(), &backend);
    if let Some(tx) = events {
        generator = generator.events(tx);
    }
    generator.run(&ManifestRenderer)
}

/// A configured generation run.
///
/// Built once, then [`run`](Generator::run). Progress goes to an optional
/// event channel and an optional shared [`ProgressTracker`]; both are
/// advisory and never fail the run.
pub struct Generator<'a, B: MediaBackend> {
    source: PathBuf,
    output: PathBuf,
    config: GalleryConfig,
    backend: &'a B,
    metadata_path: Option<PathBuf>,
    events: Option<Sender<ProgressEvent>>,
    tracker: Option<Arc<ProgressTracker>>,
    cancel: CancelToken,
}

impl<'a, B: MediaBackend> Generator<'a, B> {
    pub fn new(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        config: GalleryConfig,
        backend: &'a B,
    ) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            config,
            backend,
            metadata_path: None,
            events: None,
            tracker: None,
            cancel: CancelToken::new(),
        }
    }

    /// Use this metadata file instead of the configured one.
    pub fn metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    pub fn events(mut self, tx: Sender<ProgressEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn tracker(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run(&self, renderer: &dyn Renderer) -> Result<GenerateResult, GenerateError> {
        self.run_steps(renderer).inspect_err(|e| {
            error!(error = %e, "generation failed");
            self.emit(ProgressEvent::Failed {
                reason: e.to_string(),
            });
        })
    }

    fn run_steps(&self, renderer: &dyn Renderer) -> Result<GenerateResult, GenerateError> {
        self.emit(ProgressEvent::ScanStarted);

        let metadata_path = self
            .metadata_path
            .clone()
            .unwrap_or_else(|| self.config.metadata_path(&self.source));
        let metadata = metadata::load(&metadata_path)?;
        debug!(path = %metadata_path.display(), "metadata loaded");

        let scanned = scan::scan(&self.source)?;
        if scanned.is_empty() {
            return Err(GenerateError::NoAlbums(self.source.clone()));
        }

        let mut albums = Vec::with_capacity(scanned.len());
        let mut hidden_albums = Vec::new();
        for mut album in scanned {
            if let Some(overrides) = metadata.album(&self.source, &album.source_path) {
                apply_album_overrides(&mut album, overrides);
            }
            if album.hidden {
                info!(album = %album.title, "album hidden, skipping");
                hidden_albums.push(album.title);
            } else {
                albums.push(album);
            }
        }

        let photo_count = albums.iter().map(|a| a.photos.len()).sum();
        info!(albums = albums.len(), photos = photo_count, "scan complete");
        self.emit(ProgressEvent::ScanCompleted {
            albums: albums.len(),
            photos: photo_count,
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.processing.workers)
            .build()?;
        let processor = MediaProcessor::from_config(self.backend, &self.output, &self.config);

        let mut cache_stats = CacheStats::default();
        let mut reports = Vec::with_capacity(albums.len());
        let mut finished = Vec::with_capacity(albums.len());
        for mut album in albums {
            if self.cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }
            let (report, stats) = self.process_album(&pool, &processor, &metadata, &mut album);
            if self.cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }
            cache_stats.merge(stats);
            reports.push(report);

            if album.photos.is_empty() {
                info!(album = %album.title, "no visible photos, dropping album");
                continue;
            }
            let cover = metadata
                .album(&self.source, &album.source_path)
                .map(|m| m.cover_photo.as_str());
            finish_album(&mut album, cover);
            finished.push(album);
        }
        sort_albums(&mut finished);

        let gallery = Gallery {
            title: metadata::resolve(&[
                Some(metadata.title.as_str()),
                Some(self.config.site.title.as_str()),
            ])
                .unwrap_or_default(),
            description: metadata.description.clone(),
            author: metadata.author.clone(),
            copyright: metadata.copyright.clone(),
            show_locations: metadata.show_locations,
            base_url: self.config.site.base_url.clone(),
            albums: finished,
        };

        self.emit(ProgressEvent::RenderingPages);
        renderer.render(&gallery, &self.output)?;
        self.emit(ProgressEvent::Completed);

        Ok(GenerateResult {
            gallery,
            reports,
            hidden_albums,
            cache_stats,
        })
    }

    /// Process every photo of one album on the pool, then drop the photos
    /// that are hidden, failed or skipped.
    fn process_album(
        &self,
        pool: &rayon::ThreadPool,
        processor: &MediaProcessor<'_, B>,
        metadata: &GalleryMetadata,
        album: &mut Album,
    ) -> (AlbumReport, CacheStats) {
        let total = album.photos.len();
        info!(album = %album.title, photos = total, "processing album");
        self.emit(ProgressEvent::AlbumStarted {
            name: album.title.clone(),
            photos: total,
        });

        let done = AtomicUsize::new(0);
        let photos = std::mem::take(&mut album.photos);
        let album_id = album.id.as_str();
        let album_title = album.title.as_str();
        let results: Vec<(Photo, PhotoOutcome, CacheStats)> = pool.install(|| {
            photos
                .into_par_iter()
                .map(|mut photo| {
                    let (outcome, stats) =
                        self.process_photo(processor, metadata, album_id, &mut photo);
                    let current = done.fetch_add(1, AtomicOrdering::SeqCst) + 1;
                    self.emit(ProgressEvent::PhotoProcessed {
                        album: album_title.to_string(),
                        current,
                        total,
                        filename: photo.filename.clone(),
                        outcome: outcome.clone(),
                    });
                    (photo, outcome, stats)
                })
                .collect()
        });

        let mut report = AlbumReport {
            id: album.id.clone(),
            title: album.title.clone(),
            processed: 0,
            hidden: 0,
            failures: Vec::new(),
        };
        let mut stats = CacheStats::default();
        let mut visible = Vec::with_capacity(results.len());
        for (photo, outcome, photo_stats) in results {
            stats.merge(photo_stats);
            match outcome {
                PhotoOutcome::Processed { .. } => {
                    report.processed += 1;
                    visible.push(photo);
                }
                PhotoOutcome::Hidden => report.hidden += 1,
                PhotoOutcome::Failed(reason) => report.failures.push(PhotoFailure {
                    filename: photo.filename,
                    reason,
                }),
                PhotoOutcome::Cancelled => {}
            }
        }
        album.photos = visible;

        if !report.failures.is_empty() {
            warn!(
                album = %album.title,
                failures = report.failures.len(),
                "album finished with failed photos"
            );
        }
        self.emit(ProgressEvent::AlbumFinished {
            name: album.title.clone(),
            failures: report.failures.len(),
        });
        (report, stats)
    }

    fn process_photo(
        &self,
        processor: &MediaProcessor<'_, B>,
        metadata: &GalleryMetadata,
        album_id: &str,
        photo: &mut Photo,
    ) -> (PhotoOutcome, CacheStats) {
        if let Some(overrides) = metadata.photo(&self.source, &photo.source_path) {
            apply_photo_overrides(photo, overrides);
        }
        if photo.hidden {
            debug!(photo = %photo.filename, "photo hidden, skipping");
            return (PhotoOutcome::Hidden, CacheStats::default());
        }
        if self.cancel.is_cancelled() {
            return (PhotoOutcome::Cancelled, CacheStats::default());
        }

        let mut stats = CacheStats::default();
        let result = if photo.is_video {
            self.process_video(processor, album_id, photo, &mut stats)
        } else {
            self.process_still(processor, album_id, photo)
        };
        match result {
            Ok(status) => {
                if status.is_cached() {
                    stats.hit();
                } else {
                    stats.miss();
                }
                (PhotoOutcome::Processed { status }, stats)
            }
            Err(e) => {
                warn!(photo = %photo.source_path.display(), error = %e, "photo failed");
                (PhotoOutcome::Failed(e.to_string()), stats)
            }
        }
    }

    fn process_still(
        &self,
        processor: &MediaProcessor<'_, B>,
        album_id: &str,
        photo: &mut Photo,
    ) -> Result<VariantStatus, ProcessError> {
        let processed = processor.process_image(&photo.source_path, album_id, &photo.id)?;
        photo.width = processed.width;
        photo.height = processed.height;
        photo.variants = processed.variants;

        match self.backend.read_capture(&photo.source_path) {
            Ok(capture) => photo.capture = capture,
            Err(e) => debug!(photo = %photo.filename, error = %e, "no capture metadata"),
        }
        Ok(processed.status)
    }

    fn process_video(
        &self,
        processor: &MediaProcessor<'_, B>,
        album_id: &str,
        photo: &mut Photo,
        stats: &mut CacheStats,
    ) -> Result<VariantStatus, ProcessError> {
        match self.backend.probe_video(&photo.source_path) {
            Ok(dims) => {
                photo.width = dims.width;
                photo.height = dims.height;
            }
            Err(e) => warn!(video = %photo.filename, error = %e, "cannot read video dimensions"),
        }

        let poster = processor.extract_thumbnail(&photo.source_path, album_id, &photo.id)?;
        photo.variants.insert(POSTER.to_string(), poster.path);

        let copy = processor.copy_video_to_static(&photo.source_path, album_id, &photo.id)?;
        if copy.status == VariantStatus::Copied {
            stats.copy();
        }
        photo.video_path = Some(copy.path);
        Ok(poster.status)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(tracker) = &self.tracker {
            tracker.apply(&event);
        }
        if let Some(tx) = &self.events {
            // A receiver that hung up only loses the narration
            let _ = tx.send(event);
        }
    }
}

// ============================================================================
// Overrides
// ============================================================================

fn apply_album_overrides(album: &mut Album, overrides: &AlbumMetadata) {
    if let Some(title) = metadata::resolve(&[Some(overrides.title.as_str())]) {
        album.title = title;
    }
    if let Some(description) = metadata::resolve(&[Some(overrides.description.as_str())]) {
        album.description = Some(description);
    }
    album.hidden = overrides.hidden;
    album.date = parse_album_date(&overrides.date);
    album.sort_order = overrides.sort_order;
    album.custom_order = overrides.custom_order.clone();
    album.tags = overrides.tags.clone();
}

fn apply_photo_overrides(photo: &mut Photo, overrides: &PhotoMetadata) {
    if let Some(title) = metadata::resolve(&[Some(overrides.title.as_str())]) {
        photo.title = title;
    }
    if let Some(description) = metadata::resolve(&[Some(overrides.description.as_str())]) {
        photo.description = Some(description);
    }
    photo.hidden = overrides.hidden;
    photo.tags = overrides.tags.clone();
    photo.sort_index = overrides.sort_index;
}

/// `2024-05-01` or an RFC 3339 timestamp. Anything else is ignored.
pub fn parse_album_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

/// Sort, pick the cover and record the newest capture.
fn finish_album(album: &mut Album, cover_filename: Option<&str>) {
    sort_photos(&mut album.photos, album.sort_order, &album.custom_order);
    album.cover = cover_filename
        .filter(|f| !f.is_empty())
        .and_then(|f| album.photos.iter().find(|p| p.filename == f))
        .or_else(|| album.photos.first())
        .map(|p| p.id.clone());
    album.created_at = album.newest_capture();
}

// ============================================================================
// Sorting
// ============================================================================

/// Oldest capture first, undated last, ties by filename.
fn by_date(a: &Photo, b: &Photo) -> Ordering {
    let dated = match (a.taken_at(), b.taken_at()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    dated.then_with(|| a.filename.cmp(&b.filename))
}

pub fn sort_photos(photos: &mut [Photo], order: SortOrder, custom_order: &[String]) {
    match order {
        SortOrder::Date => photos.sort_by(by_date),
        SortOrder::Name => photos.sort_by(|a, b| a.filename.cmp(&b.filename)),
        SortOrder::Custom => {
            let rank = |p: &Photo| -> (u8, i64) {
                if let Some(pos) = custom_order.iter().position(|f| *f == p.filename) {
                    (0, pos as i64)
                } else if let Some(index) = p.sort_index {
                    (1, index)
                } else {
                    (2, 0)
                }
            };
            photos.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| by_date(a, b)));
        }
    }
}

/// Newest album first by `created_at`; undated albums lead, ties by ID.
pub fn sort_albums(albums: &mut [Album]) {
    albums.sort_by(|a, b| {
        let dated = match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        dated.then_with(|| a.id.cmp(&b.id))
    });
}
