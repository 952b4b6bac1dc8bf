//! Typed progress events and the pollable progress tracker.
//!
//! The generator narrates a run as a closed set of [`ProgressEvent`]s. Two
//! consumers exist:
//!
//! - The CLI formats each event as it arrives on an `mpsc` channel (see
//!   [`output::format_event`](crate::output::format_event)).
//! - A long-lived server holds an `Arc<ProgressTracker>` and polls
//!   [`ProgressTracker::get`] for `{percent, status, error}`.
//!
//! Percentages are derived from events, never from message text:
//!
//! ```text
//! ScanStarted        1
//! ScanCompleted      3
//! PhotoProcessed     5 + 85 × done / total   (at most 90)
//! RenderingPages    92
//! Completed        100
//! ```
//!
//! Within one run the reported percentage never decreases, even though
//! photos finish out of order across pool workers.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::process::VariantStatus;

/// What happened to one photo.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOutcome {
    Processed { status: VariantStatus },
    /// Hidden by metadata; no media work was done.
    Hidden,
    Failed(String),
    /// Skipped because the run was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ScanStarted,
    ScanCompleted {
        albums: usize,
        photos: usize,
    },
    AlbumStarted {
        name: String,
        photos: usize,
    },
    PhotoProcessed {
        album: String,
        current: usize,
        total: usize,
        filename: String,
        outcome: PhotoOutcome,
    },
    AlbumFinished {
        name: String,
        failures: usize,
    },
    RenderingPages,
    Completed,
    Failed {
        reason: String,
    },
}

impl ProgressEvent {
    /// One-line human description.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::ScanStarted => "Scanning for albums...".to_string(),
            ProgressEvent::ScanCompleted { albums, photos } => {
                format!("Found {albums} albums with {photos} photos")
            }
            ProgressEvent::AlbumStarted { name, photos } => {
                format!("Processing album: {name} ({photos} photos)")
            }
            ProgressEvent::PhotoProcessed {
                album,
                current,
                total,
                ..
            } => format!("Processing {album}: {current}/{total}"),
            ProgressEvent::AlbumFinished { name, failures: 0 } => format!("Finished {name}"),
            ProgressEvent::AlbumFinished { name, failures } => {
                format!("Finished {name} with {failures} failed photos")
            }
            ProgressEvent::RenderingPages => "Generating pages...".to_string(),
            ProgressEvent::Completed => "Gallery generated".to_string(),
            ProgressEvent::Failed { reason } => format!("Generation failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

/// A point-in-time copy of the tracker state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub percent: u8,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Default)]
struct TrackerState {
    snapshot: ProgressSnapshot,
    photos_total: usize,
    photos_done: usize,
}

/// Thread-safe holder of the current job's progress.
///
/// One job at a time. Writers hold the lock only to copy a few fields, so
/// pollers never wait long.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: RwLock<TrackerState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to idle: 0%, no error, no message.
    pub fn reset(&self) {
        *self.write() = TrackerState::default();
    }

    /// Set percent (clamped to 100) and status directly.
    pub fn update(&self, percent: u8, status: JobStatus) {
        let mut state = self.write();
        state.snapshot.percent = percent.min(100);
        state.snapshot.status = status;
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let mut state = self.write();
        state.snapshot.status = JobStatus::Error;
        state.snapshot.error = Some(message.into());
    }

    pub fn get(&self) -> ProgressSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Fold one generator event into the state.
    pub fn apply(&self, event: &ProgressEvent) {
        let mut state = self.write();
        let percent = match event {
            ProgressEvent::ScanStarted => {
                *state = TrackerState::default();
                state.snapshot.status = JobStatus::Running;
                Some(1)
            }
            ProgressEvent::ScanCompleted { photos, .. } => {
                state.photos_total = *photos;
                Some(3)
            }
            ProgressEvent::PhotoProcessed { .. } => {
                state.photos_done += 1;
                Some(photo_percent(state.photos_done, state.photos_total))
            }
            ProgressEvent::RenderingPages => Some(92),
            ProgressEvent::Completed => {
                state.snapshot.status = JobStatus::Completed;
                Some(100)
            }
            ProgressEvent::Failed { reason } => {
                state.snapshot.status = JobStatus::Error;
                state.snapshot.error = Some(reason.clone());
                None
            }
            ProgressEvent::AlbumStarted { .. } | ProgressEvent::AlbumFinished { .. } => None,
        };
        if let Some(p) = percent {
            state.snapshot.percent = state.snapshot.percent.max(p);
        }
        state.snapshot.message = event.message();
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Photo-phase percentage: 5 at the start, 90 when every photo is done.
fn photo_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 90;
    }
    let scaled = 5 + 85 * done.min(total) / total;
    scaled.min(90) as u8
}

/// Cooperative cancellation flag shared between a caller and a running
/// generator. Checked before each photo is started.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(current: usize, total: usize) -> ProgressEvent {
        ProgressEvent::PhotoProcessed {
            album: "Trip".into(),
            current,
            total,
            filename: format!("{current}.jpg"),
            outcome: PhotoOutcome::Processed {
                status: VariantStatus::Encoded,
            },
        }
    }

    #[test]
    fn new_tracker_is_idle() {
        let tracker = ProgressTracker::new();
        assert_eq!(
            tracker.get(),
            ProgressSnapshot {
                percent: 0,
                status: JobStatus::Idle,
                error: None,
                message: String::new(),
            }
        );
    }

    #[test]
    fn update_and_set_error() {
        let tracker = ProgressTracker::new();
        tracker.update(40, JobStatus::Running);
        assert_eq!(tracker.get().percent, 40);

        tracker.set_error("disk full");
        let snap = tracker.get();
        assert_eq!(snap.status, JobStatus::Error);
        assert_eq!(snap.error.as_deref(), Some("disk full"));
        assert_eq!(snap.percent, 40);
    }

    #[test]
    fn update_clamps_to_100() {
        let tracker = ProgressTracker::new();
        tracker.update(250, JobStatus::Running);
        assert_eq!(tracker.get().percent, 100);
    }

    #[test]
    fn reset_clears_everything() {
        let tracker = ProgressTracker::new();
        tracker.update(50, JobStatus::Running);
        tracker.set_error("boom");
        tracker.reset();
        assert_eq!(tracker.get(), ProgressSnapshot::default());
    }

    #[test]
    fn full_run_percentages() {
        let tracker = ProgressTracker::new();
        let mut seen = Vec::new();
        let mut record = |e: ProgressEvent| {
            tracker.apply(&e);
            seen.push(tracker.get().percent);
        };

        record(ProgressEvent::ScanStarted);
        record(ProgressEvent::ScanCompleted {
            albums: 1,
            photos: 4,
        });
        record(ProgressEvent::AlbumStarted {
            name: "Trip".into(),
            photos: 4,
        });
        for i in 1..=4 {
            record(photo(i, 4));
        }
        record(ProgressEvent::AlbumFinished {
            name: "Trip".into(),
            failures: 0,
        });
        record(ProgressEvent::RenderingPages);
        record(ProgressEvent::Completed);

        assert_eq!(seen, vec![1, 3, 3, 26, 47, 68, 90, 90, 92, 100]);
        assert_eq!(tracker.get().status, JobStatus::Completed);
    }

    #[test]
    fn percent_never_decreases() {
        let tracker = ProgressTracker::new();
        tracker.apply(&ProgressEvent::ScanStarted);
        tracker.apply(&ProgressEvent::ScanCompleted {
            albums: 1,
            photos: 2,
        });
        tracker.apply(&ProgressEvent::RenderingPages);
        // A late photo event must not pull the bar back
        tracker.apply(&photo(2, 2));
        assert_eq!(tracker.get().percent, 92);
    }

    #[test]
    fn failure_keeps_percent_and_records_reason() {
        let tracker = ProgressTracker::new();
        tracker.apply(&ProgressEvent::ScanStarted);
        tracker.apply(&ProgressEvent::Failed {
            reason: "no albums found".into(),
        });
        let snap = tracker.get();
        assert_eq!(snap.status, JobStatus::Error);
        assert_eq!(snap.percent, 1);
        assert_eq!(snap.error.as_deref(), Some("no albums found"));
    }

    #[test]
    fn scan_started_begins_a_fresh_run() {
        let tracker = ProgressTracker::new();
        tracker.apply(&ProgressEvent::ScanStarted);
        tracker.apply(&ProgressEvent::Completed);
        tracker.apply(&ProgressEvent::ScanStarted);
        let snap = tracker.get();
        assert_eq!(snap.percent, 1);
        assert_eq!(snap.status, JobStatus::Running);
    }

    #[test]
    fn photo_percent_bounds() {
        assert_eq!(photo_percent(0, 10), 5);
        assert_eq!(photo_percent(10, 10), 90);
        assert_eq!(photo_percent(20, 10), 90);
        assert_eq!(photo_percent(0, 0), 90);
    }

    #[test]
    fn messages() {
        assert_eq!(
            ProgressEvent::ScanCompleted {
                albums: 2,
                photos: 7
            }
            .message(),
            "Found 2 albums with 7 photos"
        );
        assert_eq!(photo(3, 9).message(), "Processing Trip: 3/9");
        assert_eq!(
            ProgressEvent::AlbumFinished {
                name: "Trip".into(),
                failures: 2
            }
            .message(),
            "Finished Trip with 2 failed photos"
        );
    }

    #[test]
    fn snapshot_serializes_for_polling() {
        let tracker = ProgressTracker::new();
        tracker.update(42, JobStatus::Running);
        let json = serde_json::to_value(tracker.get()).unwrap();
        assert_eq!(json["percent"], 42);
        assert_eq!(json["status"], "running");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
