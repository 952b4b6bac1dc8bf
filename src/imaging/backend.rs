//! Media backend trait and shared types.
//!
//! The [`MediaBackend`] trait covers every operation that touches pixels,
//! EXIF blocks or external programs: identify, read_capture, orientation,
//! resize, probe_video and extract_frame.
//!
//! The production implementation is
//! [`NativeBackend`](super::native_backend::NativeBackend): the `image` crate
//! for stills, `kamadak-exif` for metadata, and `ffmpeg`/`ffprobe` for video.

use super::orientation::Orientation;
use super::params::{FrameParams, ResizeParams};
use crate::types::CaptureData;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("{0} not found; install it to process videos")]
    ToolMissing(String),
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },
}

/// Result of an identify or probe operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for media processing backends.
///
/// Implementations must be `Sync`: one backend instance is shared by every
/// worker in an album's pool.
pub trait MediaBackend: Sync {
    /// Stored pixel dimensions of an image, read from its header.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// EXIF capture data. `Ok(None)` when the file carries none.
    fn read_capture(&self, path: &Path) -> Result<Option<CaptureData>, BackendError>;

    /// Orientation code only. Never fails; unknown means `Normal`.
    fn orientation(&self, path: &Path) -> Orientation;

    /// Decode once, apply orientation, write every target.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Dimensions of a video's first stream.
    fn probe_video(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Extract a single frame as JPEG.
    fn extract_frame(&self, params: &FrameParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock backend that records operations and writes placeholder files.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// Lookups are keyed by filename (`a.jpg`), not full path.
    pub struct MockBackend {
        pub dimensions: Mutex<HashMap<String, Dimensions>>,
        pub captures: Mutex<HashMap<String, CaptureData>>,
        pub failing: Mutex<HashSet<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Pretend ffmpeg/ffprobe are not installed.
        pub video_tools_missing: bool,
        /// Frame offsets (seconds) at which extraction fails.
        pub failing_frame_offsets: Vec<f64>,
        /// Frame offsets at which extraction "succeeds" without writing a file.
        pub empty_frame_offsets: Vec<f64>,
        /// Time spent inside resize/extract_frame, to make overlap observable.
        pub work_delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        ReadCapture(String),
        Resize { source: String, outputs: Vec<String> },
        ProbeVideo(String),
        ExtractFrame { video: String, at_seconds: f64 },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                dimensions: Mutex::new(HashMap::new()),
                captures: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                operations: Mutex::new(Vec::new()),
                video_tools_missing: false,
                failing_frame_offsets: Vec::new(),
                empty_frame_offsets: Vec::new(),
                work_delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    fn key(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(self, filename: &str, width: u32, height: u32) -> Self {
            self.dimensions
                .lock()
                .unwrap()
                .insert(filename.to_string(), Dimensions { width, height });
            self
        }

        pub fn with_capture(self, filename: &str, capture: CaptureData) -> Self {
            self.captures
                .lock()
                .unwrap()
                .insert(filename.to_string(), capture);
            self
        }

        pub fn failing_on(self, filename: &str) -> Self {
            self.failing.lock().unwrap().insert(filename.to_string());
            self
        }

        pub fn without_video_tools(mut self) -> Self {
            self.video_tools_missing = true;
            self
        }

        pub fn failing_frames_at(mut self, at_seconds: f64) -> Self {
            self.failing_frame_offsets.push(at_seconds);
            self
        }

        pub fn empty_frames_at(mut self, at_seconds: f64) -> Self {
            self.empty_frame_offsets.push(at_seconds);
            self
        }

        pub fn with_work_delay(mut self, delay: Duration) -> Self {
            self.work_delay = delay;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn clear_operations(&self) {
            self.operations.lock().unwrap().clear();
        }

        /// Filenames of every source decoded by `resize`, in call order.
        pub fn resized_sources(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Resize { source, .. } => Some(source),
                    _ => None,
                })
                .collect()
        }

        pub fn resize_count(&self) -> usize {
            self.resized_sources().len()
        }

        pub fn frame_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::ExtractFrame { .. }))
                .count()
        }

        /// Count of operations that touched `filename` in any way.
        pub fn touches(&self, filename: &str) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| match op {
                    RecordedOp::Identify(s)
                    | RecordedOp::ReadCapture(s)
                    | RecordedOp::ProbeVideo(s) => s == filename,
                    RecordedOp::Resize { source, .. } => source == filename,
                    RecordedOp::ExtractFrame { video, .. } => video == filename,
                })
                .count()
        }

        /// Highest number of resize/extract calls observed running at once.
        pub fn max_concurrency(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn fails(&self, path: &Path) -> bool {
            self.failing.lock().unwrap().contains(&key(path))
        }

        fn busy<T>(&self, work: impl FnOnce() -> T) -> T {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.work_delay.is_zero() {
                std::thread::sleep(self.work_delay);
            }
            let result = work();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    impl MediaBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.record(RecordedOp::Identify(key(path)));
            if self.fails(path) {
                return Err(BackendError::ProcessingFailed(format!(
                    "cannot decode {}",
                    path.display()
                )));
            }
            Ok(self
                .dimensions
                .lock()
                .unwrap()
                .get(&key(path))
                .copied()
                .unwrap_or(Dimensions {
                    width: 3000,
                    height: 2000,
                }))
        }

        fn read_capture(&self, path: &Path) -> Result<Option<CaptureData>, BackendError> {
            self.record(RecordedOp::ReadCapture(key(path)));
            Ok(self.captures.lock().unwrap().get(&key(path)).cloned())
        }

        fn orientation(&self, path: &Path) -> Orientation {
            self.captures
                .lock()
                .unwrap()
                .get(&key(path))
                .map(|c| Orientation::from_exif(c.orientation as u32))
                .unwrap_or_default()
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Resize {
                source: key(&params.source),
                outputs: params.targets.iter().map(|t| key(&t.output)).collect(),
            });
            if self.fails(&params.source) {
                return Err(BackendError::ProcessingFailed("mock decode failure".into()));
            }
            self.busy(|| -> Result<(), BackendError> {
                for target in &params.targets {
                    std::fs::write(
                        &target.output,
                        format!("{}x{}", target.width, target.height),
                    )?;
                }
                Ok(())
            })
        }

        fn probe_video(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.record(RecordedOp::ProbeVideo(key(path)));
            if self.video_tools_missing {
                return Err(BackendError::ToolMissing("ffprobe".into()));
            }
            Ok(self
                .dimensions
                .lock()
                .unwrap()
                .get(&key(path))
                .copied()
                .unwrap_or(Dimensions {
                    width: 1920,
                    height: 1080,
                }))
        }

        fn extract_frame(&self, params: &FrameParams) -> Result<(), BackendError> {
            self.record(RecordedOp::ExtractFrame {
                video: key(&params.video),
                at_seconds: params.at_seconds,
            });
            if self.video_tools_missing {
                return Err(BackendError::ToolMissing("ffmpeg".into()));
            }
            if self.fails(&params.video)
                || self.failing_frame_offsets.contains(&params.at_seconds)
            {
                return Err(BackendError::ToolFailed {
                    tool: "ffmpeg".into(),
                    message: format!("no frame at {}s", params.at_seconds),
                });
            }
            if self.empty_frame_offsets.contains(&params.at_seconds) {
                return Ok(());
            }
            self.busy(|| -> Result<(), BackendError> {
                std::fs::write(&params.output, b"poster")?;
                Ok(())
            })
        }
    }

    #[test]
    fn mock_identify_defaults_and_overrides() {
        let backend = MockBackend::new().with_dimensions("small.jpg", 300, 200);

        let dims = backend.identify(Path::new("/a/small.jpg")).unwrap();
        assert_eq!((dims.width, dims.height), (300, 200));
        let dims = backend.identify(Path::new("/a/other.jpg")).unwrap();
        assert_eq!((dims.width, dims.height), (3000, 2000));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "small.jpg"));
    }

    #[test]
    fn mock_resize_writes_outputs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let output = tmp.path().join("a_small.jpg");

        backend
            .resize(&ResizeParams {
                source: "/src/a.jpg".into(),
                orientation: Orientation::Normal,
                quality: super::super::params::Quality::new(90),
                targets: vec![super::super::params::ResizeTarget {
                    output: output.clone(),
                    width: 400,
                    height: 267,
                }],
            })
            .unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "400x267");
        assert_eq!(backend.resized_sources(), vec!["a.jpg"]);
        assert_eq!(backend.max_concurrency(), 1);
    }

    #[test]
    fn mock_failing_source() {
        let backend = MockBackend::new().failing_on("bad.jpg");
        assert!(backend.identify(Path::new("/a/bad.jpg")).is_err());
        assert!(backend.identify(Path::new("/a/good.jpg")).is_ok());
    }

    #[test]
    fn mock_missing_video_tools() {
        let backend = MockBackend::new().without_video_tools();
        assert!(matches!(
            backend.probe_video(Path::new("/a/clip.mov")),
            Err(BackendError::ToolMissing(_))
        ));
    }
}
