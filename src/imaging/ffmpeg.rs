//! External video tools: `ffprobe` for dimensions, `ffmpeg` for poster frames.
//!
//! Both are runtime requirements for video-bearing albums only. A missing
//! program surfaces as [`BackendError::ToolMissing`] so callers can tell
//! "not installed" apart from "the tool ran and failed".

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

use super::backend::{BackendError, Dimensions};
use super::params::FrameParams;

/// Program names (or full paths) for the two tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTools {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for VideoTools {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl VideoTools {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Width and height of the first video stream.
    pub fn get_video_dimensions(&self, video: &Path) -> Result<Dimensions, BackendError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(video);

        let output = run(&self.ffprobe, &mut cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_dimensions(&stdout).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "unexpected ffprobe output for {}: {:?}",
                video.display(),
                stdout.trim()
            ))
        })
    }

    /// Write one frame from `params.at_seconds` into `params.output` as JPEG.
    pub fn extract_frame(&self, params: &FrameParams) -> Result<(), BackendError> {
        // The existence check below only means something on a clean slate
        match std::fs::remove_file(&params.output) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-i")
            .arg(&params.video)
            .arg("-ss")
            .arg(format_timestamp(params.at_seconds))
            .args(["-vframes", "1", "-q:v", "2", "-y"])
            .args(["-loglevel", "error"])
            .arg(&params.output);

        run(&self.ffmpeg, &mut cmd)?;
        // ffmpeg exits 0 without writing anything when seeking past the end
        if !params.output.exists() {
            return Err(BackendError::ToolFailed {
                tool: self.ffmpeg.clone(),
                message: format!("no frame at {}s", params.at_seconds),
            });
        }
        Ok(())
    }
}

fn run(tool: &str, cmd: &mut Command) -> Result<Output, BackendError> {
    debug!(?cmd, "running external tool");
    let output = cmd.output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            BackendError::ToolMissing(tool.to_string())
        } else {
            BackendError::Io(e)
        }
    })?;
    if !output.status.success() {
        return Err(BackendError::ToolFailed {
            tool: tool.to_string(),
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(output)
}

/// Parse ffprobe's `WIDTHxHEIGHT` output. Only the first line counts.
pub fn parse_dimensions(output: &str) -> Option<Dimensions> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (w, h) = line.split_once('x')?;
    let width = w.trim().parse().ok()?;
    let height = h.trim().trim_end_matches('x').parse().ok()?;
    (width > 0 && height > 0).then_some(Dimensions { width, height })
}

/// `HH:MM:SS` with milliseconds only when needed: `1.0` → `00:00:01`.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (secs, ms) = (total_ms / 1000, total_ms % 1000);
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if ms == 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}.{ms:03}")
    }
}
