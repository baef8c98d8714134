// Host-facing controller owning the tool paths and staged temp files

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::job::TranscodeJob;
use crate::probe::{self, MediaInfo, ProbeError};
use crate::time::TimeValue;

/// The entry point a host application owns for the lifetime of the process:
/// construct one at startup, hand it out by reference, call [`cleanup`] at
/// shutdown. Replaces any notion of a global shared controller.
///
/// [`cleanup`]: Controller::cleanup
pub struct Controller {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    staged: Vec<PathBuf>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Resolve `ffmpeg`/`ffprobe` by name through PATH.
    pub fn new() -> Self {
        Self::with_programs("ffmpeg", "ffprobe")
    }

    /// Use explicit executable paths, e.g. bundled or staged copies.
    pub fn with_programs(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            staged: Vec::new(),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    /// Fail fast on a misconfigured environment: runs both tools with
    /// `-version` and returns their banner lines.
    pub fn verify_tools(&self) -> Result<(String, String)> {
        let ffmpeg = probe::ffmpeg_version(&self.ffmpeg)?;
        let ffprobe = probe::ffprobe_version(&self.ffprobe)?;
        info!(%ffmpeg, %ffprobe, "encoder tools verified");
        Ok((ffmpeg, ffprobe))
    }

    /// Probe a source file's duration. Blocking; see [`probe::probe_duration`].
    pub fn duration(&self, input: &Path) -> Result<TimeValue, ProbeError> {
        probe::probe_duration(&self.ffprobe, input)
    }

    /// Probe dimensions, framerate and duration of the first video stream.
    pub fn media_info(&self, input: &Path) -> Result<MediaInfo> {
        probe::probe_media_info(&self.ffprobe, input)
    }

    /// A fresh job bound to this controller's ffmpeg executable.
    pub fn new_job(&self) -> TranscodeJob {
        TranscodeJob::new(&self.ffmpeg)
    }

    /// Record a temporary file (e.g. a staged executable copy) to be removed
    /// by [`cleanup`](Controller::cleanup).
    pub fn register_staged(&mut self, path: impl Into<PathBuf>) {
        self.staged.push(path.into());
    }

    /// Best-effort removal of all staged files.
    ///
    /// Individual failures (already gone, permissions) are logged and
    /// swallowed; the loop never aborts early. Idempotent: the staged list is
    /// drained, so a second call does nothing.
    pub fn cleanup(&mut self) {
        for path in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                debug!(file = %path.display(), error = %e, "staged file not removed");
            }
        }
    }
}
