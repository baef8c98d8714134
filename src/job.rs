// Encoder process lifecycle: spawn, drain, cancel

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::preset::CodecPreset;
use crate::time::TimeValue;

/// Optional sub-range of the source to transcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<TimeValue>,
    pub duration: Option<TimeValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Finished,
    Cancelled,
}

/// How a run ended. Delivered to the finish callback; the callback itself
/// fires unconditionally, so consumers that only care about "the job is over"
/// can ignore the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// Encoder exited non-zero; carries the exit code when the OS reported one.
    Failed(Option<i32>),
    Cancelled,
}

#[derive(Debug, Error)]
pub enum JobError {
    /// `start` was called on a job that is running or already ran. Terminal
    /// states are not reused; build a fresh job for another run.
    #[error("job already started (state: {0:?})")]
    NotIdle(JobState),

    #[error("failed to launch ffmpeg: {0}")]
    Launch(#[from] std::io::Error),

    #[error("failed to capture encoder stderr")]
    StderrCapture,
}

/// Build the encoder invocation: `[-ss <start>] -y -i <input> [-t <duration>]
/// <preset args...> <output>`.
///
/// `-y` (overwrite without prompting) is always present, directly after any
/// leading `-ss`. Slice values are rendered as plain decimal seconds.
pub fn build_transcode_cmd(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    preset: &CodecPreset,
    slice: Slice,
) -> Command {
    let mut cmd = Command::new(ffmpeg);

    if let Some(start) = slice.start {
        cmd.arg("-ss").arg(start.as_ffmpeg_arg());
    }

    cmd.arg("-y").arg("-i").arg(input);

    if let Some(duration) = slice.duration {
        cmd.arg("-t").arg(duration.as_ffmpeg_arg());
    }

    for arg in preset.args() {
        cmd.arg(arg);
    }

    cmd.arg(output);
    cmd
}

fn format_cmd(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().to_string()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().to_string()));
    parts.join(" ")
}

/// A single transcode run.
///
/// `Idle → Running → {Finished, Cancelled}`; one child process and one drain
/// thread at most. The drain thread forwards every encoder stderr line to the
/// line callback in arrival order, reaps the child, and then invokes the
/// finish callback exactly once, so every line delivery happens-before the
/// finish signal. Both callbacks run on the drain thread, never the caller's.
pub struct TranscodeJob {
    id: Uuid,
    ffmpeg: PathBuf,
    state: Arc<Mutex<JobState>>,
    // PID of the live child; cleared on exit and by the first cancel()
    pid: Arc<Mutex<Option<u32>>>,
    cancelled: Arc<AtomicBool>,
    drain: Option<JoinHandle<()>>,
}

impl TranscodeJob {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ffmpeg: ffmpeg.into(),
            state: Arc::new(Mutex::new(JobState::Idle)),
            pid: Arc::new(Mutex::new(None)),
            cancelled: Arc::new(AtomicBool::new(false)),
            drain: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.state() == JobState::Running
    }

    /// Spawn the encoder and return immediately.
    ///
    /// `on_line` receives each stderr line as it arrives; `on_finish` fires
    /// exactly once after the stream closes and the child is reaped, whether
    /// the encoder exited cleanly, failed, or was cancelled.
    pub fn start<L, F>(
        &mut self,
        input: &Path,
        output: &Path,
        preset: &CodecPreset,
        slice: Slice,
        mut on_line: L,
        on_finish: F,
    ) -> Result<(), JobError>
    where
        L: FnMut(&str) + Send + 'static,
        F: FnOnce(JobOutcome) + Send + 'static,
    {
        let mut state = self.state.lock().unwrap();
        if *state != JobState::Idle {
            return Err(JobError::NotIdle(*state));
        }

        let mut cmd = build_transcode_cmd(&self.ffmpeg, input, output, preset, slice);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        debug!(job = %self.id, command = %format_cmd(&cmd), "spawning encoder");

        let mut child = cmd.spawn()?;
        let stderr = child.stderr.take().ok_or(JobError::StderrCapture)?;

        *self.pid.lock().unwrap() = Some(child.id());
        *state = JobState::Running;
        drop(state);

        let job_id = self.id;
        let job_state = Arc::clone(&self.state);
        let pid_slot = Arc::clone(&self.pid);
        let cancelled = Arc::clone(&self.cancelled);

        self.drain = Some(thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                on_line(&line);
            }

            // Stream closed: the child has exited or is exiting, reap it
            let status = child.wait();
            *pid_slot.lock().unwrap() = None;

            let outcome = if cancelled.load(Ordering::SeqCst) {
                JobOutcome::Cancelled
            } else {
                match status {
                    Ok(s) if s.success() => JobOutcome::Completed,
                    Ok(s) => JobOutcome::Failed(s.code()),
                    Err(e) => {
                        warn!(job = %job_id, error = %e, "failed to reap encoder");
                        JobOutcome::Failed(None)
                    }
                }
            };

            *job_state.lock().unwrap() = match outcome {
                JobOutcome::Cancelled => JobState::Cancelled,
                _ => JobState::Finished,
            };

            debug!(job = %job_id, ?outcome, "encoder finished");
            on_finish(outcome);
        }));

        Ok(())
    }

    /// Request graceful termination of the running encoder.
    ///
    /// Sends a termination signal and clears the stored PID, so repeated
    /// calls (and calls on a job that never ran) are no-ops. The finish
    /// callback is not invoked from here: the drain thread observes the
    /// stream closing and drives the normal finish path. Safe to call from
    /// any thread.
    pub fn cancel(&self) {
        let pid = self.pid.lock().unwrap().take();
        if let Some(pid) = pid {
            self.cancelled.store(true, Ordering::SeqCst);
            debug!(job = %self.id, pid, "requesting encoder termination");
            terminate(pid);
        }
    }

    /// Block until the drain thread has delivered the finish signal.
    pub fn join(&mut self) {
        if let Some(handle) = self.drain.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(unix)]
fn terminate(pid: u32) {
    // SIGTERM, which ffmpeg catches and exits on after closing its outputs
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T"])
        .status();
}
