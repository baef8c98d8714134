//! Embeddable FFmpeg transcode-job controller.
//!
//! This crate is the process-driving core of a transcoding front-end: it
//! probes source duration with ffprobe, builds and launches ffmpeg from a
//! codec preset plus an optional time slice, streams the encoder's stderr to
//! a line callback while the job runs, and supports mid-flight cancellation.
//! It has no UI and no CLI; a host application owns a [`Controller`] and
//! receives asynchronous notifications through the two callbacks it passes to
//! [`TranscodeJob::start`].
//!
//! Logging goes through `tracing`; the host owns subscriber setup.

pub mod controller;
pub mod job;
pub mod preset;
pub mod probe;
pub mod time;

pub use controller::Controller;
pub use job::{JobError, JobOutcome, JobState, Slice, TranscodeJob, build_transcode_cmd};
pub use preset::{CodecPreset, load_catalog};
pub use probe::{MediaInfo, ProbeError, probe_duration, probe_media_info};
pub use time::TimeValue;
