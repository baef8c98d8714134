// Source inspection via ffprobe

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::time::TimeValue;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probing executable could not be launched at all. This is an
    /// environment problem (missing or non-executable ffprobe), not a bad
    /// input file, and callers may want to abort loudly on it.
    #[error("failed to launch ffprobe: {0}")]
    Launch(#[from] io::Error),

    /// ffprobe ran but exited non-zero.
    #[error("ffprobe exited with status {0}")]
    ProcessFailed(i32),

    /// ffprobe exited cleanly but reported no parseable duration, which is
    /// how a non-media file presents.
    #[error("no duration in ffprobe output; not a valid media file")]
    InvalidMedia,
}

/// Probe a source file's container-level duration.
///
/// Blocks until ffprobe exits; a single attempt, no retries. Callers on an
/// interactive thread should move this off it. ffprobe's stderr is never
/// treated as a failure signal, only logged.
pub fn probe_duration(ffprobe: &Path, input: &Path) -> Result<TimeValue, ProbeError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()?;

    if !output.stderr.is_empty() {
        debug!(
            file = %input.display(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
            "ffprobe diagnostics"
        );
    }

    if !output.status.success() {
        return Err(ProbeError::ProcessFailed(output.status.code().unwrap_or(-1)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seconds: f64 = stdout.trim().parse().map_err(|_| ProbeError::InvalidMedia)?;

    Ok(TimeValue::from_seconds(seconds))
}

/// Container/stream metadata beyond the bare duration.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: Option<TimeValue>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: FfprobeFormat,
}

/// Probe the first video stream's dimensions and framerate along with the
/// container duration.
pub fn probe_media_info(ffprobe: &Path, input: &Path) -> Result<MediaInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(input)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            input.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_media_info(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `probe_media_info` JSON (split out for testing).
pub fn parse_media_info(json: &str) -> Result<MediaInfo> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;

    let stream = probe.streams.first().context("No video stream found")?;

    let width = stream.width.context("Failed to get video width")?;
    let height = stream.height.context("Failed to get video height")?;

    let fps_str = stream
        .r_frame_rate
        .as_deref()
        .or(stream.avg_frame_rate.as_deref())
        .context("Failed to get video framerate")?;
    let fps = parse_fraction(fps_str)
        .with_context(|| format!("Failed to parse framerate: {}", fps_str))?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .map(TimeValue::from_seconds);

    Ok(MediaInfo {
        width,
        height,
        fps,
        duration,
    })
}

/// Parse a fraction string like "30000/1001" to f64
fn parse_fraction(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let numerator: f64 = num.parse().ok()?;
    let denominator: f64 = den.parse().ok()?;

    if denominator == 0.0 {
        return None;
    }

    Some(numerator / denominator)
}

fn version_line(program: &Path) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .with_context(|| {
            format!(
                "Failed to execute {}. Is it installed and in PATH?",
                program.display()
            )
        })?;

    if !output.status.success() {
        anyhow::bail!(
            "{} -version failed with status: {}",
            program.display(),
            output.status
        );
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check that ffmpeg is runnable and return its version banner line.
pub fn ffmpeg_version(ffmpeg: &Path) -> Result<String> {
    version_line(ffmpeg)
}

/// Check that ffprobe is runnable and return its version banner line.
pub fn ffprobe_version(ffprobe: &Path) -> Result<String> {
    version_line(ffprobe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_fraction("30/1"), Some(30.0));
        assert_eq!(parse_fraction("60/1"), Some(60.0));

        let ntsc = parse_fraction("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01, "Expected ~29.97, got {}", ntsc);

        assert_eq!(parse_fraction("invalid"), None);
        assert_eq!(parse_fraction("30/0"), None);
    }

    #[test]
    fn test_parse_media_info() {
        let json = r#"{
            "streams": [
                {"width": 1920, "height": 1080, "r_frame_rate": "24000/1001"}
            ],
            "format": {"duration": "123.456"}
        }"#;

        let info = parse_media_info(json).expect("Failed to parse media info");
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.fps - 23.976).abs() < 0.001);
        assert_eq!(info.duration, Some(TimeValue::from_millis(123_456)));
    }

    #[test]
    fn test_parse_media_info_no_streams() {
        let json = r#"{"streams": [], "format": {}}"#;
        assert!(parse_media_info(json).is_err());
    }

    #[test]
    fn test_parse_media_info_missing_duration() {
        let json = r#"{
            "streams": [
                {"width": 640, "height": 480, "avg_frame_rate": "30/1"}
            ],
            "format": {}
        }"#;

        let info = parse_media_info(json).unwrap();
        assert_eq!(info.duration, None);
        assert_eq!(info.fps, 30.0);
    }
}
