// Output codec presets and the on-disk preset catalog

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A named output profile: the FFmpeg arguments that produce it and the file
/// extension it implies.
///
/// Presets are built once at startup and shared read-only by any number of
/// jobs. The command string is tokenized at construction time with a
/// platform-selected strategy: shell-style splitting on Unix, and a single
/// preserved token on Windows, where `CreateProcess` consumers re-quote the
/// whole string themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecPreset {
    name: String,
    extension: String,
    args: Vec<String>,
}

#[cfg(not(windows))]
fn tokenize(command: &str) -> Vec<String> {
    // shlex respects quoting; unbalanced quotes fall back to a plain
    // whitespace split rather than dropping the arguments
    shlex::split(command)
        .unwrap_or_else(|| command.split_whitespace().map(str::to_string).collect())
}

#[cfg(windows)]
fn tokenize(command: &str) -> Vec<String> {
    vec![command.to_string()]
}

impl CodecPreset {
    pub fn new(name: &str, extension: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            extension: extension.to_string(),
            args: tokenize(command),
        }
    }

    /// Build from an already-tokenized argument list, skipping the platform
    /// tokenization strategy.
    pub fn from_tokens(name: &str, extension: &str, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            extension: extension.to_string(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output file extension, without a leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The built-in catalog.
    pub fn builtin() -> Vec<CodecPreset> {
        vec![
            CodecPreset::new(
                "MP4 (libx264)",
                "mp4",
                "-c:v libx264 -crf 22 -c:a aac -b:a 160k",
            ),
            CodecPreset::new("MP3 (Audio-only)", "mp3", "-vn -c:a libmp3lame -q:a 0"),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct PresetEntry {
    name: String,
    extension: String,
    command: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    preset: Vec<PresetEntry>,
}

/// Load a preset catalog from a TOML file.
///
/// A missing file is not an error: the built-in catalog is returned so a host
/// application works out of the box. An unreadable or malformed file is
/// surfaced, since silently falling back would hide a user's broken edits.
///
/// Expected shape:
///
/// ```toml
/// [[preset]]
/// name = "WebM (VP9)"
/// extension = "webm"
/// command = "-c:v libvpx-vp9 -crf 31 -b:v 0 -c:a libopus"
/// ```
pub fn load_catalog(path: &Path) -> Result<Vec<CodecPreset>> {
    if !path.exists() {
        return Ok(CodecPreset::builtin());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset catalog: {}", path.display()))?;

    let catalog: CatalogFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse preset catalog: {}", path.display()))?;

    Ok(catalog
        .preset
        .into_iter()
        .map(|p| CodecPreset::new(&p.name, &p.extension, &p.command))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(windows))]
    fn test_tokenize_plain_flags() {
        let preset = CodecPreset::new("x264", "mp4", "-c:v libx264 -crf 22 -c:a aac -b:a 160k");
        assert_eq!(
            preset.args(),
            ["-c:v", "libx264", "-crf", "22", "-c:a", "aac", "-b:a", "160k"]
        );
    }

    #[test]
    #[cfg(not(windows))]
    fn test_tokenize_respects_quotes() {
        let preset = CodecPreset::new("scaled", "mp4", "-vf 'scale=640:-1, fps=30' -an");
        assert_eq!(preset.args(), ["-vf", "scale=640:-1, fps=30", "-an"]);
    }

    #[test]
    #[cfg(not(windows))]
    fn test_tokenize_unbalanced_quote_falls_back() {
        let preset = CodecPreset::new("broken", "mp4", "-vf \"scale=640 -an");
        // Whitespace fallback; quote character survives as-is
        assert_eq!(preset.args(), ["-vf", "\"scale=640", "-an"]);
    }

    #[test]
    #[cfg(windows)]
    fn test_tokenize_windows_single_token() {
        let preset = CodecPreset::new("x264", "mp4", "-c:v libx264 -crf 22");
        assert_eq!(preset.args(), ["-c:v libx264 -crf 22"]);
    }

    #[test]
    fn test_from_tokens_is_verbatim() {
        let preset = CodecPreset::from_tokens(
            "raw",
            "mkv",
            vec!["-c:v".into(), "a b c".into()],
        );
        assert_eq!(preset.args(), ["-c:v", "a b c"]);
    }

    #[test]
    fn test_builtin_catalog() {
        let presets = CodecPreset::builtin();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name(), "MP4 (libx264)");
        assert_eq!(presets[0].extension(), "mp4");
        assert_eq!(presets[1].extension(), "mp3");
        assert!(presets[1].args().contains(&"libmp3lame".to_string()));
    }
}
