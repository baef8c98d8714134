// Preset catalog loading from TOML

use ffjob::{CodecPreset, load_catalog};
use std::path::Path;

#[test]
fn test_missing_file_yields_builtin_catalog() {
    let presets = load_catalog(Path::new("/nonexistent/ffjob-presets.toml")).unwrap();
    assert_eq!(presets, CodecPreset::builtin());
}

#[test]
#[cfg(not(windows))]
fn test_load_catalog_tokenizes_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.toml");
    std::fs::write(
        &path,
        r#"
[[preset]]
name = "WebM (VP9)"
extension = "webm"
command = "-c:v libvpx-vp9 -crf 31 -b:v 0 -c:a libopus"

[[preset]]
name = "GIF"
extension = "gif"
command = "-vf 'fps=12,scale=480:-1' -loop 0"
"#,
    )
    .unwrap();

    let presets = load_catalog(&path).unwrap();
    assert_eq!(presets.len(), 2);

    assert_eq!(presets[0].name(), "WebM (VP9)");
    assert_eq!(presets[0].extension(), "webm");
    assert_eq!(presets[0].args()[..2], ["-c:v", "libvpx-vp9"]);

    // Quoted filter chain survives as a single token
    assert_eq!(
        presets[1].args(),
        ["-vf", "fps=12,scale=480:-1", "-loop", "0"]
    );
}

#[test]
fn test_empty_file_yields_no_presets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.toml");
    std::fs::write(&path, "").unwrap();

    let presets = load_catalog(&path).unwrap();
    assert!(presets.is_empty());
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.toml");
    std::fs::write(&path, "[[preset]]\nname = 12\n").unwrap();

    assert!(load_catalog(&path).is_err());
}
