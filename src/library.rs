use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Audio files directly inside `dir`, keyed by the file name up to its first
/// `.`. On a shared base name the later file in name order wins.
pub fn scan_directory(dir: &Path, extensions: &[String]) -> Result<BTreeMap<String, PathBuf>> {
    let mut tracks = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("failed to read {}", dir.display()));
            }
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, extensions) {
            continue;
        }

        let name = base_name(entry.file_name());
        if let Some(replaced) = tracks.insert(name.clone(), path.to_path_buf()) {
            debug!(name = %name, replaced = %replaced.display(), "duplicate base name");
        }
    }

    info!(dir = %dir.display(), tracks = tracks.len(), "directory scanned");
    Ok(tracks)
}

pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    !ext.is_empty()
        && extensions
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(supported.trim_start_matches('.')))
}

fn base_name(file_name: &OsStr) -> String {
    let file_name = file_name.to_string_lossy();
    file_name
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn extensions() -> Vec<String> {
        crate::model::Settings::default().extensions
    }

    #[test]
    fn scan_filters_non_audio_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("song.mp3"), b"x").expect("write");
        fs::write(dir.path().join("notes.txt"), b"x").expect("write");
        fs::write(dir.path().join("loud.FLAC"), b"x").expect("write");

        let tracks = scan_directory(dir.path(), &extensions()).expect("scan");
        assert_eq!(tracks.keys().collect::<Vec<_>>(), vec!["loud", "song"]);
        assert_eq!(tracks["song"], dir.path().join("song.mp3"));
    }

    #[test]
    fn scan_is_not_recursive() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("nested.mp3")).expect("mkdir");
        fs::write(dir.path().join("nested.mp3").join("inner.mp3"), b"x").expect("write");
        fs::write(dir.path().join("top.mp3"), b"x").expect("write");

        let tracks = scan_directory(dir.path(), &extensions()).expect("scan");
        assert_eq!(tracks.keys().collect::<Vec<_>>(), vec!["top"]);
    }

    #[test]
    fn base_name_stops_at_first_dot() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("intro.remix.mp3"), b"x").expect("write");

        let tracks = scan_directory(dir.path(), &extensions()).expect("scan");
        assert!(tracks.contains_key("intro"));
    }

    #[test]
    fn later_file_wins_shared_base_name() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.flac"), b"x").expect("write");
        fs::write(dir.path().join("a.mp3"), b"x").expect("write");

        let tracks = scan_directory(dir.path(), &extensions()).expect("scan");
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks["a"], dir.path().join("a.mp3"));
    }

    #[test]
    fn default_extensions_follow_filter_list() {
        let exts = extensions();
        assert!(has_extension(Path::new("x.vaw"), &exts));
        assert!(!has_extension(Path::new("x.wav"), &exts));
        assert!(has_extension(Path::new("x.wav"), &[String::from(".wav")]));
        assert!(!has_extension(Path::new("mp3"), &exts));
    }

    #[test]
    fn empty_directory_yields_empty_catalog() {
        let dir = tempdir().expect("tempdir");
        let tracks = scan_directory(dir.path(), &extensions()).expect("scan");
        assert!(tracks.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_does_not_hide_other_tracks() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("good.mp3"), b"x").expect("write");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("dangling.mp3"))
            .expect("symlink");

        let tracks = scan_directory(dir.path(), &extensions()).expect("scan");
        assert_eq!(tracks.keys().collect::<Vec<_>>(), vec!["good"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("gone");
        assert!(scan_directory(&missing, &extensions()).is_err());
    }
}
