use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "sketchbook.png";
pub const EXPORT_SUBDIR: &str = "sketchbook_exports";

pub fn exe_relative_output_folder_from_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(EXPORT_SUBDIR))
}

/// Picks the configured folder, or `sketchbook_exports` next to the executable.
pub fn resolve_export_dir(configured: Option<&str>) -> Result<PathBuf> {
    match configured.map(str::trim).filter(|dir| !dir.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => {
            let exe_path = std::env::current_exe().context("resolve current executable")?;
            exe_relative_output_folder_from_path(&exe_path)
        }
    }
}

/// Writes `bytes` to `dir/file_name`, creating `dir` when missing. An
/// existing file of the same name is replaced.
pub fn write_png(bytes: &[u8], dir: &Path, file_name: &str) -> Result<PathBuf> {
    let file_name = if file_name.trim().is_empty() {
        EXPORT_FILE_NAME
    } else {
        file_name
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("create export folder {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "sketch exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_folder_sits_next_to_executable() {
        let exe = Path::new("/opt/sketchbook/sketchbook");
        let out = exe_relative_output_folder_from_path(exe).expect("output path");
        assert_eq!(out, Path::new("/opt/sketchbook").join(EXPORT_SUBDIR));
    }

    #[test]
    fn configured_dir_wins() {
        let dir = resolve_export_dir(Some("/tmp/art")).expect("dir");
        assert_eq!(dir, PathBuf::from("/tmp/art"));
        let fallback = resolve_export_dir(Some("  ")).expect("fallback");
        assert!(fallback.ends_with(EXPORT_SUBDIR));
    }

    #[test]
    fn write_png_creates_folder_and_uses_default_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("nested");
        let path = write_png(b"png", &dir, "").expect("write");
        assert_eq!(path, dir.join(EXPORT_FILE_NAME));
        assert_eq!(fs::read(&path).expect("read back"), b"png");
    }
}
