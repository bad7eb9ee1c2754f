//! Local folder scanning.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use modelpush_core::{PushError, Result};
use walkdir::WalkDir;

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path inside the repository, always `/`-separated.
    pub path_in_repo: String,
    /// Path on disk.
    pub local_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Build a gitignore matcher from upload ignore patterns.
///
/// A bare pattern such as `__pycache__` matches a file or directory of that
/// name at any depth.
fn build_matcher(root: &Path, patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| PushError::Config(format!("invalid ignore pattern '{pattern}': {e}")))?;
    }
    builder
        .build()
        .map_err(|e| PushError::Config(format!("failed to build ignore matcher: {e}")))
}

/// Collect every file under `root` that is not ignored, sorted by repo path.
pub fn scan_folder(root: &Path, ignore_patterns: &[String]) -> Result<Vec<LocalFile>> {
    if !root.is_dir() {
        return Err(PushError::Config(format!(
            "'{}' is not a directory",
            root.display()
        )));
    }

    let matcher = build_matcher(root, ignore_patterns)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !matcher.matched(rel, entry.file_type().is_dir()).is_ignore()
        });

    for entry in walker {
        let entry = entry.map_err(|e| PushError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| PushError::Config(e.to_string()))?;
        let path_in_repo = rel
            .components()
            .map(|c| {
                c.as_os_str().to_str().ok_or_else(|| {
                    PushError::Config(format!(
                        "file name '{}' is not valid UTF-8 and cannot be uploaded",
                        entry.path().display()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");

        files.push(LocalFile {
            path_in_repo,
            local_path: entry.path().to_path_buf(),
            size: entry.metadata().map_err(|e| PushError::Io(e.into()))?.len(),
        });
    }

    if files.is_empty() {
        return Err(PushError::EmptyFolder(root.display().to_string()));
    }

    files.sort_by(|a, b| a.path_in_repo.cmp(&b.path_in_repo));
    tracing::debug!(count = files.len(), root = %root.display(), "Scanned upload folder");
    Ok(files)
}
