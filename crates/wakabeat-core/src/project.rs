//! Project detection: nearest ancestor directory holding a VCS marker.
//!
//! The ascent is lexical (`Path::parent`, no canonicalization), so symlinked
//! directories are never followed upward and the walk always terminates at
//! the filesystem root.

use std::path::{Path, PathBuf};

/// Marker entries that identify a version-controlled project root.
pub const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn", ".jj"];

/// `.git` may be a file (worktrees, submodules); the others must be directories.
fn has_marker(dir: &Path) -> bool {
    VCS_MARKERS.iter().any(|marker| {
        let candidate = dir.join(marker);
        if *marker == ".git" {
            candidate.exists()
        } else {
            candidate.is_dir()
        }
    })
}

/// Return the nearest ancestor of `file_path` (starting at its parent) that
/// holds a VCS marker.
pub fn find_project_root(file_path: &Path) -> Option<PathBuf> {
    let mut current = file_path.parent().filter(|p| !p.as_os_str().is_empty())?;
    loop {
        if has_marker(current) {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                current = parent;
            }
            _ => return None,
        }
    }
}

/// Project name for `file_path`: the base name of its project root.
///
/// `None` when no marked ancestor exists, or the marker sits at the root.
pub fn resolve_project(file_path: &Path) -> Option<String> {
    let root = find_project_root(file_path)?;
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
