//! Find an existing wakatime-cli executable.
//!
//! Resolution order:
//! 1. `~/.wakatime/wakatime-cli` (must be an executable file)
//! 2. `wakatime` on `PATH`

use std::env::consts::EXE_SUFFIX;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::paths::{PATH_PROGRAM, ToolPaths};

/// True if `path` is a regular file with at least one execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Search `search_path` (a `PATH`-style list) for an executable named `program`.
pub fn find_in_path(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    let file_name = format!("{program}{EXE_SUFFIX}");
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(&file_name))
        .find(|candidate| is_executable(candidate))
}

/// Locate the CLI using the process `PATH`.
pub fn locate_cli(paths: &ToolPaths) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH");
    locate_cli_with(paths, path_var.as_deref())
}

pub fn locate_cli_with(paths: &ToolPaths, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let local = paths.cli_path();
    if is_executable(&local) {
        return Some(local);
    }
    find_in_path(PATH_PROGRAM, search_path)
}
