//! Per-user file locations used by wakatime-cli.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

/// Executable installed under the install directory.
pub const CLI_BASENAME: &str = "wakatime-cli";
/// Executable looked up on `PATH` when no local install exists.
pub const PATH_PROGRAM: &str = "wakatime";
/// Install directory name under the home directory.
pub const INSTALL_DIR_NAME: &str = ".wakatime";
/// Credentials/config file name under the home directory.
pub const CONFIG_FILE_NAME: &str = ".wakatime.cfg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    home: PathBuf,
}

impl ToolPaths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Resolve from `WAKATIME_HOME`, then `HOME`, then `USERPROFILE`.
    pub fn from_env() -> Option<Self> {
        ["WAKATIME_HOME", "HOME", "USERPROFILE"]
            .iter()
            .filter_map(std::env::var_os)
            .find(|v| !v.is_empty())
            .map(Self::new)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/.wakatime/`
    pub fn install_dir(&self) -> PathBuf {
        self.home.join(INSTALL_DIR_NAME)
    }

    /// `~/.wakatime/wakatime-cli[.exe]`
    pub fn cli_path(&self) -> PathBuf {
        self.install_dir().join(format!("{CLI_BASENAME}{EXE_SUFFIX}"))
    }

    /// `~/.wakatime.cfg`
    pub fn config_file(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }
}
