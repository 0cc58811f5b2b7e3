//! Dependency provisioning: make sure a runnable wakatime-cli exists.
//!
//! `ensure_cli` tries the local install, then `PATH`, then downloads the
//! pinned release into `~/.wakatime/`. The body is streamed into a temp file
//! next to the target and renamed into place only after it was fully written,
//! so the target path never holds a partial binary.
//!
//! At most one download runs per process. A request that arrives while one is
//! in flight gets `DownloadInProgress` immediately instead of waiting.
//!
//! The release is pinned by tag but not verified by checksum or signature.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::ToolError;
use crate::locate::{is_executable, locate_cli, locate_cli_with};
use crate::paths::ToolPaths;
use crate::release::{DEFAULT_CLI_VERSION, DEFAULT_RELEASE_BASE_URL, Platform, release_url};

pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub release_base_url: String,
    pub cli_version: String,
    /// Bounds the whole request, body included, so the single-flight slot
    /// cannot be held forever.
    pub download_timeout: Duration,
    pub auto_download: bool,
    pub platform: Platform,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            release_base_url: DEFAULT_RELEASE_BASE_URL.to_string(),
            cli_version: DEFAULT_CLI_VERSION.to_string(),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            auto_download: true,
            platform: Platform::current(),
        }
    }
}

pub struct Provisioner {
    paths: ToolPaths,
    config: ProvisionConfig,
    client: reqwest::Client,
    downloading: AtomicBool,
    cached: Mutex<Option<PathBuf>>,
    /// Replaces the process `PATH` for lookups when set.
    search_path: Option<OsString>,
}

/// Releases the single-flight slot on drop, including on error and cancellation.
struct DownloadGuard<'a>(&'a AtomicBool);

impl Drop for DownloadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Provisioner {
    pub fn new(paths: ToolPaths, config: ProvisionConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.download_timeout)
            .user_agent(concat!("wakabeat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            paths,
            config,
            client,
            downloading: AtomicBool::new(false),
            cached: Mutex::new(None),
            search_path: None,
        })
    }

    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn download_url(&self) -> String {
        release_url(
            &self.config.release_base_url,
            &self.config.cli_version,
            self.config.platform,
        )
    }

    pub fn download_in_progress(&self) -> bool {
        self.downloading.load(Ordering::Acquire)
    }

    fn cache(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Find an installed CLI without downloading. Successful lookups are
    /// cached until the file stops being executable or `invalidate` is called.
    pub fn locate(&self) -> Option<PathBuf> {
        let mut cached = self.cache();
        if let Some(path) = cached.as_ref() {
            if is_executable(path) {
                return Some(path.clone());
            }
            tracing::debug!(path = %path.display(), "cached wakatime-cli is gone");
            *cached = None;
        }

        let found = match &self.search_path {
            Some(search_path) => locate_cli_with(&self.paths, Some(search_path.as_os_str())),
            None => locate_cli(&self.paths),
        };
        if let Some(path) = &found {
            *cached = Some(path.clone());
        }
        found
    }

    /// Drop the cached location (e.g. after a launch failure).
    pub fn invalidate(&self) {
        *self.cache() = None;
    }

    /// Locate the CLI, downloading it when absent and allowed.
    ///
    /// Errors: `DownloadInProgress` when another download holds the slot,
    /// `MissingDependency` when nothing is installed and no download succeeded.
    pub async fn ensure_cli(&self) -> Result<PathBuf, ToolError> {
        match self.provision().await {
            Ok(path) => Ok(path),
            Err(e @ (ToolError::DownloadInProgress | ToolError::MissingDependency)) => Err(e),
            Err(e) => {
                tracing::warn!("wakatime-cli download failed: {e}");
                Err(ToolError::MissingDependency)
            }
        }
    }

    /// Same resolution as `ensure_cli`, but a failed download returns its
    /// own error (`HttpStatus`, `Http`, `Io`) for the caller to report.
    pub async fn provision(&self) -> Result<PathBuf, ToolError> {
        if let Some(path) = self.locate() {
            return Ok(path);
        }
        if !self.config.auto_download {
            return Err(ToolError::MissingDependency);
        }

        let path = self.download().await?;
        *self.cache() = Some(path.clone());
        Ok(path)
    }

    /// Download and install the pinned release, replacing any existing install.
    pub async fn download(&self) -> Result<PathBuf, ToolError> {
        let _guard = self
            .try_begin_download()
            .ok_or(ToolError::DownloadInProgress)?;

        let url = self.download_url();
        let dest = self.paths.cli_path();
        tracing::info!(%url, dest = %dest.display(), "downloading wakatime-cli");

        let installed = download_to(&self.client, &url, &self.paths.install_dir(), &dest).await?;
        tracing::warn!(
            path = %installed.display(),
            version = %self.config.cli_version,
            "installed wakatime-cli without checksum verification"
        );
        Ok(installed)
    }

    fn try_begin_download(&self) -> Option<DownloadGuard<'_>> {
        self.downloading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DownloadGuard(&self.downloading))
    }
}

async fn download_to(
    client: &reqwest::Client,
    url: &str,
    install_dir: &Path,
    dest: &Path,
) -> Result<PathBuf, ToolError> {
    tokio::fs::create_dir_all(install_dir).await?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    // `temp_path` deletes the file when dropped, i.e. on every early return.
    let (file, temp_path) = tempfile::Builder::new()
        .prefix(".wakatime-cli-")
        .suffix(".download")
        .tempfile_in(install_dir)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    if written == 0 {
        return Err(ToolError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "empty response body",
        )));
    }
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    set_executable(&temp_path).await?;
    temp_path.persist(dest).map_err(|e| ToolError::Io(e.error))?;

    tracing::debug!(bytes = written, dest = %dest.display(), "download complete");
    Ok(dest.to_path_buf())
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
