//! wakabeat-tool: `wakatime-cli` IO boundary.
//! Locates, downloads and launches the external CLI, and checks for its
//! credentials file. No heartbeat policy here; see `wakabeat-core`.

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod launcher;
pub mod locate;
pub mod paths;
pub mod provision;
pub mod release;

pub use credentials::{has_credentials, require_credentials};
pub use dispatch::{build_args, dispatch};
pub use error::ToolError;
pub use launcher::{DEFAULT_MAX_IN_FLIGHT, HeartbeatLauncher, ProcessLauncher};
pub use locate::{find_in_path, is_executable, locate_cli};
pub use paths::ToolPaths;
pub use provision::{ProvisionConfig, Provisioner};
pub use release::{DEFAULT_CLI_VERSION, DEFAULT_RELEASE_BASE_URL, Platform, release_url};
