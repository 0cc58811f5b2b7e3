//! CLI definition using clap derive.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use wakabeat_core::HeartbeatConfig;
use wakabeat_core::config::DEFAULT_COOLDOWN_SECS;
use wakabeat_tool::{
    DEFAULT_CLI_VERSION, DEFAULT_MAX_IN_FLIGHT, DEFAULT_RELEASE_BASE_URL, Platform,
    ProvisionConfig, ToolPaths,
};

#[derive(Parser)]
#[command(name = "wakabeat", about = "wakatime heartbeat daemon", version)]
pub struct Cli {
    /// UDS socket path (default: $XDG_RUNTIME_DIR/wakabeat/wakabeat.sock)
    #[arg(long, short = 's', global = true, env = "WAKABEAT_SOCKET")]
    pub socket_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the daemon (heartbeat queue + UDS server)
    Daemon(DaemonOpts),
    /// Report that a file was opened
    Open(NotifyOpts),
    /// Report that a file was saved (always sends a write heartbeat)
    Save(NotifyOpts),
    /// Report that a file gained focus
    Activate(NotifyOpts),
    /// Show daemon status (JSON)
    Status,
    /// Install wakatime-cli through the daemon if it is missing
    Provision,
}

#[derive(clap::Args)]
pub struct NotifyOpts {
    /// File the event refers to (made absolute before sending)
    pub path: PathBuf,
}

#[derive(clap::Args)]
pub struct DaemonOpts {
    /// Directory holding .wakatime.cfg and .wakatime/ (default: $HOME)
    #[arg(long, env = "WAKATIME_HOME")]
    pub home: Option<PathBuf>,

    /// Minimum seconds between view heartbeats for the same file
    #[arg(long, env = "WAKABEAT_COOLDOWN_SECS", default_value_t = DEFAULT_COOLDOWN_SECS)]
    pub cooldown_secs: u64,

    /// wakatime-cli release tag to download
    #[arg(long, env = "WAKABEAT_CLI_VERSION", default_value = DEFAULT_CLI_VERSION)]
    pub cli_version: String,

    /// Base URL of the wakatime-cli release downloads
    #[arg(long, env = "WAKABEAT_RELEASE_BASE_URL", default_value = DEFAULT_RELEASE_BASE_URL)]
    pub release_base_url: String,

    /// Timeout for the whole wakatime-cli download
    #[arg(long, default_value = "60")]
    pub download_timeout_secs: u64,

    /// Never download wakatime-cli; only use an existing install
    #[arg(long)]
    pub no_download: bool,

    /// Maximum heartbeat processes running at once
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,

    /// Editor identity prepended to --plugin, e.g. "geany/2.0"
    #[arg(long, env = "WAKABEAT_EDITOR")]
    pub editor: Option<String>,

    /// File currently open in the editor; reported as a view on startup
    #[arg(long)]
    pub current: Option<PathBuf>,
}

impl DaemonOpts {
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            cooldown_secs: self.cooldown_secs,
            editor: self.editor.clone(),
        }
    }

    pub fn provision_config(&self) -> ProvisionConfig {
        ProvisionConfig {
            release_base_url: self.release_base_url.clone(),
            cli_version: self.cli_version.clone(),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            auto_download: !self.no_download,
            platform: Platform::current(),
        }
    }

    pub fn tool_paths(&self) -> anyhow::Result<ToolPaths> {
        match &self.home {
            Some(home) => Ok(ToolPaths::new(home)),
            None => ToolPaths::from_env()
                .ok_or_else(|| anyhow::anyhow!("HOME not set; pass --home or WAKATIME_HOME")),
        }
    }
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/wakabeat/wakabeat.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/wakabeat-{user}/wakabeat.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_defaults() {
        let cli =
            Cli::try_parse_from(["wakabeat", "daemon", "--home", "/home/dev"]).expect("parse");
        let Command::Daemon(opts) = cli.command else {
            panic!("expected daemon subcommand");
        };
        assert_eq!(opts.heartbeat_config().cooldown_secs, 120);
        let provision = opts.provision_config();
        assert!(provision.auto_download);
        assert_eq!(provision.download_timeout, Duration::from_secs(60));
        assert_eq!(
            opts.tool_paths().expect("paths").home(),
            std::path::Path::new("/home/dev")
        );
    }

    #[test]
    fn daemon_overrides() {
        let cli = Cli::try_parse_from([
            "wakabeat",
            "daemon",
            "--cooldown-secs",
            "30",
            "--no-download",
            "--max-in-flight",
            "2",
            "--editor",
            "geany/2.0",
            "--current",
            "/repo/main.c",
        ])
        .expect("parse");
        let Command::Daemon(opts) = cli.command else {
            panic!("expected daemon subcommand");
        };
        assert_eq!(opts.heartbeat_config().cooldown_secs, 30);
        assert!(!opts.provision_config().auto_download);
        assert_eq!(opts.max_in_flight, 2);
        assert!(opts.heartbeat_config().plugin_identity().starts_with("geany/2.0 wakabeat/"));
        assert_eq!(opts.current, Some(PathBuf::from("/repo/main.c")));
    }

    #[test]
    fn notify_subcommands_take_a_path() {
        let cli = Cli::try_parse_from(["wakabeat", "-s", "/tmp/x.sock", "save", "a.rs"])
            .expect("parse");
        assert_eq!(cli.socket_path.as_deref(), Some("/tmp/x.sock"));
        assert!(matches!(cli.command, Command::Save(ref o) if o.path == PathBuf::from("a.rs")));
        assert!(Cli::try_parse_from(["wakabeat", "open"]).is_err());
    }

    #[test]
    fn default_socket_path_is_per_user() {
        assert!(default_socket_path().ends_with("wakabeat.sock"));
    }
}
