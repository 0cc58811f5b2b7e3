//! wakabeat: background wakatime heartbeat reporter.
//! The daemon owns throttling, wakatime-cli provisioning and dispatch;
//! editors talk to it through the `open` / `save` / `activate` subcommands.

#[cfg(not(unix))]
compile_error!("wakabeat talks to editors over Unix domain sockets and only builds on Unix");

use clap::Parser;

use wakabeat_core::EditorNotification;

mod cli;
mod client;
mod daemon;
mod server;
mod service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);

    match args.command {
        cli::Command::Daemon(opts) => {
            let filter = std::env::var("WAKABEAT_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("wakabeat daemon starting");
            daemon::run_daemon(opts, &socket_path).await?;
        }
        cli::Command::Open(opts) => {
            client::cmd_notify(&socket_path, EditorNotification::Open, &opts.path).await?;
        }
        cli::Command::Save(opts) => {
            client::cmd_notify(&socket_path, EditorNotification::Save, &opts.path).await?;
        }
        cli::Command::Activate(opts) => {
            client::cmd_notify(&socket_path, EditorNotification::Activate, &opts.path).await?;
        }
        cli::Command::Status => client::cmd_status(&socket_path).await?,
        cli::Command::Provision => client::cmd_provision(&socket_path).await?,
    }

    Ok(())
}
