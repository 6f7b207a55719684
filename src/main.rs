mod cli;
mod dispatch;
mod format;
mod logging;
mod mcp;
mod proxmox;
mod settings;
mod tools;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Args, Commands};
use dispatch::Dispatcher;
use format::Theme;
use mcp::McpServer;
use proxmox::ProxmoxClient;
use settings::Settings;
use std::process;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match &args.command {
        Some(Commands::Tools) => {
            match serde_json::to_string_pretty(&dispatch::tool_definitions()) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize tool catalogue: {}", e);
                    process::exit(1);
                }
            }
            return;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Args::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
            return;
        }
        Some(Commands::Serve) | None => {}
    }

    if let Err(e) = serve(args).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
    // The blocking stdin reader would otherwise hold the runtime open.
    process::exit(0);
}

async fn serve(args: Args) -> Result<()> {
    let settings =
        Settings::new(args.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = logging::init(&settings.logging, args.log_level.as_deref())?;

    info!(
        host = %settings.proxmox.host,
        port = settings.proxmox.port,
        verify_ssl = settings.proxmox.verify_ssl,
        timeout_secs = settings.proxmox.timeout_secs,
        "Connecting to Proxmox"
    );
    let client =
        ProxmoxClient::from_settings(&settings).context("Failed to create Proxmox client")?;
    client
        .verify()
        .await
        .context("Failed to authenticate against the Proxmox API")?;

    let theme = Theme::resolve(args.theme.map(Into::into).unwrap_or(settings.display.theme));
    let server = McpServer::new(Dispatcher::new(client, theme));

    info!(
        tools = dispatch::tool_definitions().len(),
        ?theme,
        "Starting MCP server (stdio transport)"
    );
    tokio::select! {
        res = server.run_stdio() => res.context("stdio transport failed")?,
        _ = shutdown_signal() => info!("Shutdown signal received"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
