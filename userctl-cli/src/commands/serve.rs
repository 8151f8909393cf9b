//! HTTP server command

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use userctl_server::{run_server, server_config, ApplicationContext};

use super::SettingsArgs;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Address to bind to (default: 127.0.0.1:8080)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Create the schema before serving
    #[arg(long)]
    pub migrate: bool,
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings = args.settings.load()?;
    if let Some(bind) = args.bind {
        settings.server.bind = bind;
    }
    settings.server.cors_permissive |= args.cors_permissive;
    settings.database.migrate |= args.migrate;

    tracing::info!(bind = %settings.server.bind, "starting userctl server");

    let context = ApplicationContext::new(&settings)
        .await
        .context("Failed to initialise application")?;

    run_server(context.state, server_config(&settings))
        .await
        .context("Server error")?;

    context.pool.close().await;
    Ok(())
}
