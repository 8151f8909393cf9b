//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use userctl_server::db::{create_pool_with_options, migrations};

use super::SettingsArgs;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Create the users table and indexes if they do not exist
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let settings = args.settings.load()?;

    let pool = create_pool_with_options(&settings.database.url, settings.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("schema is up to date");

    pool.close().await;
    Ok(())
}
