//! Administrative command handlers.
//!
//! CLI entry points for maintenance work that does not need the HTTP server:
//! applying store migrations and printing document counts.

use crate::config::Config;
use crate::db;
use crate::error::AppResult;
use clap::Subcommand;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Run store migrations
    Migrate,

    /// Show user and recipe counts
    Stats,
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::Stats => stats(config).await,
    }
}

/// Run store migrations.
async fn migrate(config: Config) -> AppResult<()> {
    info!("Running store migrations...");

    let repository = db::connect(&config.store).await?;
    repository.run_migrations().await?;

    info!(backend = repository.backend(), "Migrations completed successfully");
    Ok(())
}

/// Display statistics.
async fn stats(config: Config) -> AppResult<()> {
    info!("Fetching statistics...");

    let repository = db::connect(&config.store).await?;
    let counts = repository.count().await?;

    println!("\n=== recipeshare Statistics ===");
    println!("Store backend:   {}", repository.backend());
    println!("Total users:     {}", counts.users);
    println!("Total recipes:   {}", counts.recipes);
    println!();

    Ok(())
}
