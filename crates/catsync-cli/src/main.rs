mod collections;
mod db;
mod facets;
mod images;
mod input;
mod inspect;

use catsync_core::AppConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::collections::CollectionsCommands;
use crate::db::DbCommands;
use crate::facets::FacetsCommands;
use crate::images::ImagesCommands;
use crate::inspect::InspectCommands;

#[derive(Debug, Parser)]
#[command(name = "catsync")]
#[command(about = "Reconcile the catalog taxonomy with the PHC category spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database connectivity and sandbox setup
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Read-only views of the input spreadsheet
    Inspect {
        #[command(subcommand)]
        command: InspectCommands,
    },
    /// Category facets and their product/variant memberships
    Facets {
        #[command(subcommand)]
        command: FacetsCommands,
    },
    /// Nested category collections
    Collections {
        #[command(subcommand)]
        command: CollectionsCommands,
    },
    /// Placeholder images
    Images {
        #[command(subcommand)]
        command: ImagesCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = catsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("catsync ready; see `catsync --help`");
        return Ok(());
    };

    let summary = match command {
        // Inspecting a spreadsheet never touches the database.
        Commands::Inspect { command } => return inspect::run_inspect(config, command),
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            return db::run_db(&pool, command).await;
        }
        Commands::Facets { command } => {
            let pool = connect(&config).await?;
            facets::run_facets(&pool, config, command).await?
        }
        Commands::Collections { command } => {
            let pool = connect(&config).await?;
            collections::run_collections(&pool, config, command).await?
        }
        Commands::Images { command } => {
            let pool = connect(&config).await?;
            images::run_images(&pool, &config, command).await?
        }
    };

    println!("{summary}");
    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = catsync_db::PoolConfig::from_app_config(config);
    let pool = catsync_db::connect_pool(config.database_url()?, pool_config).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests;
