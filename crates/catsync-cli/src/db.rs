use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check connectivity and report the server version
    Ping,
    /// Apply the fixture catalog schema to a sandbox database
    Migrate,
}

pub(crate) async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            let version = catsync_db::health_check(pool).await?;
            println!("database reachable (PostgreSQL {version})");
        }
        DbCommands::Migrate => {
            let applied = catsync_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}
