use catsync_core::reconcile::{collection_filters, reset_collection_membership, sync_collections};
use catsync_core::{AppConfig, MembershipMode, ReconcilerContext, RunSettings, RunSummary};
use catsync_db::PgCatalogStore;
use clap::Subcommand;

use crate::input::{load_rows, parse_levels, InputArgs};

#[derive(Debug, Subcommand)]
pub enum CollectionsCommands {
    /// Mirror the category tree as nested collections and set variant membership
    Sync {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "4", value_parser = parse_levels)]
        levels: usize,
        /// Only add memberships; keep variants that left a category
        #[arg(long)]
        additive: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Point each category collection's filter at its matching facet value
    Filters {
        #[arg(long, default_value = "4", value_parser = parse_levels)]
        levels: usize,
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete collection/variant memberships (all, or only the given collections)
    ResetMembership {
        /// Collection id to reset; repeat for several
        #[arg(long = "collection")]
        collections: Vec<i64>,
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_collections(
    pool: &sqlx::PgPool,
    config: AppConfig,
    command: CollectionsCommands,
) -> anyhow::Result<RunSummary> {
    catsync_db::verify_schema_mapping(pool, &config.schema).await?;

    match command {
        CollectionsCommands::Sync {
            input,
            levels,
            additive,
            dry_run,
        } => {
            let config = input.apply(config);
            let store = PgCatalogStore::from_app_config(pool.clone(), &config);
            let settings = RunSettings::from_config(&config, levels);
            let rows = load_rows(&config, &settings.columns())?;
            let mode = if additive {
                MembershipMode::Additive
            } else {
                MembershipMode::Replace
            };

            let mut ctx = ReconcilerContext::new("collections sync").dry_run(dry_run);
            sync_collections(&store, &mut ctx, &rows, &settings, mode).await?;
            Ok(ctx.into_summary())
        }
        CollectionsCommands::Filters { levels, dry_run } => {
            let store = PgCatalogStore::from_app_config(pool.clone(), &config);
            let settings = RunSettings::from_config(&config, levels);
            let mut ctx = ReconcilerContext::new("collections filters").dry_run(dry_run);
            collection_filters(&store, &mut ctx, &settings).await?;
            Ok(ctx.into_summary())
        }
        CollectionsCommands::ResetMembership {
            collections,
            dry_run,
        } => {
            let store = PgCatalogStore::from_app_config(pool.clone(), &config);
            let mut ctx = ReconcilerContext::new("collections reset-membership").dry_run(dry_run);
            reset_collection_membership(&store, &mut ctx, &collections).await?;
            Ok(ctx.into_summary())
        }
    }
}
