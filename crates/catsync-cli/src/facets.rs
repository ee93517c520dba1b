//! `facets` command handlers.
//!
//! Every job verifies the schema mapping first, then runs one reconciler
//! stage against the Postgres store and hands the run summary back to `main`.

use catsync_core::reconcile::{clear_facets, reconcile_facets, tag_matching_rows};
use catsync_core::{AppConfig, MembershipMode, ReconcilerContext, RunSettings, RunSummary, TagRule};
use catsync_db::PgCatalogStore;
use clap::Subcommand;

use crate::input::{load_rows, parse_levels, InputArgs};

#[derive(Debug, Subcommand)]
pub enum FacetsCommands {
    /// Rebuild category facet memberships from the spreadsheet, replacing
    /// stale ones
    Rebuild {
        #[command(flatten)]
        input: InputArgs,
        /// Number of category levels to reconcile
        #[arg(long, default_value = "4", value_parser = parse_levels)]
        levels: usize,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Add category facet memberships from the spreadsheet, never removing any
    Apply {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "4", value_parser = parse_levels)]
        levels: usize,
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove every product/variant membership of the category facets
    Clear {
        #[arg(long, default_value = "4", value_parser = parse_levels)]
        levels: usize,
        /// Also delete the facet values themselves
        #[arg(long)]
        delete_values: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Attach one existing facet value to every SKU whose row matches
    Tag {
        #[command(flatten)]
        input: InputArgs,
        /// Column to match on
        #[arg(long)]
        column: String,
        /// Value the column must hold
        #[arg(long)]
        value: String,
        /// Code of the facet holding the value
        #[arg(long)]
        facet: String,
        /// Code of the facet value to attach
        #[arg(long)]
        facet_value: String,
        #[arg(long)]
        ignore_case: bool,
        /// Do not tag products
        #[arg(long)]
        skip_products: bool,
        /// Do not tag variants
        #[arg(long)]
        skip_variants: bool,
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_facets(
    pool: &sqlx::PgPool,
    config: AppConfig,
    command: FacetsCommands,
) -> anyhow::Result<RunSummary> {
    catsync_db::verify_schema_mapping(pool, &config.schema).await?;

    match command {
        FacetsCommands::Rebuild {
            input,
            levels,
            dry_run,
        } => {
            let config = input.apply(config);
            run_rows(pool, &config, levels, MembershipMode::Replace, dry_run).await
        }
        FacetsCommands::Apply {
            input,
            levels,
            dry_run,
        } => {
            let config = input.apply(config);
            run_rows(pool, &config, levels, MembershipMode::Additive, dry_run).await
        }
        FacetsCommands::Clear {
            levels,
            delete_values,
            dry_run,
        } => {
            let store = PgCatalogStore::from_app_config(pool.clone(), &config);
            let settings = RunSettings::from_config(&config, levels);
            let mut ctx = ReconcilerContext::new("facets clear").dry_run(dry_run);
            clear_facets(&store, &mut ctx, &settings, delete_values).await?;
            Ok(ctx.into_summary())
        }
        FacetsCommands::Tag {
            input,
            column,
            value,
            facet,
            facet_value,
            ignore_case,
            skip_products,
            skip_variants,
            dry_run,
        } => {
            let config = input.apply(config);
            let store = PgCatalogStore::from_app_config(pool.clone(), &config);
            let settings = RunSettings::from_config(&config, 0);
            let rule = TagRule {
                column,
                value,
                facet_code: facet,
                facet_value_code: facet_value,
                ignore_case,
                products: !skip_products,
                variants: !skip_variants,
            };
            let sku = config.columns.sku.clone();
            let rows = load_rows(&config, &[sku.as_str(), rule.column.as_str()])?;

            let mut ctx = ReconcilerContext::new("facets tag").dry_run(dry_run);
            tag_matching_rows(&store, &mut ctx, &rows, &sku, &rule, &settings).await?;
            Ok(ctx.into_summary())
        }
    }
}

async fn run_rows(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    levels: usize,
    mode: MembershipMode,
    dry_run: bool,
) -> anyhow::Result<RunSummary> {
    let store = PgCatalogStore::from_app_config(pool.clone(), config);
    let settings = RunSettings::from_config(config, levels);
    let rows = load_rows(config, &settings.columns())?;

    let job = match mode {
        MembershipMode::Replace => "facets rebuild",
        MembershipMode::Additive => "facets apply",
    };
    let mut ctx = ReconcilerContext::new(job).dry_run(dry_run);
    reconcile_facets(&store, &mut ctx, &rows, &settings, mode).await?;
    Ok(ctx.into_summary())
}
