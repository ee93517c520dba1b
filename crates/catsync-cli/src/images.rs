use catsync_core::{AppConfig, RunSummary};
use catsync_db::FillOptions;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum ImagesCommands {
    /// Give products, variants and collections without a featured image the placeholder asset
    FillMissing {
        /// Id of the existing placeholder asset
        #[arg(long)]
        asset_id: i64,
        #[arg(long)]
        skip_products: bool,
        #[arg(long)]
        skip_variants: bool,
        #[arg(long)]
        skip_collections: bool,
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_images(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: ImagesCommands,
) -> anyhow::Result<RunSummary> {
    catsync_db::verify_schema_mapping(pool, &config.schema).await?;

    match command {
        ImagesCommands::FillMissing {
            asset_id,
            skip_products,
            skip_variants,
            skip_collections,
            dry_run,
        } => {
            let mut summary = RunSummary::new("images fill-missing");
            summary.dry_run = dry_run;

            let options = FillOptions {
                asset_id,
                channel_id: config.channel_id,
                products: !skip_products,
                variants: !skip_variants,
                collections: !skip_collections,
                dry_run,
            };
            let report =
                catsync_db::fill_missing_featured_assets(pool, &config.schema, options).await?;

            summary.assets_assigned = report.products + report.variants + report.collections;
            summary.finish();
            Ok(summary)
        }
    }
}
