use super::{ReconcilerContext, RunSettings, SkipReason};
use crate::paths::{derive_paths, DerivedPath};
use crate::sheet::NormalizedRow;

/// A row that has a SKU and at least one category level.
#[derive(Debug, Clone)]
pub(crate) struct PreparedRow {
    pub sku: String,
    pub paths: Vec<DerivedPath>,
}

/// Derive paths for every row, counting rows without a SKU or category.
pub(crate) fn prepare_rows(
    rows: &[NormalizedRow],
    settings: &RunSettings,
    ctx: &mut ReconcilerContext,
) -> Vec<PreparedRow> {
    ctx.summary.rows_read += rows.len();

    let mut prepared = Vec::with_capacity(rows.len());
    for row in rows {
        let sku = row.get(&settings.sku_column);
        if sku.is_empty() {
            ctx.summary.skip(SkipReason::MissingSku);
            continue;
        }
        let paths = derive_paths(row, &settings.level_columns, settings.code_policy);
        if paths.is_empty() {
            ctx.summary.skip(SkipReason::NoCategory);
            continue;
        }
        prepared.push(PreparedRow {
            sku: sku.to_string(),
            paths,
        });
    }
    prepared
}

/// Log progress every `every` items.
pub(crate) fn log_progress(stage: &str, done: usize, total: usize, every: usize) {
    if every > 0 && done % every == 0 {
        tracing::info!(stage, done, total, "progress");
    }
}
