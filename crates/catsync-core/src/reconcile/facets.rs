use std::collections::BTreeSet;

use super::rows::{log_progress, prepare_rows};
use super::{
    apply_memberships, resolve_skus, CatalogStore, MembershipKind, MembershipMode,
    MembershipPlan, MembershipScope, NodeKey, NodeKind, ReconcilerContext, RunSettings,
    SkipReason,
};
use crate::error::ReconcileError;
use crate::sheet::NormalizedRow;

/// Build the `cat1..catN` facet taxonomy from `rows` and apply it to the
/// products and variants their SKUs resolve to.
///
/// With [`MembershipMode::Replace`] every touched product/variant ends up
/// holding exactly the derived values of the scope facets; values of other
/// facets are never removed.
///
/// # Errors
///
/// Fails fast on node creation, SKU lookup or membership batch errors.
pub async fn reconcile_facets<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    rows: &[NormalizedRow],
    settings: &RunSettings,
    mode: MembershipMode,
) -> Result<(), ReconcileError> {
    let facet_ids = ensure_facets(store, ctx, settings).await?;

    let prepared = prepare_rows(rows, settings, ctx);
    let skus = resolve_skus(
        store,
        prepared.iter().map(|r| r.sku.as_str()),
        settings.sku_batch_size,
    )
    .await?;

    let mut products = MembershipPlan::new(MembershipKind::ProductFacetValue);
    let mut variants = MembershipPlan::new(MembershipKind::VariantFacetValue);
    let mut planned_values = BTreeSet::new();

    for (idx, row) in prepared.iter().enumerate() {
        log_progress("facet rows", idx + 1, prepared.len(), settings.progress_every);

        let Some(target) = skus.get(&row.sku) else {
            ctx.summary.skip(SkipReason::UnknownSku);
            continue;
        };

        for path in &row.paths {
            let value_id = match ctx.paths.get(NodeKind::FacetValue, &path.levels) {
                Some(id) => id,
                None => {
                    let key = NodeKey::facet_value(facet_ids[path.depth - 1], &path.code);
                    let id = ctx.ensure_node(store, &key, &path.display_name).await?;
                    ctx.paths.insert(NodeKind::FacetValue, &path.levels, id);
                    id
                }
            };
            planned_values.insert(value_id);
            products.add(target.product_id, value_id);
            variants.add(target.variant_id, value_id);
        }
        ctx.summary.rows_processed += 1;
    }

    tracing::info!(
        rows = ctx.summary.rows_processed,
        products = products.owner_count(),
        variants = variants.owner_count(),
        values = planned_values.len(),
        "facet plan built"
    );

    let scope = scope_values(store, &facet_ids, planned_values).await?;
    for plan in [&products, &variants] {
        apply_memberships(store, ctx, plan, mode, &scope, settings.apply_batch_size).await?;
    }
    Ok(())
}

/// Remove every product/variant membership of the scope facets, and
/// optionally the facet values themselves. Missing facets are skipped.
///
/// A dry run counts the rows that would go instead of deleting them.
///
/// # Errors
///
/// [`ReconcileError::Lookup`] on read failures and
/// [`ReconcileError::BatchApply`] when a delete fails.
pub async fn clear_facets<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    settings: &RunSettings,
    delete_values: bool,
) -> Result<(), ReconcileError> {
    let mut values = Vec::new();
    for level in 1..=settings.depth() {
        let code = settings.facet_code(level);
        let Some(facet_id) = ctx.find_node(store, &NodeKey::facet(&code)).await? else {
            tracing::warn!(facet = %code, "facet does not exist; nothing to clear");
            continue;
        };
        let ids = store
            .facet_value_ids(facet_id)
            .await
            .map_err(|e| ReconcileError::lookup(format!("listing values of facet {code}"), e))?;
        tracing::info!(facet = %code, values = ids.len(), "clearing facet");
        values.extend(ids);
    }

    if values.is_empty() {
        return Ok(());
    }

    let scope = MembershipScope::Nodes(values.clone());
    for kind in [
        MembershipKind::ProductFacetValue,
        MembershipKind::VariantFacetValue,
    ] {
        let removed = if ctx.dry_run {
            store
                .count_memberships(kind, None, &scope)
                .await
                .map_err(|e| ReconcileError::lookup(format!("counting {kind} rows"), e))?
        } else {
            store
                .clear_memberships(kind, None, &scope)
                .await
                .map_err(|source| ReconcileError::BatchApply {
                    kind,
                    pairs: 0,
                    owners: Vec::new(),
                    source,
                })?
        };
        ctx.summary.add_removed(kind, removed);
    }

    if !delete_values {
        return Ok(());
    }
    ctx.summary.facet_values_deleted = if ctx.dry_run {
        tracing::info!(values = values.len(), "dry-run: would delete facet values");
        values.len() as u64
    } else {
        store
            .delete_facet_values(&values)
            .await
            .map_err(|e| ReconcileError::lookup("deleting facet values", e))?
    };
    Ok(())
}

/// One `column == value` → facet value rule for [`tag_matching_rows`].
#[derive(Debug, Clone)]
pub struct TagRule {
    pub column: String,
    pub value: String,
    pub facet_code: String,
    pub facet_value_code: String,
    pub ignore_case: bool,
    pub products: bool,
    pub variants: bool,
}

impl TagRule {
    #[must_use]
    pub fn matches(&self, cell: &str) -> bool {
        let (a, b) = (cell.trim(), self.value.trim());
        if self.ignore_case {
            a.to_uppercase() == b.to_uppercase()
        } else {
            a == b
        }
    }
}

/// Attach one existing facet value to every SKU whose row matches `rule`.
///
/// Additive only.
///
/// # Errors
///
/// [`ReconcileError::NotFound`] when the facet or facet value does not exist.
pub async fn tag_matching_rows<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    rows: &[NormalizedRow],
    sku_column: &str,
    rule: &TagRule,
    settings: &RunSettings,
) -> Result<(), ReconcileError> {
    let facet_id = ctx
        .find_node(store, &NodeKey::facet(&rule.facet_code))
        .await?
        .ok_or_else(|| {
            ReconcileError::NotFound(format!("facet {} does not exist", rule.facet_code))
        })?;
    let value_id = ctx
        .find_node(store, &NodeKey::facet_value(facet_id, &rule.facet_value_code))
        .await?
        .ok_or_else(|| {
            ReconcileError::NotFound(format!(
                "facet value {} does not exist in facet {}",
                rule.facet_value_code, rule.facet_code
            ))
        })?;

    ctx.summary.rows_read += rows.len();
    let mut matched = Vec::new();
    for row in rows {
        let sku = row.get(sku_column);
        if sku.is_empty() {
            ctx.summary.skip(SkipReason::MissingSku);
        } else if !rule.matches(row.get(&rule.column)) {
            ctx.summary.skip(SkipReason::FilterMismatch);
        } else {
            matched.push(sku);
        }
    }
    tracing::info!(
        matched = matched.len(),
        column = %rule.column,
        value = %rule.value,
        "rows matched"
    );

    let skus = resolve_skus(store, matched.iter().copied(), settings.sku_batch_size).await?;

    let mut products = MembershipPlan::new(MembershipKind::ProductFacetValue);
    let mut variants = MembershipPlan::new(MembershipKind::VariantFacetValue);
    for sku in matched {
        let Some(target) = skus.get(sku) else {
            ctx.summary.skip(SkipReason::UnknownSku);
            continue;
        };
        products.add(target.product_id, value_id);
        variants.add(target.variant_id, value_id);
        ctx.summary.rows_processed += 1;
    }

    let scope = MembershipScope::Nodes(vec![value_id]);
    let plans = [(rule.products, &products), (rule.variants, &variants)];
    for (_, plan) in plans.into_iter().filter(|(enabled, _)| *enabled) {
        apply_memberships(
            store,
            ctx,
            plan,
            MembershipMode::Additive,
            &scope,
            settings.apply_batch_size,
        )
        .await?;
    }
    Ok(())
}

async fn ensure_facets<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    settings: &RunSettings,
) -> Result<Vec<i64>, ReconcileError> {
    let mut ids = Vec::with_capacity(settings.depth());
    for level in 1..=settings.depth() {
        let key = NodeKey::facet(settings.facet_code(level));
        let id = ctx
            .ensure_node(store, &key, &format!("Category {level}"))
            .await?;
        tracing::info!(facet = %key.code, id, "facet ready");
        ids.push(id);
    }
    Ok(ids)
}

/// Every value of the scope facets, stored or planned in this run.
async fn scope_values<S: CatalogStore + ?Sized>(
    store: &S,
    facet_ids: &[i64],
    planned: BTreeSet<i64>,
) -> Result<MembershipScope, ReconcileError> {
    let mut all = planned;
    for facet_id in facet_ids.iter().copied().filter(|id| *id > 0) {
        let ids = store
            .facet_value_ids(facet_id)
            .await
            .map_err(|e| ReconcileError::lookup(format!("listing values of facet {facet_id}"), e))?;
        all.extend(ids);
    }
    Ok(MembershipScope::Nodes(all.into_iter().collect()))
}

#[cfg(test)]
#[path = "facets_test.rs"]
mod tests;
