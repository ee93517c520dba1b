use super::filters::place_collections;
use super::rows::{log_progress, prepare_rows};
use super::{
    apply_memberships, resolve_skus, CatalogStore, MembershipKind, MembershipMode,
    MembershipPlan, MembershipScope, NodeKey, NodeKind, ReconcilerContext, RunSettings,
    SkipReason,
};
use crate::error::ReconcileError;
use crate::sheet::NormalizedRow;

/// Mirror the category tree as nested collections under the root collection
/// and make every collection on a row's path hold that row's variant.
///
/// Placement uses the path index built while creating the tree: a path's
/// parent collection is the one created for its parent path.
///
/// # Errors
///
/// [`ReconcileError::MissingRoot`] when the catalog has no root collection,
/// otherwise fails fast on creation, lookup and batch errors.
pub async fn sync_collections<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    rows: &[NormalizedRow],
    settings: &RunSettings,
    mode: MembershipMode,
) -> Result<(), ReconcileError> {
    let root = root_collection(store).await?;
    let prepared = prepare_rows(rows, settings, ctx);

    for (idx, row) in prepared.iter().enumerate() {
        log_progress("collection tree", idx + 1, prepared.len(), settings.progress_every);
        for path in &row.paths {
            if ctx.paths.get(NodeKind::Collection, &path.levels).is_some() {
                continue;
            }
            let parent = path
                .parent_levels()
                .and_then(|levels| ctx.paths.get(NodeKind::Collection, levels))
                .unwrap_or(root);
            let id = ctx
                .ensure_node(store, &NodeKey::collection(parent, &path.code), &path.display_name)
                .await?;
            ctx.paths.insert(NodeKind::Collection, &path.levels, id);
        }
    }
    tracing::info!(collections = ctx.paths.len(), "collection tree ready");

    let skus = resolve_skus(
        store,
        prepared.iter().map(|r| r.sku.as_str()),
        settings.sku_batch_size,
    )
    .await?;

    let mut plan = MembershipPlan::new(MembershipKind::CollectionVariant);
    for row in &prepared {
        let Some(target) = skus.get(&row.sku) else {
            ctx.summary.skip(SkipReason::UnknownSku);
            continue;
        };
        for path in &row.paths {
            if let Some(collection) = ctx.paths.get(NodeKind::Collection, &path.levels) {
                plan.add(collection, target.variant_id);
            }
        }
        ctx.summary.rows_processed += 1;
    }

    apply_memberships(
        store,
        ctx,
        &plan,
        mode,
        &MembershipScope::All,
        settings.apply_batch_size,
    )
    .await
}

/// Give each collection at depth `1..=N` a `facet-value-filter` on the facet
/// value of level `d` whose code matches the collection's path.
///
/// Nested collections inherit their parent's filters. The root, collections
/// deeper than `N` and collections outside the root's tree are untouched.
///
/// # Errors
///
/// [`ReconcileError::MissingRoot`], lookup errors, or
/// [`ReconcileError::CollectionUpdate`] when a filter cannot be written.
pub async fn collection_filters<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    settings: &RunSettings,
) -> Result<(), ReconcileError> {
    let root = root_collection(store).await?;

    let mut facet_ids = Vec::with_capacity(settings.depth());
    for level in 1..=settings.depth() {
        let code = settings.facet_code(level);
        let id = ctx.find_node(store, &NodeKey::facet(&code)).await?;
        if id.is_none() {
            tracing::warn!(facet = %code, "facet does not exist; its level gets no filters");
        }
        facet_ids.push(id);
    }

    let collections = store
        .list_collections()
        .await
        .map_err(|e| ReconcileError::lookup("listing collections", e))?;
    let placed = place_collections(&collections, root);

    for (idx, collection) in placed.iter().enumerate() {
        log_progress("collection filters", idx + 1, placed.len(), settings.progress_every);

        if collection.depth == 0 || collection.depth > settings.depth() {
            ctx.summary.skip(SkipReason::OutOfRangeDepth);
            continue;
        }

        let code = collection.code(settings.code_policy);
        let value = match facet_ids[collection.depth - 1] {
            Some(facet_id) => {
                ctx.find_node(store, &NodeKey::facet_value(facet_id, &code))
                    .await?
            }
            None => None,
        };
        let Some(value_id) = value else {
            tracing::warn!(
                collection = collection.id,
                depth = collection.depth,
                %code,
                "no facet value for collection path"
            );
            ctx.summary.skip(SkipReason::NoFacetValue);
            continue;
        };

        let filter = collection.filter(value_id);
        if !ctx.dry_run {
            store
                .update_collection_filters(&filter)
                .await
                .map_err(|source| ReconcileError::CollectionUpdate {
                    id: collection.id,
                    source,
                })?;
        }
        ctx.summary.collections_updated += 1;
    }

    Ok(())
}

/// Delete collection ↔ variant rows for `collections`, or for every
/// collection when the list is empty. A dry run only counts them.
///
/// # Errors
///
/// [`ReconcileError::BatchApply`] when the delete fails.
pub async fn reset_collection_membership<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    collections: &[i64],
) -> Result<(), ReconcileError> {
    let kind = MembershipKind::CollectionVariant;
    let owners = (!collections.is_empty()).then_some(collections);

    if ctx.dry_run {
        let count = store
            .count_memberships(kind, owners, &MembershipScope::All)
            .await
            .map_err(|e| ReconcileError::lookup("counting collection membership", e))?;
        tracing::info!(
            collections = ?owners,
            rows = count,
            "dry-run: would reset collection membership"
        );
        ctx.summary.add_removed(kind, count);
        return Ok(());
    }

    let removed = store
        .clear_memberships(kind, owners, &MembershipScope::All)
        .await
        .map_err(|source| ReconcileError::BatchApply {
            kind,
            pairs: 0,
            owners: collections.to_vec(),
            source,
        })?;
    ctx.summary.add_removed(kind, removed);
    Ok(())
}

async fn root_collection<S: CatalogStore + ?Sized>(store: &S) -> Result<i64, ReconcileError> {
    store
        .root_collection()
        .await
        .map_err(|e| ReconcileError::lookup("finding the root collection", e))?
        .ok_or(ReconcileError::MissingRoot)
}

#[cfg(test)]
#[path = "collections_test.rs"]
mod tests;
