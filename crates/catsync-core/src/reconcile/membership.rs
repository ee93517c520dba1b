use std::collections::{BTreeMap, BTreeSet};

use super::{CatalogStore, MembershipKind, MembershipMode, MembershipScope, ReconcilerContext};
use crate::error::{BoxError, ReconcileError};

/// Planned `owner → members` assignments for one join.
#[derive(Debug, Clone)]
pub struct MembershipPlan {
    kind: MembershipKind,
    owners: BTreeMap<i64, BTreeSet<i64>>,
}

impl MembershipPlan {
    #[must_use]
    pub fn new(kind: MembershipKind) -> Self {
        Self {
            kind,
            owners: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> MembershipKind {
        self.kind
    }

    pub fn add(&mut self, owner: i64, member: i64) {
        self.owners.entry(owner).or_default().insert(member);
    }

    /// Number of distinct owners in the plan.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Total planned pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.owners.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn members_of(&self, owner: i64) -> Option<&BTreeSet<i64>> {
        self.owners.get(&owner)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Apply `plan` in chunks of `batch_size` owners.
///
/// Both modes diff against what is stored, so repeated runs write nothing:
/// - [`MembershipMode::Additive`] inserts missing pairs only.
/// - [`MembershipMode::Replace`] also deletes pairs of touched owners whose
///   member is inside `scope` but not planned. Retained pairs are left alone.
///
/// In dry-run mode the diff is counted but not written.
///
/// # Errors
///
/// [`ReconcileError::Lookup`] when reading existing rows fails and
/// [`ReconcileError::BatchApply`] when a delete or insert fails. The run
/// stops at the first failing batch.
pub async fn apply_memberships<S: CatalogStore + ?Sized>(
    store: &S,
    ctx: &mut ReconcilerContext,
    plan: &MembershipPlan,
    mode: MembershipMode,
    scope: &MembershipScope,
    batch_size: usize,
) -> Result<(), ReconcileError> {
    let kind = plan.kind;
    let owners: Vec<i64> = plan.owners.keys().copied().collect();
    let chunks = owners.chunks(batch_size.max(1));
    let total_chunks = chunks.len();

    tracing::info!(
        %kind,
        %mode,
        owners = owners.len(),
        pairs = plan.pair_count(),
        batches = total_chunks,
        "applying memberships"
    );

    for (idx, chunk) in chunks.enumerate() {
        let desired: BTreeSet<(i64, i64)> = chunk
            .iter()
            .flat_map(|owner| plan.owners[owner].iter().map(move |m| (*owner, *m)))
            .collect();

        let lookup_scope = match mode {
            MembershipMode::Replace => scope.clone(),
            MembershipMode::Additive => {
                let members: BTreeSet<i64> = desired.iter().map(|(_, m)| *m).collect();
                MembershipScope::Nodes(members.into_iter().collect())
            }
        };

        let existing: BTreeSet<(i64, i64)> = store
            .existing_memberships(kind, chunk, &lookup_scope)
            .await
            .map_err(|e| ReconcileError::lookup(format!("reading {kind} rows"), e))?
            .into_iter()
            .collect();

        let missing: Vec<(i64, i64)> = desired.difference(&existing).copied().collect();
        let stale: Vec<(i64, i64)> = match mode {
            MembershipMode::Replace => existing.difference(&desired).copied().collect(),
            MembershipMode::Additive => Vec::new(),
        };

        if ctx.dry_run {
            ctx.summary.add_removed(kind, stale.len() as u64);
            ctx.summary.add_inserted(kind, missing.len() as u64);
            continue;
        }

        if !stale.is_empty() {
            let removed = store
                .delete_memberships(kind, &stale)
                .await
                .map_err(|e| batch_error(kind, chunk, stale.len(), e))?;
            ctx.summary.add_removed(kind, removed);
        }

        if !missing.is_empty() {
            let inserted = store
                .insert_memberships(kind, &missing)
                .await
                .map_err(|e| batch_error(kind, chunk, missing.len(), e))?;
            ctx.summary.add_inserted(kind, inserted);
        }

        tracing::debug!(
            %kind,
            batch = idx + 1,
            of = total_chunks,
            inserted = missing.len(),
            removed = stale.len(),
            "membership batch applied"
        );
    }

    Ok(())
}

fn batch_error(kind: MembershipKind, owners: &[i64], pairs: usize, source: BoxError) -> ReconcileError {
    tracing::error!(%kind, pairs, owners = ?owners, error = %source, "membership batch failed");
    ReconcileError::BatchApply {
        kind,
        pairs,
        owners: owners.to_vec(),
        source,
    }
}

#[cfg(test)]
#[path = "membership_test.rs"]
mod tests;
