use std::collections::{BTreeSet, HashMap};

use super::{CatalogStore, SkuTarget};
use crate::error::ReconcileError;

/// SKU → catalog entities, built once per run and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct SkuIndex {
    targets: HashMap<String, SkuTarget>,
    requested: usize,
}

impl SkuIndex {
    #[must_use]
    pub fn get(&self, sku: &str) -> Option<SkuTarget> {
        self.targets.get(sku).copied()
    }

    /// Distinct SKUs that resolved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Distinct SKUs that were asked for but are not in the catalog.
    #[must_use]
    pub fn missing(&self) -> usize {
        self.requested - self.targets.len()
    }
}

/// Resolve distinct, non-empty SKUs in chunks of `batch_size`.
///
/// Unknown SKUs are simply absent from the index.
///
/// # Errors
///
/// [`ReconcileError::Lookup`] when a chunk lookup fails.
pub async fn resolve_skus<S, I>(
    store: &S,
    skus: I,
    batch_size: usize,
) -> Result<SkuIndex, ReconcileError>
where
    S: CatalogStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let distinct: Vec<String> = skus
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut targets = HashMap::with_capacity(distinct.len());
    for (idx, chunk) in distinct.chunks(batch_size.max(1)).enumerate() {
        let found = store.lookup_skus(chunk).await.map_err(|e| {
            ReconcileError::lookup(format!("resolving SKU chunk {}", idx + 1), e)
        })?;
        targets.extend(found);
    }

    tracing::info!(
        requested = distinct.len(),
        resolved = targets.len(),
        missing = distinct.len() - targets.len(),
        "resolved SKUs"
    );

    Ok(SkuIndex {
        targets,
        requested: distinct.len(),
    })
}
