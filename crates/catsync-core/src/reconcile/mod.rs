//! Hierarchical taxonomy reconciler.
//!
//! Rows flow through four stages: normalization ([`crate::sheet`]), path
//! derivation ([`crate::paths`]), node materialization ([`ReconcilerContext`])
//! and membership application ([`membership`]). Every stage talks to the
//! catalog through [`CatalogStore`], so the same engine runs against Postgres
//! in production and an in-memory store in tests.

mod collections;
mod context;
mod facets;
pub mod filters;
pub mod membership;
mod rows;
mod skus;
mod summary;

#[cfg(test)]
pub(crate) mod memory;

use std::fmt;

use async_trait::async_trait;
use serde_json::json;

use crate::app_config::{AppConfig, CodePolicy};
use crate::error::BoxError;

pub use collections::{collection_filters, reset_collection_membership, sync_collections};
pub use context::{PathIndex, ReconcilerContext};
pub use facets::{clear_facets, reconcile_facets, tag_matching_rows, TagRule};
pub use membership::{apply_memberships, MembershipPlan};
pub use skus::{resolve_skus, SkuIndex};
pub use summary::{RunSummary, SkipReason};

/// The kinds of taxonomy node the reconciler materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Facet,
    FacetValue,
    Collection,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Facet => write!(f, "facet"),
            NodeKind::FacetValue => write!(f, "facet value"),
            NodeKind::Collection => write!(f, "collection"),
        }
    }
}

/// Persistent identity of a taxonomy node.
///
/// `parent` scopes the code the way the catalog does: facet values are unique
/// per facet, collections per parent collection, facets globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub parent: Option<i64>,
    pub code: String,
}

impl NodeKey {
    #[must_use]
    pub fn facet(code: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Facet,
            parent: None,
            code: code.into(),
        }
    }

    #[must_use]
    pub fn facet_value(facet_id: i64, code: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::FacetValue,
            parent: Some(facet_id),
            code: code.into(),
        }
    }

    #[must_use]
    pub fn collection(parent_id: i64, slug: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Collection,
            parent: Some(parent_id),
            code: slug.into(),
        }
    }
}

/// A join table between catalog entities, named by `(owner, member)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MembershipKind {
    /// `(product id, facet value id)`
    ProductFacetValue,
    /// `(variant id, facet value id)`
    VariantFacetValue,
    /// `(collection id, variant id)`
    CollectionVariant,
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipKind::ProductFacetValue => write!(f, "product-facet"),
            MembershipKind::VariantFacetValue => write!(f, "variant-facet"),
            MembershipKind::CollectionVariant => write!(f, "collection-variant"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MembershipMode {
    /// Insert missing pairs, never delete.
    Additive,
    /// Make each touched owner hold exactly the planned members within scope.
    #[default]
    Replace,
}

impl fmt::Display for MembershipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipMode::Additive => write!(f, "additive"),
            MembershipMode::Replace => write!(f, "replace"),
        }
    }
}

/// Which members a replace (or clear) may remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipScope {
    /// Only these member ids, e.g. the values of the `cat1..cat4` facets.
    Nodes(Vec<i64>),
    /// Every member of the join.
    All,
}

impl MembershipScope {
    #[must_use]
    pub fn contains(&self, member: i64) -> bool {
        match self {
            MembershipScope::Nodes(ids) => ids.contains(&member),
            MembershipScope::All => true,
        }
    }
}

/// Catalog entities a SKU resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkuTarget {
    pub variant_id: i64,
    pub product_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub is_root: bool,
    pub slug: String,
    pub name: String,
}

/// A `facet-value-filter` to store on one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFilter {
    pub collection_id: i64,
    pub facet_value_id: i64,
    pub inherit_filters: bool,
}

impl CollectionFilter {
    /// The collection's `filters` column value.
    ///
    /// Argument values are JSON-encoded strings, matching what the catalog's
    /// admin API writes.
    #[must_use]
    pub fn filters_json(&self) -> serde_json::Value {
        json!([{
            "code": "facet-value-filter",
            "args": [
                { "name": "facetValueIds", "value": format!("[\"{}\"]", self.facet_value_id) },
                { "name": "containsAny", "value": "false" },
            ],
        }])
    }
}

/// The catalog operations the reconciler needs.
///
/// Implementations return raw backend errors; the engine wraps them into
/// [`crate::ReconcileError`] with the stage that failed.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look a node up by its persistent identity.
    async fn find_node(&self, key: &NodeKey) -> Result<Option<i64>, BoxError>;

    /// Create a node with a display name in the configured language.
    async fn create_node(&self, key: &NodeKey, name: &str) -> Result<i64, BoxError>;

    /// Resolve a chunk of SKUs. Unknown SKUs are omitted.
    async fn lookup_skus(&self, skus: &[String]) -> Result<Vec<(String, SkuTarget)>, BoxError>;

    /// Existing `(owner, member)` pairs for `owners`, limited to `scope`.
    async fn existing_memberships(
        &self,
        kind: MembershipKind,
        owners: &[i64],
        scope: &MembershipScope,
    ) -> Result<Vec<(i64, i64)>, BoxError>;

    /// Insert pairs, ignoring ones already present. Returns rows inserted.
    async fn insert_memberships(
        &self,
        kind: MembershipKind,
        pairs: &[(i64, i64)],
    ) -> Result<u64, BoxError>;

    /// Delete exactly these pairs. Returns rows deleted.
    async fn delete_memberships(
        &self,
        kind: MembershipKind,
        pairs: &[(i64, i64)],
    ) -> Result<u64, BoxError>;

    /// Count the pairs [`CatalogStore::clear_memberships`] would delete.
    async fn count_memberships(
        &self,
        kind: MembershipKind,
        owners: Option<&[i64]>,
        scope: &MembershipScope,
    ) -> Result<u64, BoxError>;

    /// Delete every pair in `scope`, optionally only for `owners`.
    async fn clear_memberships(
        &self,
        kind: MembershipKind,
        owners: Option<&[i64]>,
        scope: &MembershipScope,
    ) -> Result<u64, BoxError>;

    async fn list_collections(&self) -> Result<Vec<CollectionRecord>, BoxError>;

    async fn root_collection(&self) -> Result<Option<i64>, BoxError>;

    async fn update_collection_filters(&self, filter: &CollectionFilter) -> Result<(), BoxError>;

    /// Ids of every value of a facet.
    async fn facet_value_ids(&self, facet_id: i64) -> Result<Vec<i64>, BoxError>;

    /// Delete facet values (and their memberships). Returns values deleted.
    async fn delete_facet_values(&self, ids: &[i64]) -> Result<u64, BoxError>;
}

/// Knobs shared by every row-driven job.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sku_column: String,
    pub level_columns: Vec<String>,
    pub facet_code_prefix: String,
    pub code_policy: CodePolicy,
    pub sku_batch_size: usize,
    pub apply_batch_size: usize,
    pub progress_every: usize,
}

impl RunSettings {
    /// Settings from config, restricted to the first `levels` category columns.
    #[must_use]
    pub fn from_config(config: &AppConfig, levels: usize) -> Self {
        Self {
            sku_column: config.columns.sku.clone(),
            level_columns: config.columns.levels_up_to(levels).to_vec(),
            facet_code_prefix: config.facet_code_prefix.clone(),
            code_policy: config.code_policy,
            sku_batch_size: config.sku_batch_size,
            apply_batch_size: config.apply_batch_size,
            progress_every: config.progress_every,
        }
    }

    /// Number of category levels in play.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.level_columns.len()
    }

    /// Facet code for a 1-based level, e.g. `cat2`.
    #[must_use]
    pub fn facet_code(&self, level: usize) -> String {
        format!("{}{level}", self.facet_code_prefix)
    }

    /// Every column a row needs for derivation.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(self.sku_column.as_str())
            .chain(self.level_columns.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_json_matches_catalog_shape() {
        let filter = CollectionFilter {
            collection_id: 9,
            facet_value_id: 42,
            inherit_filters: true,
        };
        let value = filter.filters_json();
        assert_eq!(value[0]["code"], "facet-value-filter");
        assert_eq!(value[0]["args"][0]["name"], "facetValueIds");
        assert_eq!(value[0]["args"][0]["value"], "[\"42\"]");
        assert_eq!(value[0]["args"][1]["value"], "false");
    }

    #[test]
    fn scope_contains() {
        assert!(MembershipScope::All.contains(7));
        assert!(MembershipScope::Nodes(vec![1, 2]).contains(2));
        assert!(!MembershipScope::Nodes(vec![1, 2]).contains(3));
    }

    #[test]
    fn settings_columns_put_sku_first() {
        let settings = RunSettings {
            sku_column: "SKU".into(),
            level_columns: vec!["C1".into(), "C2".into()],
            facet_code_prefix: "cat".into(),
            code_policy: CodePolicy::FullPath,
            sku_batch_size: 10,
            apply_batch_size: 10,
            progress_every: 10,
        };
        assert_eq!(settings.columns(), vec!["SKU", "C1", "C2"]);
        assert_eq!(settings.depth(), 2);
        assert_eq!(settings.facet_code(1), "cat1");
    }
}
