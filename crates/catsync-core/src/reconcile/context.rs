use std::collections::HashMap;

use super::{CatalogStore, NodeKey, NodeKind, RunSummary};
use crate::error::ReconcileError;

/// Category path (its level values) → node id, per node kind.
///
/// This is the explicit path → node mapping later stages use instead of
/// re-deriving or guessing placement. Keys are the level lists, not the
/// joined text, so a level value containing the separator never aliases a
/// deeper path.
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: HashMap<(NodeKind, Vec<String>), i64>,
}

impl PathIndex {
    pub fn insert(&mut self, kind: NodeKind, levels: &[String], id: i64) {
        self.entries.insert((kind, levels.to_vec()), id);
    }

    #[must_use]
    pub fn get(&self, kind: NodeKind, levels: &[String]) -> Option<i64> {
        self.entries.get(&(kind, levels.to_vec())).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-run state: the node cache, the path index and the run counters.
///
/// One context lives for exactly one run and is passed by reference into
/// each stage.
#[derive(Debug)]
pub struct ReconcilerContext {
    nodes: HashMap<NodeKey, i64>,
    pub paths: PathIndex,
    pub summary: RunSummary,
    /// When set, nodes that do not exist yet are not created.
    pub dry_run: bool,
    next_placeholder: i64,
}

impl ReconcilerContext {
    #[must_use]
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            paths: PathIndex::default(),
            summary: RunSummary::new(job),
            dry_run: false,
            next_placeholder: -1,
        }
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self.summary.dry_run = dry_run;
        self
    }

    /// Return the id of the node for `key`, creating it if the store has none.
    ///
    /// The in-run cache is consulted first, then the store, so each distinct
    /// key costs at most one lookup and one create per run. In dry-run mode
    /// a missing node is counted as created and cached under a negative
    /// placeholder id, which is never written anywhere.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Lookup`] when the store lookup fails and
    /// [`ReconcileError::NodeCreation`] when the insert is rejected.
    pub async fn ensure_node<S: CatalogStore + ?Sized>(
        &mut self,
        store: &S,
        key: &NodeKey,
        name: &str,
    ) -> Result<i64, ReconcileError> {
        if let Some(id) = self.nodes.get(key) {
            return Ok(*id);
        }

        let found = store
            .find_node(key)
            .await
            .map_err(|e| ReconcileError::lookup(format!("finding {} {}", key.kind, key.code), e))?;

        if let Some(id) = found {
            self.summary.node_reused(key.kind);
            self.nodes.insert(key.clone(), id);
            return Ok(id);
        }

        if self.dry_run {
            tracing::info!(kind = %key.kind, code = %key.code, "dry-run: would create node");
            let id = self.next_placeholder;
            self.next_placeholder -= 1;
            self.summary.node_created(key.kind);
            self.nodes.insert(key.clone(), id);
            return Ok(id);
        }

        let id = store
            .create_node(key, name)
            .await
            .map_err(|source| ReconcileError::NodeCreation {
                kind: key.kind,
                code: key.code.clone(),
                source,
            })?;

        tracing::debug!(kind = %key.kind, code = %key.code, id, "created node");
        self.summary.node_created(key.kind);
        self.nodes.insert(key.clone(), id);
        Ok(id)
    }

    /// Look `key` up without ever creating it.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Lookup`] when the store lookup fails.
    pub async fn find_node<S: CatalogStore + ?Sized>(
        &mut self,
        store: &S,
        key: &NodeKey,
    ) -> Result<Option<i64>, ReconcileError> {
        if let Some(id) = self.nodes.get(key) {
            return Ok(Some(*id));
        }
        let found = store
            .find_node(key)
            .await
            .map_err(|e| ReconcileError::lookup(format!("finding {} {}", key.kind, key.code), e))?;
        if let Some(id) = found {
            self.nodes.insert(key.clone(), id);
        }
        Ok(found)
    }

    /// Finish the run and hand back its counters.
    #[must_use]
    pub fn into_summary(mut self) -> RunSummary {
        self.summary.finish();
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::memory::MemoryStore;

    #[tokio::test]
    async fn ensure_node_creates_once_and_caches() {
        let store = MemoryStore::default();
        let mut ctx = ReconcilerContext::new("test");
        let key = NodeKey::facet("cat1");

        let a = ctx.ensure_node(&store, &key, "Category 1").await.unwrap();
        let b = ctx.ensure_node(&store, &key, "Category 1").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(store.create_calls(), 1);
        assert_eq!(store.find_calls(), 1);
        assert_eq!(ctx.summary.created(NodeKind::Facet), 1);
    }

    #[tokio::test]
    async fn ensure_node_reuses_existing_store_rows() {
        let store = MemoryStore::default();
        let key = NodeKey::facet("cat1");
        let existing = store.create_node(&key, "Category 1").await.unwrap();

        let mut ctx = ReconcilerContext::new("test");
        let id = ctx.ensure_node(&store, &key, "ignored").await.unwrap();

        assert_eq!(id, existing);
        assert_eq!(store.create_calls(), 1);
        assert_eq!(ctx.summary.created(NodeKind::Facet), 0);
        assert_eq!(ctx.summary.nodes_reused.get(&NodeKind::Facet), Some(&1));
    }

    #[tokio::test]
    async fn dry_run_does_not_create() {
        let store = MemoryStore::default();
        let mut ctx = ReconcilerContext::new("test").dry_run(true);
        let key = NodeKey::facet("cat1");
        let a = ctx.ensure_node(&store, &key, "Category 1").await.unwrap();
        let b = ctx.ensure_node(&store, &key, "Category 1").await.unwrap();

        assert!(a < 0);
        assert_eq!(a, b);
        assert_eq!(store.create_calls(), 0);
        assert_eq!(ctx.summary.created(NodeKind::Facet), 1);
    }

    #[tokio::test]
    async fn rejected_create_is_a_node_creation_error() {
        let store = MemoryStore::default();
        store.fail_creates();
        let mut ctx = ReconcilerContext::new("test");
        let err = ctx
            .ensure_node(&store, &NodeKey::facet("cat1"), "Category 1")
            .await
            .unwrap_err();
        assert!(
            matches!(err, ReconcileError::NodeCreation { kind: NodeKind::Facet, ref code, .. } if code == "cat1"),
            "got: {err:?}"
        );
    }

    #[test]
    fn path_index_is_keyed_by_kind() {
        let path = vec!["A".to_string(), "B".to_string()];
        let mut idx = PathIndex::default();
        idx.insert(NodeKind::FacetValue, &path, 5);
        assert_eq!(idx.get(NodeKind::FacetValue, &path), Some(5));
        assert_eq!(idx.get(NodeKind::Collection, &path), None);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn path_index_does_not_alias_joined_text() {
        let deep = vec!["A".to_string(), "B".to_string()];
        let flat = vec!["A | B".to_string()];
        let mut idx = PathIndex::default();
        idx.insert(NodeKind::FacetValue, &deep, 5);
        assert_eq!(idx.get(NodeKind::FacetValue, &flat), None);
        idx.insert(NodeKind::FacetValue, &flat, 6);
        assert_eq!(idx.get(NodeKind::FacetValue, &deep), Some(5));
        assert_eq!(idx.len(), 2);
    }
}
