//! In-memory [`CatalogStore`] for engine tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    CatalogStore, CollectionFilter, CollectionRecord, MembershipKind, MembershipScope, NodeKey,
    NodeKind, SkuTarget,
};
use crate::error::BoxError;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    nodes: HashMap<NodeKey, i64>,
    names: HashMap<i64, String>,
    skus: HashMap<String, SkuTarget>,
    memberships: HashMap<MembershipKind, BTreeSet<(i64, i64)>>,
    collections: Vec<CollectionRecord>,
    filters: HashMap<i64, CollectionFilter>,
    find_calls: usize,
    create_calls: usize,
    lookup_calls: usize,
    insert_calls: usize,
    fail_creates: bool,
    fail_inserts: bool,
}

impl Inner {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// A store with a root collection, returning it and the root's id.
    pub(crate) fn with_root() -> (Self, i64) {
        let store = Self::default();
        let root = {
            let mut inner = store.lock();
            let id = inner.next();
            inner.collections.push(CollectionRecord {
                id,
                parent_id: None,
                is_root: true,
                slug: "root".into(),
                name: "__root_collection__".into(),
            });
            id
        };
        (store, root)
    }

    pub(crate) fn seed_sku(&self, sku: &str, variant_id: i64, product_id: i64) {
        self.lock().skus.insert(
            sku.to_string(),
            SkuTarget {
                variant_id,
                product_id,
            },
        );
    }

    pub(crate) fn seed_membership(&self, kind: MembershipKind, owner: i64, member: i64) {
        self.lock()
            .memberships
            .entry(kind)
            .or_default()
            .insert((owner, member));
    }

    pub(crate) fn memberships(&self, kind: MembershipKind) -> BTreeSet<(i64, i64)> {
        self.lock()
            .memberships
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn node_id(&self, key: &NodeKey) -> Option<i64> {
        self.lock().nodes.get(key).copied()
    }

    pub(crate) fn node_count(&self, kind: NodeKind) -> usize {
        self.lock().nodes.keys().filter(|k| k.kind == kind).count()
    }

    pub(crate) fn filter_for(&self, collection_id: i64) -> Option<CollectionFilter> {
        self.lock().filters.get(&collection_id).cloned()
    }

    pub(crate) fn find_calls(&self) -> usize {
        self.lock().find_calls
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub(crate) fn lookup_calls(&self) -> usize {
        self.lock().lookup_calls
    }

    pub(crate) fn insert_calls(&self) -> usize {
        self.lock().insert_calls
    }

    pub(crate) fn fail_creates(&self) {
        self.lock().fail_creates = true;
    }

    pub(crate) fn fail_inserts(&self) {
        self.lock().fail_inserts = true;
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_node(&self, key: &NodeKey) -> Result<Option<i64>, BoxError> {
        let mut inner = self.lock();
        inner.find_calls += 1;
        Ok(inner.nodes.get(key).copied())
    }

    async fn create_node(&self, key: &NodeKey, name: &str) -> Result<i64, BoxError> {
        let mut inner = self.lock();
        inner.create_calls += 1;
        if inner.fail_creates {
            return Err("duplicate key value violates unique constraint".into());
        }
        if inner.nodes.contains_key(key) {
            return Err(format!("node {} already exists", key.code).into());
        }
        let id = inner.next();
        inner.nodes.insert(key.clone(), id);
        inner.names.insert(id, name.to_string());
        if key.kind == NodeKind::Collection {
            inner.collections.push(CollectionRecord {
                id,
                parent_id: key.parent,
                is_root: false,
                slug: key.code.clone(),
                name: name.to_string(),
            });
        }
        Ok(id)
    }

    async fn lookup_skus(&self, skus: &[String]) -> Result<Vec<(String, SkuTarget)>, BoxError> {
        let mut inner = self.lock();
        inner.lookup_calls += 1;
        Ok(skus
            .iter()
            .filter_map(|s| inner.skus.get(s).map(|t| (s.clone(), *t)))
            .collect())
    }

    async fn existing_memberships(
        &self,
        kind: MembershipKind,
        owners: &[i64],
        scope: &MembershipScope,
    ) -> Result<Vec<(i64, i64)>, BoxError> {
        let inner = self.lock();
        Ok(inner
            .memberships
            .get(&kind)
            .map(|set| {
                set.iter()
                    .filter(|(o, m)| owners.contains(o) && scope.contains(*m))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_memberships(
        &self,
        kind: MembershipKind,
        pairs: &[(i64, i64)],
    ) -> Result<u64, BoxError> {
        let mut inner = self.lock();
        inner.insert_calls += 1;
        if inner.fail_inserts {
            return Err("insert or update violates foreign key constraint".into());
        }
        let set = inner.memberships.entry(kind).or_default();
        let mut n = 0;
        for pair in pairs {
            if set.insert(*pair) {
                n += 1;
            }
        }
        Ok(n)
    }

    async fn delete_memberships(
        &self,
        kind: MembershipKind,
        pairs: &[(i64, i64)],
    ) -> Result<u64, BoxError> {
        let mut inner = self.lock();
        let set = inner.memberships.entry(kind).or_default();
        let mut n = 0;
        for pair in pairs {
            if set.remove(pair) {
                n += 1;
            }
        }
        Ok(n)
    }

    async fn count_memberships(
        &self,
        kind: MembershipKind,
        owners: Option<&[i64]>,
        scope: &MembershipScope,
    ) -> Result<u64, BoxError> {
        let inner = self.lock();
        let count = inner.memberships.get(&kind).map_or(0, |set| {
            set.iter()
                .filter(|(o, m)| owners.is_none_or(|ids| ids.contains(o)) && scope.contains(*m))
                .count()
        });
        Ok(count as u64)
    }

    async fn clear_memberships(
        &self,
        kind: MembershipKind,
        owners: Option<&[i64]>,
        scope: &MembershipScope,
    ) -> Result<u64, BoxError> {
        let mut inner = self.lock();
        let set = inner.memberships.entry(kind).or_default();
        let before = set.len();
        set.retain(|(o, m)| !(owners.is_none_or(|ids| ids.contains(o)) && scope.contains(*m)));
        Ok((before - set.len()) as u64)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionRecord>, BoxError> {
        Ok(self.lock().collections.clone())
    }

    async fn root_collection(&self) -> Result<Option<i64>, BoxError> {
        Ok(self
            .lock()
            .collections
            .iter()
            .find(|c| c.is_root)
            .map(|c| c.id))
    }

    async fn update_collection_filters(&self, filter: &CollectionFilter) -> Result<(), BoxError> {
        self.lock()
            .filters
            .insert(filter.collection_id, filter.clone());
        Ok(())
    }

    async fn facet_value_ids(&self, facet_id: i64) -> Result<Vec<i64>, BoxError> {
        let mut ids: Vec<i64> = self
            .lock()
            .nodes
            .iter()
            .filter(|(k, _)| k.kind == NodeKind::FacetValue && k.parent == Some(facet_id))
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn delete_facet_values(&self, ids: &[i64]) -> Result<u64, BoxError> {
        let mut inner = self.lock();
        let before = inner.nodes.len();
        inner
            .nodes
            .retain(|k, id| !(k.kind == NodeKind::FacetValue && ids.contains(id)));
        let deleted = (before - inner.nodes.len()) as u64;
        for kind in [
            MembershipKind::ProductFacetValue,
            MembershipKind::VariantFacetValue,
        ] {
            if let Some(set) = inner.memberships.get_mut(&kind) {
                set.retain(|(_, m)| !ids.contains(m));
            }
        }
        Ok(deleted)
    }
}
