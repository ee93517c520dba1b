//! [`CatalogStore`] over the host catalog's Postgres tables.

use async_trait::async_trait;
use catsync_core::{
    AppConfig, BoxError, CatalogStore, CollectionFilter, CollectionRecord, MembershipKind,
    MembershipScope, NodeKey, NodeKind, SchemaMapping, SkuTarget,
};
use sqlx::PgPool;

use crate::{collections, facets, memberships, variants};

/// Reconciler storage backed by a connection pool.
///
/// Translations are written and looked up in `lang_code`; new facets, facet
/// values and collections are assigned to `channel_id`.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    mapping: SchemaMapping,
    lang_code: String,
    channel_id: i64,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool, mapping: SchemaMapping, lang_code: &str, channel_id: i64) -> Self {
        Self {
            pool,
            mapping,
            lang_code: lang_code.to_string(),
            channel_id,
        }
    }

    #[must_use]
    pub fn from_app_config(pool: PgPool, config: &AppConfig) -> Self {
        Self::new(pool, config.schema.clone(), &config.lang_code, config.channel_id)
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }
}

fn parent_of(key: &NodeKey) -> Result<i64, BoxError> {
    key.parent
        .ok_or_else(|| format!("{} \"{}\" has no parent", key.kind, key.code).into())
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_node(&self, key: &NodeKey) -> Result<Option<i64>, BoxError> {
        let id = match key.kind {
            NodeKind::Facet => facets::find_facet(&self.pool, &key.code).await?,
            NodeKind::FacetValue => {
                facets::find_facet_value(&self.pool, parent_of(key)?, &key.code).await?
            }
            NodeKind::Collection => {
                collections::find_collection(&self.pool, parent_of(key)?, &key.code, &self.lang_code)
                    .await?
            }
        };
        Ok(id)
    }

    async fn create_node(&self, key: &NodeKey, name: &str) -> Result<i64, BoxError> {
        let id = match key.kind {
            NodeKind::Facet => {
                facets::create_facet(&self.pool, &key.code, name, &self.lang_code, self.channel_id)
                    .await?
            }
            NodeKind::FacetValue => {
                facets::create_facet_value(
                    &self.pool,
                    parent_of(key)?,
                    &key.code,
                    name,
                    &self.lang_code,
                    self.channel_id,
                )
                .await?
            }
            NodeKind::Collection => {
                collections::create_collection(
                    &self.pool,
                    parent_of(key)?,
                    &key.code,
                    name,
                    &self.lang_code,
                    self.channel_id,
                )
                .await?
            }
        };
        tracing::debug!(kind = %key.kind, code = %key.code, id, "node created");
        Ok(id)
    }

    async fn lookup_skus(&self, skus: &[String]) -> Result<Vec<(String, SkuTarget)>, BoxError> {
        Ok(variants::lookup_skus(&self.pool, skus).await?)
    }

    async fn existing_memberships(
        &self,
        kind: MembershipKind,
        owners: &[i64],
        scope: &MembershipScope,
    ) -> Result<Vec<(i64, i64)>, BoxError> {
        let join = self.mapping.join_for(kind);
        Ok(memberships::existing_memberships(&self.pool, join, owners, scope).await?)
    }

    async fn insert_memberships(
        &self,
        kind: MembershipKind,
        pairs: &[(i64, i64)],
    ) -> Result<u64, BoxError> {
        let join = self.mapping.join_for(kind);
        Ok(memberships::insert_memberships(&self.pool, join, pairs).await?)
    }

    async fn delete_memberships(
        &self,
        kind: MembershipKind,
        pairs: &[(i64, i64)],
    ) -> Result<u64, BoxError> {
        let join = self.mapping.join_for(kind);
        Ok(memberships::delete_memberships(&self.pool, join, pairs).await?)
    }

    async fn count_memberships(
        &self,
        kind: MembershipKind,
        owners: Option<&[i64]>,
        scope: &MembershipScope,
    ) -> Result<u64, BoxError> {
        let join = self.mapping.join_for(kind);
        Ok(memberships::count_memberships(&self.pool, join, owners, scope).await?)
    }

    async fn clear_memberships(
        &self,
        kind: MembershipKind,
        owners: Option<&[i64]>,
        scope: &MembershipScope,
    ) -> Result<u64, BoxError> {
        let join = self.mapping.join_for(kind);
        Ok(memberships::clear_memberships(&self.pool, join, owners, scope).await?)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionRecord>, BoxError> {
        let rows = collections::list_collections(&self.pool, &self.lang_code).await?;
        Ok(rows.into_iter().map(CollectionRecord::from).collect())
    }

    async fn root_collection(&self) -> Result<Option<i64>, BoxError> {
        Ok(collections::root_collection_id(&self.pool).await?)
    }

    async fn update_collection_filters(&self, filter: &CollectionFilter) -> Result<(), BoxError> {
        Ok(collections::update_collection_filters(&self.pool, filter).await?)
    }

    async fn facet_value_ids(&self, facet_id: i64) -> Result<Vec<i64>, BoxError> {
        Ok(facets::facet_value_ids(&self.pool, facet_id).await?)
    }

    async fn delete_facet_values(&self, ids: &[i64]) -> Result<u64, BoxError> {
        let joins = [
            &self.mapping.product_facet_join,
            &self.mapping.variant_facet_join,
        ];
        Ok(facets::delete_facet_values(&self.pool, &joins, ids).await?)
    }
}
