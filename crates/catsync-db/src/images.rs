//! Placeholder-image fill for products, variants and collections without a
//! featured asset.

use catsync_core::{AssetTable, SchemaMapping};
use sqlx::{PgPool, Postgres, Transaction};

use crate::memberships::quote_ident;
use crate::DbError;

/// Which entities to fill and where the placeholder lives.
#[derive(Debug, Clone, Copy)]
pub struct FillOptions {
    pub asset_id: i64,
    pub channel_id: i64,
    pub products: bool,
    pub variants: bool,
    pub collections: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Products whose featured asset was set (or would be, in a dry run).
    pub products: u64,
    pub variants: u64,
    pub collections: u64,
    /// Asset link rows inserted.
    pub links: u64,
}

/// Tables the fill walks. Collections are never soft-deleted.
#[derive(Debug, Clone, Copy)]
enum Owner {
    Product,
    Variant,
    Collection,
}

impl Owner {
    fn table(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Variant => "product_variant",
            Self::Collection => "collection",
        }
    }

    fn missing_clause(self) -> &'static str {
        match self {
            Self::Product | Self::Variant => {
                "\"featuredAssetId\" IS NULL AND \"deletedAt\" IS NULL"
            }
            Self::Collection => "\"featuredAssetId\" IS NULL",
        }
    }

    fn assets(self, mapping: &SchemaMapping) -> &AssetTable {
        match self {
            Self::Product => &mapping.product_asset,
            Self::Variant => &mapping.variant_asset,
            Self::Collection => &mapping.collection_asset,
        }
    }
}

/// Give every live product, variant or collection without a featured asset
/// the placeholder asset: link it at position 1 and make it featured.
/// Already-linked pairs are not duplicated, so the fill can be rerun safely.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the asset does not exist, or
/// [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn fill_missing_featured_assets(
    pool: &PgPool,
    mapping: &SchemaMapping,
    options: FillOptions,
) -> Result<FillReport, DbError> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM asset WHERE id = $1)")
        .bind(options.asset_id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(DbError::NotFound(format!("asset {}", options.asset_id)));
    }

    let mut report = FillReport::default();

    if options.dry_run {
        if options.products {
            report.products = count_missing(&mut tx, Owner::Product).await?;
        }
        if options.variants {
            report.variants = count_missing(&mut tx, Owner::Variant).await?;
        }
        if options.collections {
            report.collections = count_missing(&mut tx, Owner::Collection).await?;
        }
        tx.rollback().await?;
        return Ok(report);
    }

    sqlx::query(
        "INSERT INTO asset_channels_channel (\"assetId\", \"channelId\") \
         VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(options.asset_id)
    .bind(options.channel_id)
    .execute(&mut *tx)
    .await?;

    let passes = [
        (Owner::Product, options.products),
        (Owner::Variant, options.variants),
        (Owner::Collection, options.collections),
    ];
    for (owner, enabled) in passes {
        if !enabled {
            continue;
        }
        let ids = set_featured(&mut tx, owner, options.asset_id).await?;
        let filled = ids.len() as u64;
        match owner {
            Owner::Product => report.products = filled,
            Owner::Variant => report.variants = filled,
            Owner::Collection => report.collections = filled,
        }
        report.links += link_asset(&mut tx, owner.assets(mapping), &ids, options.asset_id).await?;
    }

    tx.commit().await?;
    tracing::info!(
        asset_id = options.asset_id,
        products = report.products,
        variants = report.variants,
        collections = report.collections,
        links = report.links,
        "placeholder asset assigned"
    );
    Ok(report)
}

async fn count_missing(tx: &mut Transaction<'_, Postgres>, owner: Owner) -> Result<u64, DbError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        quote_ident(owner.table()),
        owner.missing_clause()
    );
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(&mut **tx)
        .await?;
    Ok(u64::try_from(count).unwrap_or(0))
}

async fn set_featured(
    tx: &mut Transaction<'_, Postgres>,
    owner: Owner,
    asset_id: i64,
) -> Result<Vec<i64>, DbError> {
    let sql = format!(
        "UPDATE {} SET \"featuredAssetId\" = $1, \"updatedAt\" = now() \
         WHERE {} \
         RETURNING id::bigint",
        quote_ident(owner.table()),
        owner.missing_clause()
    );
    let ids = sqlx::query_scalar::<_, i64>(&sql)
        .bind(asset_id)
        .fetch_all(&mut **tx)
        .await?;
    Ok(ids)
}

async fn link_asset(
    tx: &mut Transaction<'_, Postgres>,
    assets: &AssetTable,
    owners: &[i64],
    asset_id: i64,
) -> Result<u64, DbError> {
    if owners.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "INSERT INTO {table} ({owner}, {member}, {position}, \"createdAt\", \"updatedAt\") \
         SELECT o.owner_id, $2, 1, now(), now() \
         FROM UNNEST($1::bigint[]) AS o(owner_id) \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM {table} x \
             WHERE x.{owner} = o.owner_id AND x.{member} = $2 \
         )",
        table = quote_ident(&assets.join.table),
        owner = quote_ident(&assets.join.owner_column),
        member = quote_ident(&assets.join.member_column),
        position = quote_ident(&assets.position_column),
    );
    let result = sqlx::query(&sql)
        .bind(owners)
        .bind(asset_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_have_no_soft_delete_filter() {
        assert!(!Owner::Collection.missing_clause().contains("deletedAt"));
        assert!(Owner::Variant.missing_clause().contains("deletedAt"));
    }

    #[test]
    fn each_owner_uses_its_own_asset_table() {
        let mapping = SchemaMapping::vendure_v3();
        assert_eq!(Owner::Collection.assets(&mapping).join.table, "collection_asset");
        assert_eq!(Owner::Product.assets(&mapping).join.table, "product_asset");
    }
}
