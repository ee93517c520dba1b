//! SKU lookups against `product_variant`.

use catsync_core::SkuTarget;
use sqlx::PgPool;

use crate::DbError;

/// Resolve SKUs to their live variant and product.
///
/// Soft-deleted variants are ignored. When a SKU is shared by several live
/// variants the oldest one wins. Unknown SKUs are simply absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn lookup_skus(pool: &PgPool, skus: &[String]) -> Result<Vec<(String, SkuTarget)>, DbError> {
    if skus.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, (String, i64, i64)>(
        "SELECT DISTINCT ON (pv.sku) pv.sku, pv.id::bigint, pv.\"productId\"::bigint \
         FROM product_variant pv \
         WHERE pv.sku = ANY($1) AND pv.\"deletedAt\" IS NULL \
         ORDER BY pv.sku, pv.id",
    )
    .bind(skus)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(sku, variant_id, product_id)| {
            (
                sku,
                SkuTarget {
                    variant_id,
                    product_id,
                },
            )
        })
        .collect())
}
