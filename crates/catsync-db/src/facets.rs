//! Database operations for facets and facet values.
//!
//! A facet or facet value is a base row plus a translation in the run's
//! language plus a channel assignment; creation writes all three in one
//! transaction.

use catsync_core::JoinTable;
use sqlx::PgPool;

use crate::memberships::quote_ident;
use crate::DbError;

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

/// Returns the id of the facet with `code`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_facet(pool: &PgPool, code: &str) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id::bigint FROM facet WHERE code = $1 ORDER BY id LIMIT 1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Creates a public facet with a translation and a channel assignment.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn create_facet(
    pool: &PgPool,
    code: &str,
    name: &str,
    lang_code: &str,
    channel_id: i64,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO facet (code, \"isPrivate\", \"createdAt\", \"updatedAt\") \
         VALUES ($1, false, now(), now()) \
         RETURNING id::bigint",
    )
    .bind(code)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO facet_translation (\"languageCode\", name, \"baseId\", \"createdAt\", \"updatedAt\") \
         VALUES ($1, $2, $3, now(), now())",
    )
    .bind(lang_code)
    .bind(name)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO facet_channels_channel (\"facetId\", \"channelId\") \
         VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(channel_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

// ---------------------------------------------------------------------------
// Facet values
// ---------------------------------------------------------------------------

/// Returns the oldest value of `facet_id` with `code`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_facet_value(
    pool: &PgPool,
    facet_id: i64,
    code: &str,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id::bigint FROM facet_value \
         WHERE \"facetId\" = $1 AND code = $2 \
         ORDER BY id LIMIT 1",
    )
    .bind(facet_id)
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Creates a facet value under `facet_id` with a translation and a channel
/// assignment.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn create_facet_value(
    pool: &PgPool,
    facet_id: i64,
    code: &str,
    name: &str,
    lang_code: &str,
    channel_id: i64,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO facet_value (code, \"facetId\", \"createdAt\", \"updatedAt\") \
         VALUES ($1, $2, now(), now()) \
         RETURNING id::bigint",
    )
    .bind(code)
    .bind(facet_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO facet_value_translation (\"languageCode\", name, \"baseId\", \"createdAt\", \"updatedAt\") \
         VALUES ($1, $2, $3, now(), now())",
    )
    .bind(lang_code)
    .bind(name)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO facet_value_channels_channel (\"facetValueId\", \"channelId\") \
         VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(channel_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

/// Ids of every value of `facet_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn facet_value_ids(pool: &PgPool, facet_id: i64) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id::bigint FROM facet_value WHERE \"facetId\" = $1 ORDER BY id",
    )
    .bind(facet_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Deletes facet values together with their translations, channel rows and
/// product/variant memberships. Returns the number of values deleted.
///
/// `memberships` are the join tables that reference facet values as members.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is deleted then.
pub async fn delete_facet_values(
    pool: &PgPool,
    memberships: &[&JoinTable],
    ids: &[i64],
) -> Result<u64, DbError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut tx = pool.begin().await?;

    for join in memberships {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ANY($1)",
            quote_ident(&join.table),
            quote_ident(&join.member_column),
        );
        sqlx::query(&sql).bind(ids).execute(&mut *tx).await?;
    }

    sqlx::query("DELETE FROM facet_value_translation WHERE \"baseId\" = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM facet_value_channels_channel WHERE \"facetValueId\" = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM facet_value WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted)
}
