//! Database operations for the collection tree.

use catsync_core::{CollectionFilter, CollectionRecord};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A collection with its translation in the run's language, if it has one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub is_root: bool,
    pub slug: Option<String>,
    pub name: Option<String>,
}

impl From<CollectionRow> for CollectionRecord {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            is_root: row.is_root,
            slug: row.slug.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the id of the root collection, or `None` on an empty catalog.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn root_collection_id(pool: &PgPool) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id::bigint FROM collection WHERE \"isRoot\" = true ORDER BY id LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Returns the oldest child of `parent_id` whose translation in `lang_code`
/// carries `slug`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_collection(
    pool: &PgPool,
    parent_id: i64,
    slug: &str,
    lang_code: &str,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT c.id::bigint \
         FROM collection c \
         JOIN collection_translation t ON t.\"baseId\" = c.id \
         WHERE c.\"parentId\" = $1 AND t.slug = $2 AND t.\"languageCode\" = $3 \
         ORDER BY c.id \
         LIMIT 1",
    )
    .bind(parent_id)
    .bind(slug)
    .bind(lang_code)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Returns every collection, root included, in id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collections(
    pool: &PgPool,
    lang_code: &str,
) -> Result<Vec<CollectionRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRow>(
        "SELECT c.id::bigint AS id, c.\"parentId\"::bigint AS parent_id, \
                c.\"isRoot\" AS is_root, t.slug, t.name \
         FROM collection c \
         LEFT JOIN collection_translation t \
           ON t.\"baseId\" = c.id AND t.\"languageCode\" = $1 \
         ORDER BY c.id",
    )
    .bind(lang_code)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Creates a public collection as the last child of `parent_id`, with a
/// translation and a channel assignment. New collections carry no filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn create_collection(
    pool: &PgPool,
    parent_id: i64,
    slug: &str,
    name: &str,
    lang_code: &str,
    channel_id: i64,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO collection \
             (\"parentId\", position, \"isRoot\", \"isPrivate\", filters, \"inheritFilters\", \
              \"createdAt\", \"updatedAt\") \
         SELECT $1, COALESCE(MAX(position), 0) + 1, false, false, '[]', true, now(), now() \
         FROM collection \
         WHERE \"parentId\" = $1 \
         RETURNING id::bigint",
    )
    .bind(parent_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO collection_translation \
             (\"languageCode\", name, slug, description, \"baseId\", \"createdAt\", \"updatedAt\") \
         VALUES ($1, $2, $3, '', $4, now(), now())",
    )
    .bind(lang_code)
    .bind(name)
    .bind(slug)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO collection_channels_channel (\"collectionId\", \"channelId\") \
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

/// Overwrites a collection's filters and `inheritFilters` flag.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the collection does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_collection_filters(
    pool: &PgPool,
    filter: &CollectionFilter,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection \
         SET filters = $1, \"inheritFilters\" = $2, \"updatedAt\" = now() \
         WHERE id = $3",
    )
    .bind(filter.filters_json().to_string())
    .bind(filter.inherit_filters)
    .bind(filter.collection_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!(
            "collection {}",
            filter.collection_id
        )));
    }
    Ok(())
}
