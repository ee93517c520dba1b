//! Set operations on the catalog's `(owner, member)` join tables.
//!
//! Table and column names come from a validated [`JoinTable`]; they are
//! interpolated as quoted identifiers, ids always travel as bind parameters.

use catsync_core::{JoinTable, MembershipScope};
use sqlx::PgPool;

use crate::DbError;

/// Double-quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

struct Names {
    table: String,
    owner: String,
    member: String,
}

impl Names {
    fn of(join: &JoinTable) -> Self {
        Self {
            table: quote_ident(&join.table),
            owner: quote_ident(&join.owner_column),
            member: quote_ident(&join.member_column),
        }
    }
}

fn scope_ids(scope: &MembershipScope) -> Option<Vec<i64>> {
    match scope {
        MembershipScope::Nodes(ids) => Some(ids.clone()),
        MembershipScope::All => None,
    }
}

fn split_pairs(pairs: &[(i64, i64)]) -> (Vec<i64>, Vec<i64>) {
    pairs.iter().copied().unzip()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Existing `(owner, member)` rows for `owners`, limited to `scope`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn existing_memberships(
    pool: &PgPool,
    join: &JoinTable,
    owners: &[i64],
    scope: &MembershipScope,
) -> Result<Vec<(i64, i64)>, DbError> {
    if owners.is_empty() {
        return Ok(Vec::new());
    }
    let n = Names::of(join);
    let sql = format!(
        "SELECT {owner}::bigint, {member}::bigint \
         FROM {table} \
         WHERE {owner} = ANY($1) \
           AND ($2::bigint[] IS NULL OR {member} = ANY($2))",
        owner = n.owner,
        member = n.member,
        table = n.table,
    );

    let rows = sqlx::query_as::<_, (i64, i64)>(&sql)
        .bind(owners)
        .bind(scope_ids(scope))
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Count the rows [`clear_memberships`] would delete.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_memberships(
    pool: &PgPool,
    join: &JoinTable,
    owners: Option<&[i64]>,
    scope: &MembershipScope,
) -> Result<u64, DbError> {
    if matches!(scope, MembershipScope::Nodes(ids) if ids.is_empty()) {
        return Ok(0);
    }
    let n = Names::of(join);
    let sql = format!(
        "SELECT COUNT(*) FROM {table} \
         WHERE ($1::bigint[] IS NULL OR {owner} = ANY($1)) \
           AND ($2::bigint[] IS NULL OR {member} = ANY($2))",
        table = n.table,
        owner = n.owner,
        member = n.member,
    );

    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(owners.map(<[i64]>::to_vec))
        .bind(scope_ids(scope))
        .fetch_one(pool)
        .await?;

    Ok(u64::try_from(count).unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert pairs that are not present yet. Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_memberships(
    pool: &PgPool,
    join: &JoinTable,
    pairs: &[(i64, i64)],
) -> Result<u64, DbError> {
    if pairs.is_empty() {
        return Ok(0);
    }
    let n = Names::of(join);
    // NOT EXISTS covers join tables without a unique key; ON CONFLICT covers
    // a concurrent writer on tables that have one.
    let sql = format!(
        "INSERT INTO {table} ({owner}, {member}) \
         SELECT p.owner_id, p.member_id \
         FROM UNNEST($1::bigint[], $2::bigint[]) AS p(owner_id, member_id) \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM {table} x \
             WHERE x.{owner} = p.owner_id AND x.{member} = p.member_id \
         ) \
         ON CONFLICT DO NOTHING",
        table = n.table,
        owner = n.owner,
        member = n.member,
    );
    let (owners, members) = split_pairs(pairs);

    let result = sqlx::query(&sql)
        .bind(owners)
        .bind(members)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete exactly `pairs`. Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_memberships(
    pool: &PgPool,
    join: &JoinTable,
    pairs: &[(i64, i64)],
) -> Result<u64, DbError> {
    if pairs.is_empty() {
        return Ok(0);
    }
    let n = Names::of(join);
    let sql = format!(
        "DELETE FROM {table} x \
         USING UNNEST($1::bigint[], $2::bigint[]) AS p(owner_id, member_id) \
         WHERE x.{owner} = p.owner_id AND x.{member} = p.member_id",
        table = n.table,
        owner = n.owner,
        member = n.member,
    );
    let (owners, members) = split_pairs(pairs);

    let result = sqlx::query(&sql)
        .bind(owners)
        .bind(members)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every row whose member is in `scope`, optionally only for `owners`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_memberships(
    pool: &PgPool,
    join: &JoinTable,
    owners: Option<&[i64]>,
    scope: &MembershipScope,
) -> Result<u64, DbError> {
    if matches!(scope, MembershipScope::Nodes(ids) if ids.is_empty()) {
        return Ok(0);
    }
    let n = Names::of(join);
    let sql = format!(
        "DELETE FROM {table} \
         WHERE ($1::bigint[] IS NULL OR {owner} = ANY($1)) \
           AND ($2::bigint[] IS NULL OR {member} = ANY($2))",
        table = n.table,
        owner = n.owner,
        member = n.member,
    );

    let result = sqlx::query(&sql)
        .bind(owners.map(<[i64]>::to_vec))
        .bind(scope_ids(scope))
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_wraps_and_escapes() {
        assert_eq!(quote_ident("productId"), "\"productId\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn scope_all_binds_null() {
        assert_eq!(scope_ids(&MembershipScope::All), None);
        assert_eq!(scope_ids(&MembershipScope::Nodes(vec![3])), Some(vec![3]));
    }
}
