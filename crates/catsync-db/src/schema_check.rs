//! Startup check that a [`SchemaMapping`] names real tables and columns.

use catsync_core::{SchemaError, SchemaMapping};
use sqlx::PgPool;

use crate::DbError;

/// Confirm every table/column in `mapping` exists in the current schema.
///
/// Runs before any write so a wrong mapping never reaches the join tables.
///
/// # Errors
///
/// Returns [`DbError::Schema`] for an invalid identifier or the first missing
/// column, or [`DbError::Sqlx`] if the lookup fails.
pub async fn verify_schema_mapping(pool: &PgPool, mapping: &SchemaMapping) -> Result<(), DbError> {
    mapping.validate()?;

    for (table, column) in mapping.columns() {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM information_schema.columns \
                 WHERE table_schema = current_schema() \
                   AND table_name = $1 AND column_name = $2 \
             )",
        )
        .bind(table)
        .bind(column)
        .fetch_one(pool)
        .await?;

        if !exists {
            return Err(SchemaError::MissingColumn {
                version: mapping.version.clone(),
                table: table.to_string(),
                column: column.to_string(),
            }
            .into());
        }
    }

    tracing::debug!(version = %mapping.version, "schema mapping verified");
    Ok(())
}
