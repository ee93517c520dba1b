use std::path::PathBuf;

use thiserror::Error;

use crate::reconcile::{MembershipKind, NodeKind};

/// Boxed error from a [`crate::CatalogStore`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("missing input: {0} is not set and no CLI override was given")]
    MissingInput(&'static str),

    #[error("failed to read schema mapping {path}: {reason}")]
    SchemaFile { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("sheet \"{sheet}\" not found in {path}; available sheets: {available}")]
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: String,
    },

    #[error("sheet \"{sheet}\" in {path} has no header row")]
    NoHeader { path: PathBuf, sheet: String },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema mapping field {field} is not a plain SQL identifier: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("schema mapping {version}: column {table}.{column} does not exist")]
    MissingColumn {
        version: String,
        table: String,
        column: String,
    },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to create {kind} node \"{code}\": {source}")]
    NodeCreation {
        kind: NodeKind,
        code: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to apply {kind} batch of {pairs} rows (owners {owners:?}): {source}")]
    BatchApply {
        kind: MembershipKind,
        pairs: usize,
        owners: Vec<i64>,
        #[source]
        source: BoxError,
    },

    #[error("catalog lookup failed while {context}: {source}")]
    Lookup {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to update filters of collection {id}: {source}")]
    CollectionUpdate {
        id: i64,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("the catalog has no root collection")]
    MissingRoot,
}

impl ReconcileError {
    pub(crate) fn lookup(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Lookup {
            context: context.into(),
            source: source.into(),
        }
    }
}
