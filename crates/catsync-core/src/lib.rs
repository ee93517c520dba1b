pub mod app_config;
pub mod config;
pub mod error;
pub mod paths;
pub mod reconcile;
pub mod schema;
pub mod sheet;
pub mod slug;

pub use app_config::{AppConfig, CodePolicy, ColumnConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{BoxError, ConfigError, ReconcileError, SchemaError, SheetError};
pub use paths::{derive_paths, DerivedPath};
pub use reconcile::{
    CatalogStore, CollectionFilter, CollectionRecord, MembershipKind, MembershipMode,
    MembershipScope, NodeKey, NodeKind, ReconcilerContext, RunSettings, RunSummary, SkipReason,
    SkuTarget, TagRule,
};
pub use schema::{AssetTable, JoinTable, SchemaMapping};
pub use sheet::{normalize_row, read_rows, Cell, CellOptions, NormalizedRow, RawRow};
pub use slug::slugify;
