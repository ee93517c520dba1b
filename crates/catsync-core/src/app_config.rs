use std::path::PathBuf;

use crate::schema::SchemaMapping;
use crate::sheet::CellOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the persistent code of a derived taxonomy node is built.
///
/// One policy must be used for the whole lifetime of a taxonomy: switching
/// between them makes existing nodes unreachable by code and creates
/// duplicates on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodePolicy {
    /// Slug of the whole path (`"Tyres | Racing"` -> `tyres-racing`).
    #[default]
    FullPath,
    /// Slug of the last level only (`"Racing"` -> `racing`).
    Leaf,
}

impl std::fmt::Display for CodePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodePolicy::FullPath => write!(f, "full-path"),
            CodePolicy::Leaf => write!(f, "leaf"),
        }
    }
}

/// Spreadsheet column names for the SKU and the category levels, in level order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnConfig {
    pub sku: String,
    pub levels: Vec<String>,
}

impl ColumnConfig {
    /// The first `depth` level columns (all of them when `depth` exceeds the list).
    #[must_use]
    pub fn levels_up_to(&self, depth: usize) -> &[String] {
        &self.levels[..depth.min(self.levels.len())]
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            sku: "SKU_FROM_FILE1".to_string(),
            levels: (1..=4).map(|n| format!("Categoryn{n}")).collect(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub excel_path: Option<PathBuf>,
    pub sheet_name: Option<String>,
    pub csv_delimiter: u8,
    pub columns: ColumnConfig,
    pub lang_code: String,
    pub channel_id: i64,
    pub facet_code_prefix: String,
    pub code_policy: CodePolicy,
    pub cells: CellOptions,
    pub sku_batch_size: usize,
    pub apply_batch_size: usize,
    pub progress_every: usize,
    pub schema: SchemaMapping,
}

impl AppConfig {
    /// Facet code for a category level (1-based), e.g. `cat2`.
    #[must_use]
    pub fn facet_code(&self, level: usize) -> String {
        format!("{}{level}", self.facet_code_prefix)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("excel_path", &self.excel_path)
            .field("sheet_name", &self.sheet_name)
            .field("csv_delimiter", &char::from(self.csv_delimiter))
            .field("columns", &self.columns)
            .field("lang_code", &self.lang_code)
            .field("channel_id", &self.channel_id)
            .field("facet_code_prefix", &self.facet_code_prefix)
            .field("code_policy", &self.code_policy)
            .field("cells", &self.cells)
            .field("sku_batch_size", &self.sku_batch_size)
            .field("apply_batch_size", &self.apply_batch_size)
            .field("progress_every", &self.progress_every)
            .field("schema", &self.schema.version)
            .finish()
    }
}
