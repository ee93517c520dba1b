use std::path::{Path, PathBuf};

use crate::app_config::{AppConfig, CodePolicy, ColumnConfig, Environment};
use crate::schema::SchemaMapping;
use crate::sheet::CellOptions;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_batch = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let n = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if n == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(n)
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = non_empty("DATABASE_URL");
    let env = parse_environment(&or_default("CATSYNC_ENV", "development"))?;
    let log_level = or_default("CATSYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CATSYNC_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("CATSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CATSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let excel_path = non_empty("EXCEL_PATH").map(PathBuf::from);
    let sheet_name = non_empty("SHEET_NAME");
    let csv_delimiter = parse_delimiter(&or_default("CSV_DELIMITER", ";"))?;

    let defaults = ColumnConfig::default();
    let columns = ColumnConfig {
        sku: or_default("SKU_COL", &defaults.sku),
        levels: defaults
            .levels
            .iter()
            .enumerate()
            .map(|(idx, default)| or_default(&format!("CAT{}_COL", idx + 1), default))
            .collect(),
    };

    let lang_code = or_default("LANG_CODE", "pt");
    let channel_id = parse_i64("CHANNEL_ID", "1")?;
    let facet_code_prefix = or_default("FACET_CODE_PREFIX", "cat");
    let code_policy = parse_code_policy(&or_default("CODE_POLICY", "full-path"))?;
    let cells = CellOptions {
        strip_numeric_suffix: parse_bool(
            "STRIP_NUMERIC_SUFFIX",
            &or_default("STRIP_NUMERIC_SUFFIX", "true"),
        )?,
    };

    let sku_batch_size = parse_batch("SKU_BATCH_SIZE", "500")?;
    let apply_batch_size = parse_batch("APPLY_BATCH_SIZE", "500")?;
    let progress_every = parse_batch("PROGRESS_EVERY", "500")?;

    let schema = match non_empty("CATSYNC_SCHEMA_PATH") {
        Some(path) => load_schema_mapping(Path::new(&path))?,
        None => SchemaMapping::vendure_v3(),
    };

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        excel_path,
        sheet_name,
        csv_delimiter,
        columns,
        lang_code,
        channel_id,
        facet_code_prefix,
        code_policy,
        cells,
        sku_batch_size,
        apply_batch_size,
        progress_every,
        schema,
    })
}

impl AppConfig {
    /// Connection string for the catalog database. Only commands that open a
    /// pool need it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` is unset.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// The spreadsheet to read, or [`ConfigError::MissingInput`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingInput`] when neither `EXCEL_PATH` nor a
    /// CLI override supplied a path.
    pub fn input_path(&self) -> Result<&Path, ConfigError> {
        self.excel_path
            .as_deref()
            .ok_or(ConfigError::MissingInput("EXCEL_PATH"))
    }

    /// The sheet to read. CSV inputs have a single implicit sheet and do not
    /// need one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingInput`] when the input is a workbook and
    /// no sheet name was configured.
    pub fn input_sheet(&self) -> Result<Option<&str>, ConfigError> {
        let is_csv = self
            .excel_path
            .as_deref()
            .is_some_and(crate::sheet::is_csv_path);
        match (self.sheet_name.as_deref(), is_csv) {
            (Some(name), _) => Ok(Some(name)),
            (None, true) => Ok(None),
            (None, false) => Err(ConfigError::MissingInput("SHEET_NAME")),
        }
    }

    /// Apply `--file` / `--sheet` overrides from the command line.
    #[must_use]
    pub fn with_input(mut self, path: Option<PathBuf>, sheet: Option<String>) -> Self {
        if path.is_some() {
            self.excel_path = path;
        }
        if sheet.is_some() {
            self.sheet_name = sheet;
        }
        self
    }
}

fn load_schema_mapping(path: &Path) -> Result<SchemaMapping, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::SchemaFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mapping: SchemaMapping =
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::SchemaFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    mapping.validate().map_err(|e| ConfigError::SchemaFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(mapping)
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATSYNC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_code_policy(s: &str) -> Result<CodePolicy, ConfigError> {
    match s {
        "full-path" => Ok(CodePolicy::FullPath),
        "leaf" => Ok(CodePolicy::Leaf),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CODE_POLICY".to_string(),
            reason: format!("expected \"full-path\" or \"leaf\", got \"{other}\""),
        }),
    }
}

fn parse_bool(var: &str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

fn parse_delimiter(s: &str) -> Result<u8, ConfigError> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::InvalidEnvVar {
            var: "CSV_DELIMITER".to_string(),
            reason: format!("expected a single ASCII character, got \"{s}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
