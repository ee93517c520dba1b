//! Spreadsheet arguments shared by the row-driven commands.

use std::path::PathBuf;

use catsync_core::{normalize_row, read_rows, AppConfig, NormalizedRow};
use clap::Args;

/// `--file` / `--sheet`, overriding `EXCEL_PATH` / `SHEET_NAME`.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Workbook (.xlsx/.xls/.ods) or .csv export to read
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Sheet to read; not needed for CSV inputs
    #[arg(long)]
    pub sheet: Option<String>,
}

impl InputArgs {
    pub fn apply(self, config: AppConfig) -> AppConfig {
        config.with_input(self.file, self.sheet)
    }
}

/// Parse `--levels`: how many category columns take part, 1 to 4.
pub fn parse_levels(raw: &str) -> Result<usize, String> {
    let levels: usize = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if (1..=4).contains(&levels) {
        Ok(levels)
    } else {
        Err(format!("levels must be between 1 and 4, got {levels}"))
    }
}

/// Read the configured input and normalize the columns in `columns`.
pub fn load_rows(config: &AppConfig, columns: &[&str]) -> anyhow::Result<Vec<NormalizedRow>> {
    let path = config.input_path()?;
    let sheet = config.input_sheet()?;
    tracing::info!(path = %path.display(), sheet = ?sheet, "reading input");

    let raw = read_rows(path, sheet, config.csv_delimiter)?;
    let rows: Vec<NormalizedRow> = raw
        .iter()
        .map(|r| normalize_row(r, columns, config.cells))
        .collect();

    tracing::info!(rows = rows.len(), "input loaded");
    Ok(rows)
}
