//! Spreadsheet input: reading `.xlsx`/`.xls`/`.ods` sheets and `.csv` exports
//! into header-keyed rows, and normalizing cells into trimmed strings.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use calamine::{open_workbook_auto, Data, Reader};
use regex::Regex;

use crate::error::SheetError;

static ZERO_FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.0+$").expect("valid zero-fraction regex"));

/// One spreadsheet cell, decoupled from the reader that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A raw record keyed by header name.
pub type RawRow = BTreeMap<String, Cell>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOptions {
    /// Render integral numbers without a fractional part: a SKU typed into a
    /// numeric cell comes back as `123.0` and must match `123`.
    pub strip_numeric_suffix: bool,
}

impl Default for CellOptions {
    fn default() -> Self {
        Self {
            strip_numeric_suffix: true,
        }
    }
}

/// The recognized fields of one row as trimmed strings.
///
/// Columns that were requested but absent from the sheet read as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    fields: BTreeMap<String, String>,
}

impl NormalizedRow {
    /// The normalized value of `column`, or `""` when missing.
    #[must_use]
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map_or("", String::as_str)
    }

    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Normalize a single cell.
///
/// Text is trimmed and internal whitespace runs collapse to one space.
#[must_use]
pub fn normalize_cell(cell: &Cell, options: CellOptions) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => {
            let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
            if options.strip_numeric_suffix {
                if let Some(caps) = ZERO_FRACTION.captures(&collapsed) {
                    return caps[1].to_string();
                }
            }
            collapsed
        }
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => {
            if options.strip_numeric_suffix {
                f.to_string()
            } else {
                format!("{f:?}")
            }
        }
        Cell::Bool(b) => b.to_string(),
    }
}

/// Pick `columns` out of a raw row and normalize them.
#[must_use]
pub fn normalize_row(raw: &RawRow, columns: &[&str], options: CellOptions) -> NormalizedRow {
    let fields = columns
        .iter()
        .map(|col| {
            let value = raw
                .get(*col)
                .map(|cell| normalize_cell(cell, options))
                .unwrap_or_default();
            ((*col).to_string(), value)
        })
        .collect();
    NormalizedRow { fields }
}

/// Whether `path` should be read as a delimited text export.
#[must_use]
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Summary of a workbook for `inspect headers`.
#[derive(Debug, Clone)]
pub struct SheetOverview {
    pub sheets: Vec<String>,
    pub selected: String,
    pub headers: Vec<String>,
    pub data_rows: usize,
}

/// Read every data row of `sheet` (ignored for CSV inputs).
///
/// Rows whose cells are all empty are dropped.
///
/// # Errors
///
/// Returns [`SheetError::MissingSheet`] when the workbook has no sheet with
/// that name, and [`SheetError::Open`] / [`SheetError::Csv`] on read failures.
pub fn read_rows(
    path: &Path,
    sheet: Option<&str>,
    csv_delimiter: u8,
) -> Result<Vec<RawRow>, SheetError> {
    let (_, headers, rows) = load(path, sheet, csv_delimiter)?;
    Ok(rows
        .into_iter()
        .map(|cells| headers.iter().cloned().zip(cells).collect::<RawRow>())
        .collect())
}

/// Sheet names, the header row, and the row count of the selected sheet.
///
/// When `sheet` is `None` the first sheet is selected.
///
/// # Errors
///
/// Same as [`read_rows`].
pub fn overview(
    path: &Path,
    sheet: Option<&str>,
    csv_delimiter: u8,
) -> Result<SheetOverview, SheetError> {
    let (sheets, headers, rows) = load(path, sheet, csv_delimiter)?;
    let selected = sheet
        .map(str::to_string)
        .or_else(|| sheets.first().cloned())
        .unwrap_or_default();
    Ok(SheetOverview {
        sheets,
        selected,
        headers,
        data_rows: rows.len(),
    })
}

type Loaded = (Vec<String>, Vec<String>, Vec<Vec<Cell>>);

fn load(path: &Path, sheet: Option<&str>, csv_delimiter: u8) -> Result<Loaded, SheetError> {
    if is_csv_path(path) {
        let (headers, rows) = load_csv(path, csv_delimiter)?;
        return Ok((vec![csv_sheet_name(path)], headers, rows));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let sheets = workbook.sheet_names();

    let name = match sheet {
        Some(name) => name.to_string(),
        None => sheets.first().cloned().ok_or_else(|| SheetError::Open {
            path: path.to_path_buf(),
            reason: "workbook has no sheets".to_string(),
        })?,
    };
    if !sheets.iter().any(|s| *s == name) {
        return Err(SheetError::MissingSheet {
            path: path.to_path_buf(),
            sheet: name,
            available: sheets.join(", "),
        });
    }

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| SheetError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| SheetError::NoHeader {
            path: path.to_path_buf(),
            sheet: name.clone(),
        })?
        .iter()
        .map(|d| d.to_string().trim().to_string())
        .collect();

    let body = rows
        .map(|r| r.iter().map(Cell::from).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| *c != Cell::Empty))
        .collect();

    Ok((sheets, headers, body))
}

fn load_csv(path: &Path, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<Cell>>), SheetError> {
    let csv_err = |source| SheetError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let cells: Vec<Cell> = record
            .iter()
            .map(|v| {
                if v.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(v.to_string())
                }
            })
            .collect();
        if cells.iter().any(|c| *c != Cell::Empty) {
            rows.push(cells);
        }
    }
    Ok((headers, rows))
}

fn csv_sheet_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("csv")
        .to_string()
}

#[cfg(test)]
#[path = "sheet_test.rs"]
mod tests;
