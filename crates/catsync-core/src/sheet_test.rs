use std::path::PathBuf;

use super::*;

fn opts() -> CellOptions {
    CellOptions::default()
}

fn write_temp_csv(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("catsync-{}-{name}.csv", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn empty_cell_becomes_empty_string() {
    assert_eq!(normalize_cell(&Cell::Empty, opts()), "");
    assert_eq!(normalize_cell(&Cell::Text("   ".into()), opts()), "");
}

#[test]
fn text_is_trimmed_and_whitespace_collapsed() {
    assert_eq!(
        normalize_cell(&Cell::Text("  Tyres \t  Racing  ".into()), opts()),
        "Tyres Racing"
    );
}

#[test]
fn integral_float_drops_fraction() {
    assert_eq!(normalize_cell(&Cell::Float(123.0), opts()), "123");
    assert_eq!(normalize_cell(&Cell::Float(1.5), opts()), "1.5");
}

#[test]
fn integral_float_keeps_fraction_when_disabled() {
    let raw = CellOptions {
        strip_numeric_suffix: false,
    };
    assert_eq!(normalize_cell(&Cell::Float(123.0), raw), "123.0");
    assert_eq!(normalize_cell(&Cell::Text("123.0".into()), raw), "123.0");
}

#[test]
fn numeric_text_with_zero_fraction_is_stripped() {
    assert_eq!(normalize_cell(&Cell::Text("4410.00".into()), opts()), "4410");
    assert_eq!(normalize_cell(&Cell::Text("4410.05".into()), opts()), "4410.05");
    assert_eq!(normalize_cell(&Cell::Text("AB.0".into()), opts()), "AB.0");
}

#[test]
fn int_and_bool_render_plainly() {
    assert_eq!(normalize_cell(&Cell::Int(77), opts()), "77");
    assert_eq!(normalize_cell(&Cell::Bool(true), opts()), "true");
}

#[test]
fn normalize_row_defaults_missing_columns() {
    let mut raw = RawRow::new();
    raw.insert("SKU".into(), Cell::Float(991.0));
    raw.insert("Cat1".into(), Cell::Text(" Tyres ".into()));
    raw.insert("Unused".into(), Cell::Text("ignored".into()));

    let row = normalize_row(&raw, &["SKU", "Cat1", "Cat2"], opts());
    assert_eq!(row.get("SKU"), "991");
    assert_eq!(row.get("Cat1"), "Tyres");
    assert_eq!(row.get("Cat2"), "");
    assert_eq!(row.get("Unused"), "");
}

#[test]
fn column_lookup_is_case_sensitive() {
    let mut raw = RawRow::new();
    raw.insert("sku".into(), Cell::Text("A1".into()));
    let row = normalize_row(&raw, &["SKU"], opts());
    assert_eq!(row.get("SKU"), "");
}

#[test]
fn csv_extension_is_detected_case_insensitively() {
    assert!(is_csv_path(Path::new("/tmp/export.CSV")));
    assert!(is_csv_path(Path::new("export.csv")));
    assert!(!is_csv_path(Path::new("export.xlsx")));
    assert!(!is_csv_path(Path::new("export")));
}

#[test]
fn read_rows_parses_semicolon_csv_and_skips_blank_lines() {
    let path = write_temp_csv(
        "read-rows",
        "SKU;Categoryn1;Categoryn2\nA1;Tyres;Racing\n;;\nB2;Helmets;\n",
    );
    let rows = read_rows(&path, None, b';').unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("SKU"), Some(&Cell::Text("A1".into())));
    assert_eq!(rows[0].get("Categoryn2"), Some(&Cell::Text("Racing".into())));
    assert_eq!(rows[1].get("Categoryn2"), Some(&Cell::Empty));
}

#[test]
fn read_rows_tolerates_short_records() {
    let path = write_temp_csv("short", "SKU,Categoryn1,Categoryn2\nA1,Tyres\n");
    let rows = read_rows(&path, None, b',').unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 1);
    assert!(rows[0].get("Categoryn2").is_none());
    let row = normalize_row(&rows[0], &["SKU", "Categoryn2"], opts());
    assert_eq!(row.get("Categoryn2"), "");
}

#[test]
fn overview_reports_headers_and_row_count() {
    let path = write_temp_csv("overview", "SKU;Categoryn1\nA1;Tyres\nA2;Tyres\n");
    let info = overview(&path, None, b';').unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(info.headers, vec!["SKU", "Categoryn1"]);
    assert_eq!(info.data_rows, 2);
    assert_eq!(info.sheets.len(), 1);
}

#[test]
fn missing_workbook_is_an_open_error() {
    let err = read_rows(Path::new("/nonexistent/catalog.xlsx"), Some("PHC"), b';').unwrap_err();
    assert!(matches!(err, SheetError::Open { .. }), "got: {err:?}");
}

#[test]
fn missing_csv_is_a_csv_error() {
    let err = read_rows(Path::new("/nonexistent/catalog.csv"), None, b';').unwrap_err();
    assert!(matches!(err, SheetError::Csv { .. }), "got: {err:?}");
}
