use catsync_core::AppConfig;
use clap::Subcommand;

use crate::input::InputArgs;

#[derive(Debug, Subcommand)]
pub enum InspectCommands {
    /// List the workbook's sheets and the header row of the selected sheet
    Headers {
        #[command(flatten)]
        input: InputArgs,
    },
}

pub(crate) fn run_inspect(config: AppConfig, command: InspectCommands) -> anyhow::Result<()> {
    match command {
        InspectCommands::Headers { input } => run_headers(&input.apply(config)),
    }
}

fn run_headers(config: &AppConfig) -> anyhow::Result<()> {
    let path = config.input_path()?;
    let overview = catsync_core::sheet::overview(
        path,
        config.sheet_name.as_deref(),
        config.csv_delimiter,
    )?;

    println!("file:   {}", path.display());
    println!("sheets: {}", overview.sheets.join(", "));
    println!("sheet:  {} ({} data rows)", overview.selected, overview.data_rows);
    for (idx, header) in overview.headers.iter().enumerate() {
        println!("  {:>3}  {header}", idx + 1);
    }

    let expected = std::iter::once(&config.columns.sku).chain(config.columns.levels.iter());
    let missing: Vec<&str> = expected
        .filter(|col| !overview.headers.contains(*col))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        println!("missing configured columns: {}", missing.join(", "));
    }
    Ok(())
}
