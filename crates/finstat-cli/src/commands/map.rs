//! Map command - look up values for standard line items in OCR text.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use finstat_core::export::{self, Table};
use finstat_core::statement::{map_line_items, MappedLineItem, Mapping};

use super::{load_config, write_output, OutputFormat};

/// Arguments for the map command.
#[derive(Args)]
pub struct MapArgs {
    /// Text file with the statement's raw OCR text
    #[arg(required = true)]
    input: PathBuf,

    /// JSON file with an array of {"original": ..., "standard": ...} mappings
    #[arg(long, required = true)]
    mappings: PathBuf,

    /// Output file (default: stdout, or the configured workbook name for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: OutputFormat,
}

pub async fn run(args: MapArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = fs::read_to_string(&args.input)?;
    let mappings: Vec<Mapping> = serde_json::from_str(&fs::read_to_string(&args.mappings)?)
        .map_err(|e| anyhow::anyhow!("Invalid mappings file {}: {}", args.mappings.display(), e))?;

    let items = map_line_items(&text, &mappings);
    info!("Mapped {} of {} line items", items.len(), mappings.len());

    let table = Table::from_mapping(&items, &config.export.mapping_sheet_name);
    let bytes = match args.format {
        OutputFormat::Json => export::to_json(&items)?.into_bytes(),
        OutputFormat::Csv => export::to_csv(&table)?.into_bytes(),
        OutputFormat::Xlsx => export::to_xlsx(&table, &config.export)?,
        OutputFormat::Text => format_text(&items).into_bytes(),
    };

    let written = write_output(
        &bytes,
        args.format,
        args.output.as_deref(),
        &config.export.file_name,
    )?;
    if let Some(path) = written {
        eprintln!("{} Output written to {}", style("✓").green(), path.display());
    }

    Ok(())
}

fn format_text(items: &[MappedLineItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} -> {}: {}\n", item.original, item.standard, item.value))
        .collect()
}
