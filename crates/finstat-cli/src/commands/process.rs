//! Process command - extract line items from a single statement file.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use finstat_core::{OcrEngine, TextSource};

use super::{extract_file, load_config, load_engine, render, write_output, InputKind, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image or OCR text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout, or the configured workbook name for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let Some(kind) = InputKind::from_path(&args.input) else {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    };

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    let engine = if args.text_only || kind == InputKind::Text {
        None
    } else {
        pb.set_message("Loading OCR models...");
        pb.set_position(10);
        load_engine(args.model_dir.as_deref(), &config)?
    };

    pb.set_message("Extracting line items...");
    pb.set_position(30);

    let extraction = extract_file(
        &args.input,
        &config,
        engine.as_ref().map(|e| e as &dyn OcrEngine),
    );
    let extraction = match extraction {
        Ok(extraction) => extraction,
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e);
        }
    };

    pb.set_message("Writing output...");
    pb.set_position(80);

    let bytes = render(&extraction, args.format, &config.export)?;
    pb.finish_and_clear();

    let source = match extraction.source {
        TextSource::Embedded => "embedded text",
        TextSource::Ocr => "OCR",
        TextSource::Plain => "plain text",
    };
    eprintln!(
        "{} {} {} from {} ({} pages, {}ms)",
        style("ℹ").blue(),
        extraction.document.len(),
        extraction.document.kind(),
        source,
        extraction.page_count,
        extraction.processing_time_ms
    );

    let written = write_output(
        &bytes,
        args.format,
        args.output.as_deref(),
        &config.export.file_name,
    )?;
    if let Some(path) = written {
        eprintln!("{} Output written to {}", style("✓").green(), path.display());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
