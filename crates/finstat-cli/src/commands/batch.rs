//! Batch processing command for multiple statement files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use finstat_core::{Extraction, OcrEngine};

use super::{extract_file, load_config, load_engine, render, InputKind, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory (required unless --summary is given)
    #[arg(short, long, required_unless_present = "summary")]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,
}

const SUMMARY_FILE: &str = "summary.csv";

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<Extraction>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::from_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let needs_ocr = !args.text_only
        && files
            .iter()
            .any(|p| InputKind::from_path(p) != Some(InputKind::Text));
    let engine = if needs_ocr {
        load_engine(args.model_dir.as_deref(), &config)?
    } else {
        None
    };
    let engine = engine.as_ref().map(|e| e as &dyn OcrEngine);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let result = extract_file(&path, &config, engine);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(extraction) => {
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        let written: Vec<(&Path, &Extraction)> = results
            .iter()
            .filter_map(|r| Some((r.path.as_path(), r.extraction.as_ref()?)))
            .collect();
        let reserved: &[&str] = if args.summary { &[SUMMARY_FILE] } else { &[] };
        let paths: Vec<&Path> = written.iter().map(|(path, _)| *path).collect();
        let names = output_names(&paths, args.format.extension(), reserved);

        for ((_, extraction), name) in written.iter().zip(names) {
            let output_path = output_dir.join(name);
            fs::write(&output_path, render(extraction, args.format, &config.export)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join(SUMMARY_FILE))
            .unwrap_or_else(|| PathBuf::from(SUMMARY_FILE));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Output file name for each input, unique within one directory.
///
/// Inputs are named by stem. Inputs sharing a stem keep their own extension
/// (`a.txt.csv`, `a.TXT.csv`), and any clash left gets a numeric suffix.
/// No name equals one of `reserved`.
fn output_names(paths: &[&Path], extension: &str, reserved: &[&str]) -> Vec<String> {
    fn stem(path: &Path) -> &str {
        path.file_stem().and_then(|s| s.to_str()).unwrap_or("statement")
    }

    let mut stem_counts: HashMap<&str, usize> = HashMap::new();
    for path in paths {
        *stem_counts.entry(stem(path)).or_default() += 1;
    }

    let mut used: HashSet<String> = reserved.iter().map(|r| r.to_string()).collect();

    paths
        .iter()
        .map(|path| {
            let base = if stem_counts[stem(path)] > 1 {
                path.file_name().and_then(|s| s.to_str()).unwrap_or(stem(path))
            } else {
                stem(path)
            };

            let mut name = format!("{}.{}", base, extension);
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}-{}.{}", base, n, extension);
                n += 1;
            }
            name
        })
        .collect()
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "status", "shape", "records", "error", "processing_time_ms"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();
        let time = time.as_str();

        match &result.extraction {
            Some(extraction) => {
                let records = extraction.document.len().to_string();
                wtr.write_record([
                    filename,
                    "success",
                    extraction.document.kind(),
                    records.as_str(),
                    "",
                    time,
                ])?
            }
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                result.error.as_deref().unwrap_or(""),
                time,
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(paths: &[&str], reserved: &[&str]) -> Vec<String> {
        let paths: Vec<&Path> = paths.iter().map(Path::new).collect();
        output_names(&paths, "csv", reserved)
    }

    #[test]
    fn test_output_names_use_stem() {
        assert_eq!(names(&["in/a.txt", "in/b.pdf"], &[]), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_output_names_shared_stem_keeps_extension() {
        assert_eq!(
            names(&["in/a.txt", "in/a.TXT", "in/b.pdf"], &[]),
            vec!["a.txt.csv", "a.TXT.csv", "b.csv"]
        );
    }

    #[test]
    fn test_output_names_same_file_in_two_dirs() {
        assert_eq!(
            names(&["q1/report.pdf", "q2/report.pdf"], &[]),
            vec!["report.pdf.csv", "report.pdf-2.csv"]
        );
    }

    #[test]
    fn test_output_names_avoid_reserved() {
        assert_eq!(names(&["summary.txt"], &[SUMMARY_FILE]), vec!["summary-2.csv"]);
    }
}
