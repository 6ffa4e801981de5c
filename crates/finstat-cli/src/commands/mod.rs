//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod map;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use finstat_core::export::{self, Table};
use finstat_core::models::config::{ExportConfig, FinstatConfig};
use finstat_core::{Extraction, OcrEngine, ParsedDocument, PureOcrEngine, StatementExtractor};

/// Output formats shared by `process`, `batch` and `map`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Excel workbook
    Xlsx,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Text => "txt",
        }
    }
}

/// Kind of input file, by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
    Text,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" => Some(InputKind::Image),
            "txt" => Some(InputKind::Text),
            _ => None,
        }
    }
}

/// Load the config named by `--config`, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FinstatConfig> {
    let config = match config_path {
        Some(path) => FinstatConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => FinstatConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Load the OCR engine if all model files are present.
pub fn load_engine(
    model_dir: Option<&Path>,
    config: &FinstatConfig,
) -> anyhow::Result<Option<PureOcrEngine>> {
    let model_dir: PathBuf = model_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.models.model_dir.clone());

    if !config.models.is_complete(&model_dir) {
        warn!("OCR models not found at {}, OCR disabled", model_dir.display());
        return Ok(None);
    }

    debug!("Loading OCR models from {}", model_dir.display());
    let engine = PureOcrEngine::from_dir(&model_dir, &config.models, config.ocr.clone())
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))?;
    Ok(Some(engine))
}

/// Run the extraction pipeline on one file.
pub fn extract_file(
    path: &Path,
    config: &FinstatConfig,
    engine: Option<&dyn OcrEngine>,
) -> anyhow::Result<Extraction> {
    let Some(kind) = InputKind::from_path(path) else {
        anyhow::bail!("Unsupported file format: {}", path.display());
    };

    let mut extractor = StatementExtractor::new(config.pdf.clone());
    if let Some(engine) = engine {
        extractor = extractor.with_ocr(engine);
    }

    let extraction = match kind {
        InputKind::Pdf => extractor.extract_pdf(&fs::read(path)?)?,
        InputKind::Image => {
            if engine.is_none() {
                anyhow::bail!(
                    "Image input needs OCR models in {} (set with --model-dir or `finstat config set models.model_dir <dir>`)",
                    config.models.model_dir.display()
                );
            }
            let image = image::open(path)?;
            extractor.extract_image(&image)?
        }
        InputKind::Text => extractor.extract_text(&fs::read_to_string(path)?),
    };

    Ok(extraction)
}

/// Render an extraction in the requested format.
pub fn render(
    extraction: &Extraction,
    format: OutputFormat,
    config: &ExportConfig,
) -> anyhow::Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Json => export::to_json(extraction)?.into_bytes(),
        OutputFormat::Csv => {
            export::to_csv(&Table::from_document(&extraction.document, &config.sheet_name))?
                .into_bytes()
        }
        OutputFormat::Xlsx => export::to_xlsx(
            &Table::from_document(&extraction.document, &config.sheet_name),
            config,
        )?,
        OutputFormat::Text => format_text(&extraction.document).into_bytes(),
    };
    Ok(bytes)
}

fn format_text(doc: &ParsedDocument) -> String {
    let mut output = String::new();

    match doc {
        ParsedDocument::Structured(records) => {
            let width = records
                .iter()
                .map(|r| r.label.chars().count())
                .max()
                .unwrap_or(0);
            for record in records {
                output.push_str(&format!("{:<width$}  {}\n", record.label, record.value));
            }
        }
        ParsedDocument::Unstructured(lines) => {
            for line in lines {
                output.push_str(line);
                output.push('\n');
            }
        }
        ParsedDocument::NoText => {
            output.push_str(finstat_core::NO_TEXT_MESSAGE);
            output.push('\n');
        }
    }

    output
}

/// Write rendered output to `output`, or stdout for text formats.
///
/// Workbooks are binary, so without `output` they go to `default_xlsx`.
pub fn write_output(
    bytes: &[u8],
    format: OutputFormat,
    output: Option<&Path>,
    default_xlsx: &str,
) -> anyhow::Result<Option<PathBuf>> {
    let path = match (output, format) {
        (Some(path), _) => path.to_path_buf(),
        (None, OutputFormat::Xlsx) => PathBuf::from(default_xlsx),
        (None, _) => {
            println!("{}", String::from_utf8_lossy(bytes).trim_end());
            return Ok(None);
        }
    };

    fs::write(&path, bytes)?;
    Ok(Some(path))
}
