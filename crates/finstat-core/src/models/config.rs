//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FinstatError;

/// Main configuration for the finstat pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinstatConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Spreadsheet export configuration.
    pub export: ExportConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` markers for unrecognized glyphs instead of blanking them.
    pub keep_unk: bool,

    /// Text boxes with a recognition score below this are dropped (0.0 - 1.0).
    pub min_confidence: f32,

    /// Vertical distance in pixels within which boxes share a reading-order row.
    pub row_tolerance: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            min_confidence: 0.0, // CTC scores are low even for good text
            row_tolerance: 20.0,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Use the embedded text layer instead of OCR when it is long enough.
    pub prefer_embedded_text: bool,

    /// Minimum trimmed text length to accept the embedded text layer.
    pub min_text_length: usize,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
            max_pages: 0,
        }
    }
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Worksheet name for parsed statements.
    pub sheet_name: String,

    /// Worksheet name for label mapping output.
    pub mapping_sheet_name: String,

    /// Default output file name for xlsx output.
    pub file_name: String,

    /// Upper bound for auto-sized column widths.
    pub max_column_width: usize,

    /// Extra width added to the longest cell of each column.
    pub column_padding: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Financial Data".to_string(),
            mapping_sheet_name: "Financial Mapping".to_string(),
            file_name: "Financial_Output.xlsx".to_string(),
            max_column_width: 50,
            column_padding: 2,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Whether all model files exist under `dir`.
    pub fn is_complete(&self, dir: &std::path::Path) -> bool {
        [&self.detection_model, &self.recognition_model, &self.dictionary]
            .iter()
            .all(|name| dir.join(name).exists())
    }
}

impl FinstatConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_dir.join(model_name)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.ocr.min_confidence) {
            return Err(FinstatError::Config(format!(
                "ocr.min_confidence must be between 0 and 1, got {}",
                self.ocr.min_confidence
            )));
        }
        if self.ocr.row_tolerance <= 0.0 {
            return Err(FinstatError::Config(
                "ocr.row_tolerance must be positive".to_string(),
            ));
        }
        if self.export.max_column_width == 0 {
            return Err(FinstatError::Config(
                "export.max_column_width must be positive".to_string(),
            ));
        }

        // Excel rejects empty sheet names and names over 31 characters.
        for (key, name) in [
            ("export.sheet_name", &self.export.sheet_name),
            ("export.mapping_sheet_name", &self.export.mapping_sheet_name),
        ] {
            let len = name.chars().count();
            if len == 0 || len > 31 {
                return Err(FinstatError::Config(format!(
                    "{} must be 1 to 31 characters, got {:?}",
                    key, name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: FinstatConfig =
            serde_json::from_str(r#"{"export": {"max_column_width": 30}}"#).unwrap();

        assert_eq!(config.export.max_column_width, 30);
        assert_eq!(config.export.sheet_name, "Financial Data");
        assert_eq!(config.pdf.min_text_length, 50);
        assert!(config.pdf.prefer_embedded_text);
    }

    #[test]
    fn test_model_path() {
        let config = FinstatConfig::default();
        assert_eq!(
            config.model_path(&config.models.detection_model),
            PathBuf::from("models").join("det.onnx")
        );
    }

    #[test]
    fn test_validate() {
        assert!(FinstatConfig::default().validate().is_ok());

        let mut config = FinstatConfig::default();
        config.ocr.min_confidence = 1.5;
        assert!(matches!(config.validate(), Err(FinstatError::Config(_))));

        let mut config = FinstatConfig::default();
        config.export.sheet_name = "Consolidated Statement of Financial Position".to_string();
        assert!(matches!(config.validate(), Err(FinstatError::Config(_))));
    }

    #[test]
    fn test_missing_models_are_incomplete() {
        let config = ModelConfig::default();
        assert!(!config.is_complete(std::path::Path::new("/nonexistent/finstat-models")));
    }
}
