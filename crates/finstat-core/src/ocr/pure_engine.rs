//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{OcrEngine, OcrResult, Result, TextBox};

/// OCR engine backed by `pure-onnx-ocr` (no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `models`, under `model_dir`.
    pub fn from_dir(model_dir: &Path, models: &ModelConfig, config: OcrConfig) -> Result<Self> {
        if !models.is_complete(model_dir) {
            return Err(OcrError::ModelLoad(format!(
                "model files missing in {}",
                model_dir.display()
            )));
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(model_dir.join(&models.detection_model))
            .rec_model_path(model_dir.join(&models.recognition_model))
            .dictionary_path(model_dir.join(&models.dictionary))
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine, config })
    }

    fn clean_text(&self, text: &str) -> String {
        if self.config.keep_unk {
            text.to_string()
        } else {
            text.replace("[UNK]", " ")
        }
    }
}

impl OcrEngine for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Running OCR on {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let detected = results.len();
        let boxes: Vec<TextBox> = results
            .iter()
            .filter(|r| r.confidence >= self.config.min_confidence)
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: self.clean_text(&r.text),
                score: r.confidence,
            })
            .collect();

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "OCR complete: {} of {} text boxes kept in {}ms",
            boxes.len(),
            detected,
            processing_time_ms
        );

        Ok(OcrResult::from_boxes(
            boxes,
            self.config.row_tolerance,
            processing_time_ms,
            (width, height),
        ))
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` quadrilateral.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
