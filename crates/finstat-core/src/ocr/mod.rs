//! OCR collaborator: turns page images into raw text.
//!
//! The engine is a trait so the pipeline can run with the bundled pure Rust
//! engine, an external one, or a stub in tests.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Anything that can read text from an image.
pub trait OcrEngine {
    /// Recognize all text in an image.
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult>;
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle (min_x, min_y, max_x, max_y).
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Text boxes in reading order.
    pub boxes: Vec<TextBox>,

    /// Box texts, one reading-order row per line.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from unordered boxes.
    pub fn from_boxes(
        mut boxes: Vec<TextBox>,
        row_tolerance: f32,
        processing_time_ms: u64,
        image_size: (u32, u32),
    ) -> Self {
        let rows = sort_by_reading_order(&mut boxes, row_tolerance);
        let text = join_rows(&boxes, &rows);

        Self {
            boxes,
            text,
            processing_time_ms,
            image_size,
        }
    }
}

/// Sort boxes into reading order and return the row index of each box.
///
/// A row starts at its top-most box; later boxes join it while their top
/// edge is within `row_tolerance` pixels of that anchor. Boxes within a row
/// are ordered left to right.
pub fn sort_by_reading_order(boxes: &mut [TextBox], row_tolerance: f32) -> Vec<usize> {
    boxes.sort_by(|a, b| a.rect().1.total_cmp(&b.rect().1));
    let rows = assign_rows(boxes, row_tolerance.max(0.0));

    let mut start = 0;
    while start < boxes.len() {
        let row = rows[start];
        let end = start + rows[start..].iter().take_while(|&&r| r == row).count();
        boxes[start..end].sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
        start = end;
    }

    rows
}

/// Row index per box, for boxes already sorted by top edge.
fn assign_rows(boxes: &[TextBox], row_tolerance: f32) -> Vec<usize> {
    let mut rows = Vec::with_capacity(boxes.len());
    let mut anchor: Option<f32> = None;
    let mut row = 0;

    for text_box in boxes {
        let (_, min_y, _, _) = text_box.rect();
        match anchor {
            Some(y) if min_y - y <= row_tolerance => {}
            Some(_) => {
                row += 1;
                anchor = Some(min_y);
            }
            None => anchor = Some(min_y),
        }
        rows.push(row);
    }

    rows
}

/// Join sorted boxes into text: a space between boxes of one row, a newline
/// between rows. A label box and its amount box end up on the same line.
fn join_rows(boxes: &[TextBox], rows: &[usize]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current_row = None;

    for (text_box, &row) in boxes.iter().zip(rows) {
        match lines.last_mut() {
            Some(line) if current_row == Some(row) => {
                line.push(' ');
                line.push_str(&text_box.text);
            }
            _ => {
                lines.push(text_box.text.clone());
                current_row = Some(row);
            }
        }
    }

    lines.join("\n")
}
