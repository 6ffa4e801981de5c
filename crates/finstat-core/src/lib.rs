//! Core library for financial statement extraction.
//!
//! This crate provides:
//! - Line item parsing of OCR text into (label, value) records
//! - PDF processing (embedded text layer and page images)
//! - OCR through a pluggable engine (pure Rust ONNX models by default)
//! - Spreadsheet, CSV and JSON export of parsed statements
//! - Label mapping against a list of standard line items

pub mod error;
pub mod export;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod statement;

pub use error::{FinstatError, Result};
pub use export::Table;
pub use models::config::FinstatConfig;
pub use models::record::{LineRecord, ParsedDocument, NO_TEXT_MESSAGE};
pub use ocr::{OcrEngine, OcrResult, TextBox};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::{Extraction, StatementExtractor, TextSource};
pub use statement::{
    classify_line, parse_statement, LineClassifier, LineStrategy, StatementParser,
};
