//! Error types for the finstat-core library.
//!
//! Line item parsing never fails, so there is no parse error here. Errors only
//! come from the collaborators around it: PDF loading, OCR and export.

use thiserror::Error;

/// Main error type for the finstat library.
#[derive(Error, Debug)]
pub enum FinstatError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Spreadsheet/CSV/JSON export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract the embedded text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract page images.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Page number outside the document.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The engine failed to recognize text in an image.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// OCR was required but no engine is configured.
    #[error("no OCR engine available: {0}")]
    Unavailable(String),

    /// OCR failed on a specific page (1-indexed).
    #[error("OCR failed on page {page}: {reason}")]
    Page { page: u32, reason: String },
}

/// Errors related to exporting parsed statements.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Workbook generation failed.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV serialization failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the output buffer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output was not valid UTF-8.
    #[error("invalid UTF-8 in output: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result type for the finstat library.
pub type Result<T> = std::result::Result<T, FinstatError>;
