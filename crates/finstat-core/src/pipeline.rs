//! End-to-end extraction: PDF or image in, parsed statement out.

use std::time::Instant;

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{OcrError, Result};
use crate::models::config::PdfConfig;
use crate::models::record::ParsedDocument;
use crate::ocr::OcrEngine;
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::statement::StatementParser;

/// Where the raw text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The PDF's embedded text layer.
    Embedded,
    /// OCR over page images.
    Ocr,
    /// Text supplied directly by the caller.
    Plain,
}

/// Result of one extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// Parsed statement.
    pub document: ParsedDocument,
    /// Raw text that was parsed.
    pub raw_text: String,
    /// Origin of the raw text.
    pub source: TextSource,
    /// Pages in the input (1 for images and plain text).
    pub page_count: u32,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Drives the PDF and OCR collaborators and parses what they produce.
pub struct StatementExtractor<'a> {
    config: PdfConfig,
    ocr: Option<&'a dyn OcrEngine>,
    parser: StatementParser,
}

impl<'a> StatementExtractor<'a> {
    /// Create an extractor without OCR; only text layers can be read.
    pub fn new(config: PdfConfig) -> Self {
        Self {
            config,
            ocr: None,
            parser: StatementParser::new(),
        }
    }

    /// Set the OCR engine.
    pub fn with_ocr(mut self, engine: &'a dyn OcrEngine) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Set the parser.
    pub fn with_parser(mut self, parser: StatementParser) -> Self {
        self.parser = parser;
        self
    }

    /// Extract line items from PDF bytes.
    pub fn extract_pdf(&self, data: &[u8]) -> Result<Extraction> {
        let start = Instant::now();

        let mut pdf = PdfExtractor::new();
        pdf.load(data)?;
        let page_count = pdf.page_count();
        info!("Processing PDF with {} pages ({} bytes)", page_count, data.len());

        let (raw_text, source) = self.pdf_text(&pdf)?;
        let document = self.parser.parse(&raw_text);

        Ok(Extraction {
            document,
            raw_text,
            source,
            page_count,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// OCR a single image and extract line items.
    pub fn extract_image(&self, image: &DynamicImage) -> Result<Extraction> {
        let start = Instant::now();
        let engine = self.ocr.ok_or_else(|| {
            OcrError::Unavailable("an OCR engine is required for image input".to_string())
        })?;

        let raw_text = engine.recognize(image)?.text;
        let document = self.parser.parse(&raw_text);

        Ok(Extraction {
            document,
            raw_text,
            source: TextSource::Ocr,
            page_count: 1,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Parse text that was already recognized elsewhere.
    pub fn extract_text(&self, text: &str) -> Extraction {
        let start = Instant::now();
        let document = self.parser.parse(text);

        Extraction {
            document,
            raw_text: text.to_string(),
            source: TextSource::Plain,
            page_count: 1,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn pdf_text(&self, pdf: &dyn PdfProcessor) -> Result<(String, TextSource)> {
        let embedded = match pdf.extract_text() {
            Ok(text) => text,
            Err(e) => {
                debug!("No usable text layer: {}", e);
                String::new()
            }
        };

        let text_len = embedded.trim().chars().count();
        if self.config.prefer_embedded_text && text_len >= self.config.min_text_length {
            info!("Using embedded text layer ({} characters)", text_len);
            return Ok((embedded, TextSource::Embedded));
        }

        let Some(engine) = self.ocr else {
            if text_len > 0 {
                warn!("No OCR engine configured, using short embedded text layer");
                return Ok((embedded, TextSource::Embedded));
            }
            return Err(OcrError::Unavailable(
                "PDF has no text layer and no OCR engine is configured".to_string(),
            )
            .into());
        };

        Ok((self.ocr_pages(pdf, engine)?, TextSource::Ocr))
    }

    /// OCR every page image in page order. Any failure aborts the document.
    fn ocr_pages(&self, pdf: &dyn PdfProcessor, engine: &dyn OcrEngine) -> Result<String> {
        let page_count = pdf.page_count();
        let last_page = match self.config.max_pages {
            0 => page_count,
            max => page_count.min(max as u32),
        };

        let mut total = last_page;
        let mut pages: Vec<(u32, Vec<DynamicImage>)> = Vec::new();
        for page in 1..=last_page {
            let images = pdf.extract_images(page)?;
            if !images.is_empty() {
                pages.push((page, images));
            }
        }

        if pages.is_empty() {
            debug!("No page-level images, scanning document objects");
            let mut images = pdf.document_images();
            if self.config.max_pages > 0 {
                images.truncate(self.config.max_pages);
            }
            total = images.len() as u32;
            pages = (1u32..).zip(images.into_iter().map(|img| vec![img])).collect();
        }

        let mut page_texts = Vec::new();
        for (page, images) in &pages {
            for image in images {
                let result = engine.recognize(image).map_err(|e| OcrError::Page {
                    page: *page,
                    reason: e.to_string(),
                })?;
                debug!("Page {}: {} text boxes", page, result.boxes.len());
                page_texts.push(result.text);
            }
            info!("Processed page {}/{}", page, total);
        }

        Ok(page_texts.join("\n"))
    }
}
