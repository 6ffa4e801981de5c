//! Whole-document parsing of raw OCR text.

use tracing::{debug, info};

use super::classifier::LineClassifier;
use crate::models::record::{LineRecord, ParsedDocument};

/// Turns a raw text blob into a [`ParsedDocument`].
///
/// Parsing never fails: unmatched lines are dropped, a document where nothing
/// matches degrades to [`ParsedDocument::Unstructured`], and blank input gives
/// [`ParsedDocument::NoText`].
pub struct StatementParser {
    classifier: LineClassifier,
}

impl StatementParser {
    /// Create a parser with the default classifier.
    pub fn new() -> Self {
        Self {
            classifier: LineClassifier::new(),
        }
    }

    /// Use a custom classifier.
    pub fn with_classifier(mut self, classifier: LineClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Parse raw text into line items.
    pub fn parse(&self, text: &str) -> ParsedDocument {
        if text.trim().is_empty() {
            info!("No text to parse");
            return ParsedDocument::NoText;
        }

        info!("Parsing statement from {} characters of text", text.len());

        let records: Vec<LineRecord> = non_blank_lines(text)
            .filter_map(|line| self.classifier.classify(line))
            .collect();

        if !records.is_empty() {
            debug!("Extracted {} line items", records.len());
            return ParsedDocument::Structured(records);
        }

        let lines: Vec<String> = non_blank_lines(text).map(str::to_string).collect();
        info!(
            "No line items matched, falling back to {} unstructured lines",
            lines.len()
        );
        ParsedDocument::Unstructured(lines)
    }
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse raw text with the default classifier.
pub fn parse_statement(text: &str) -> ParsedDocument {
    StatementParser::new().parse(text)
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}
