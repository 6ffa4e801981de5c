//! Parsed line items and the document shapes they are grouped into.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Message carried by [`ParsedDocument::NoText`].
pub const NO_TEXT_MESSAGE: &str = "No text detected via OCR.";

/// A single extracted line item.
///
/// `value` keeps the normalized source text (currency symbol, thousands
/// separators and whitespace removed) rather than a parsed number, so the
/// original precision survives. Use [`LineRecord::amount`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Line item description, trimmed and never empty.
    pub label: String,

    /// Numeric value, e.g. `"1234567.89"` or `"-45000"`.
    pub value: String,
}

impl LineRecord {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Parse the value as a decimal amount.
    ///
    /// Returns `None` for values outside the range of [`Decimal`].
    pub fn amount(&self) -> Option<Decimal> {
        Decimal::from_str(&self.value).ok()
    }
}

/// Result of parsing one document's raw text.
///
/// The three shapes are kept apart so exporters can pick column headers:
/// structured records, a degraded one-column listing, or the "no text"
/// sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ParsedDocument {
    /// At least one line classified as a line item.
    Structured(Vec<LineRecord>),

    /// No line classified; every non-blank trimmed line, in order.
    Unstructured(Vec<String>),

    /// The raw text was empty or whitespace-only.
    NoText,
}

impl ParsedDocument {
    /// Number of rows this document exports to.
    pub fn len(&self) -> usize {
        match self {
            ParsedDocument::Structured(records) => records.len(),
            ParsedDocument::Unstructured(lines) => lines.len(),
            ParsedDocument::NoText => 1,
        }
    }

    /// Never true for documents built by the parser.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structured records, if any.
    pub fn records(&self) -> &[LineRecord] {
        match self {
            ParsedDocument::Structured(records) => records,
            _ => &[],
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ParsedDocument::Structured(_))
    }

    /// Short name of the shape, used in logs and batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedDocument::Structured(_) => "structured",
            ParsedDocument::Unstructured(_) => "unstructured",
            ParsedDocument::NoText => "no_text",
        }
    }
}
