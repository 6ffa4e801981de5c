//! Mapping a statement's own line item labels onto standard line items.
//!
//! Each mapping names an original label (as printed in the statement) and the
//! standard label it corresponds to. The value is looked up in the raw text:
//! every line mentioning the label contributes its numbers as candidates.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use super::patterns::{normalize_amount, NUMERIC_TOKEN};

/// One requested label mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mapping {
    /// Label as it appears in the statement.
    pub original: String,

    /// Standardized label.
    pub standard: String,
}

impl Mapping {
    pub fn new(original: impl Into<String>, standard: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            standard: standard.into(),
        }
    }

    /// Label searched for in the text: `original`, or `standard` when
    /// `original` is empty.
    fn search_label(&self) -> &str {
        if self.original.is_empty() {
            &self.standard
        } else {
            &self.original
        }
    }
}

/// Outcome of looking up a label's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedValue {
    /// No line mentioning the label carried a number.
    Missing,
    /// Lines mentioning the label carried more than one distinct number.
    Ambiguous,
    /// Exactly one distinct number was found.
    Found(String),
}

impl fmt::Display for MappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappedValue::Missing => write!(f, "MISSING"),
            MappedValue::Ambiguous => write!(f, "AMBIGUOUS"),
            MappedValue::Found(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for MappedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A mapping together with its looked-up value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedLineItem {
    pub original: String,
    pub standard: String,
    pub value: MappedValue,
}

/// Find the single numeric value associated with `label` in `text`.
///
/// Matching is a case-insensitive substring test per line.
pub fn find_numeric_value(text: &str, label: &str) -> MappedValue {
    if text.is_empty() || label.is_empty() {
        return MappedValue::Missing;
    }

    let needle = label.to_lowercase();
    let candidates: BTreeSet<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| line.to_lowercase().contains(&needle))
        .flat_map(|line| NUMERIC_TOKEN.find_iter(line))
        .map(|m| normalize_amount(m.as_str()))
        .collect();

    if candidates.len() > 1 {
        debug!("Label {:?} matched {} distinct values", label, candidates.len());
        return MappedValue::Ambiguous;
    }

    candidates
        .into_iter()
        .next()
        .map(MappedValue::Found)
        .unwrap_or(MappedValue::Missing)
}

/// Look up every mapping in `text`, skipping mappings with no labels at all.
pub fn map_line_items(text: &str, mappings: &[Mapping]) -> Vec<MappedLineItem> {
    mappings
        .iter()
        .filter(|m| !(m.original.is_empty() && m.standard.is_empty()))
        .map(|m| MappedLineItem {
            original: m.original.clone(),
            standard: m.standard.clone(),
            value: find_numeric_value(text, m.search_label()),
        })
        .collect()
}
