//! Single-line classification into (label, value) pairs.
//!
//! A [`LineClassifier`] holds an ordered list of [`LineStrategy`]s and returns
//! the first match. The default list is strict match, then loose extraction.

use tracing::trace;

use super::patterns::{normalize_amount, NUMERIC_TOKEN, STRICT_LINE_ITEM};
use crate::models::record::LineRecord;

/// One way of reading a line as a line item.
pub trait LineStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Classify a trimmed, non-empty line.
    fn classify(&self, line: &str) -> Option<LineRecord>;
}

/// Label followed by exactly one number that ends the line.
///
/// `Total Revenue: $1,234,567.89` gives `("Total Revenue", "1234567.89")`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictMatch;

impl LineStrategy for StrictMatch {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn classify(&self, line: &str) -> Option<LineRecord> {
        let caps = STRICT_LINE_ITEM.captures(line)?;
        let label = caps[1].trim();
        if label.is_empty() {
            return None;
        }
        Some(LineRecord::new(label, normalize_amount(&caps[2])))
    }
}

/// Any line containing a number, when it also has some descriptive text.
///
/// The value is the leftmost numeric token. The label is the line with every
/// numeric token removed, so a line with several numbers loses all of them
/// from its label but only reports the first.
#[derive(Debug, Clone, Copy)]
pub struct LooseExtraction {
    /// Lines with this many characters or fewer are ignored.
    min_line_chars: usize,
}

impl LooseExtraction {
    pub fn new() -> Self {
        Self { min_line_chars: 3 }
    }

    /// Set the length guard.
    pub fn with_min_line_chars(mut self, chars: usize) -> Self {
        self.min_line_chars = chars;
        self
    }
}

impl Default for LooseExtraction {
    fn default() -> Self {
        Self::new()
    }
}

impl LineStrategy for LooseExtraction {
    fn name(&self) -> &'static str {
        "loose"
    }

    fn classify(&self, line: &str) -> Option<LineRecord> {
        if line.chars().count() <= self.min_line_chars {
            return None;
        }

        let first = NUMERIC_TOKEN.find(line)?;
        let residual = NUMERIC_TOKEN.replace_all(line, "");
        let label = residual.trim();
        if label.is_empty() {
            return None;
        }

        Some(LineRecord::new(label, normalize_amount(first.as_str())))
    }
}

/// Ordered list of strategies; the first one to match wins.
pub struct LineClassifier {
    strategies: Vec<Box<dyn LineStrategy>>,
}

impl LineClassifier {
    /// Strict match, then loose extraction.
    pub fn new() -> Self {
        Self::empty()
            .with_strategy(StrictMatch)
            .with_strategy(LooseExtraction::new())
    }

    /// A classifier with no strategies, which matches nothing.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy, tried after the existing ones.
    pub fn with_strategy(mut self, strategy: impl LineStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Classify one line. Surrounding whitespace is ignored; blank lines never
    /// match.
    pub fn classify(&self, line: &str) -> Option<LineRecord> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        self.strategies.iter().find_map(|strategy| {
            let record = strategy.classify(line)?;
            trace!(strategy = strategy.name(), label = %record.label, value = %record.value, "classified line");
            Some(record)
        })
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a single line with the default strategies.
pub fn classify_line(line: &str) -> Option<LineRecord> {
    LineClassifier::new().classify(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(line: &str) -> Option<(String, String)> {
        classify_line(line).map(|r| (r.label, r.value))
    }

    fn some(label: &str, value: &str) -> Option<(String, String)> {
        Some((label.to_string(), value.to_string()))
    }

    #[test]
    fn test_strict_colon_separator() {
        assert_eq!(pair("Total Revenue: $1,234,567.89"), some("Total Revenue", "1234567.89"));
    }

    #[test]
    fn test_strict_space_separator() {
        assert_eq!(pair("Net Income (Loss) 45,000"), some("Net Income (Loss)", "45000"));
    }

    #[test]
    fn test_strict_allowed_label_characters() {
        assert_eq!(
            pair("Property, Plant & Equipment, net.: -$ 12,500.50"),
            some("Property, Plant & Equipment, net.", "-12500.50")
        );
        assert_eq!(pair("Long-term debt | 900"), some("Long-term debt", "900"));
        assert_eq!(pair("Accounts payable:    -300"), some("Accounts payable", "-300"));
    }

    #[test]
    fn test_trailing_full_stop_after_amount() {
        assert_eq!(pair("Total: 1,234."), some("Total", "1234"));
        assert_eq!(pair("Net income 45,000."), some("Net income", "45000"));
    }

    #[test]
    fn test_loose_trailing_text() {
        assert_eq!(pair("Cash 1000 restricted"), some("Cash  restricted", "1000"));
    }

    #[test]
    fn test_loose_first_token_wins() {
        // Label has digits, so strict fails; "4" is the leftmost token.
        assert_eq!(pair("Q4 Revenue 1,250.75"), some("Q Revenue", "4"));
    }

    #[test]
    fn test_loose_removes_every_token_from_label() {
        assert_eq!(pair("Revenue 2023 1,000 2024 2,000"), some("Revenue", "2023"));
    }

    #[test]
    fn test_loose_number_inside_prose() {
        assert_eq!(pair("See note 5 below"), some("See note  below", "5"));
    }

    #[test]
    fn test_no_digits_no_result() {
        assert_eq!(pair("Statement of Cash Flows"), None);
        assert_eq!(pair("Assets, Liabilities & Equity"), None);
        assert_eq!(pair("$ - ,"), None);
    }

    #[test]
    fn test_short_number_only_lines_dropped() {
        assert_eq!(pair("42"), None);
        assert_eq!(pair("$42"), None);
        assert_eq!(pair("-1"), None);
    }

    #[test]
    fn test_naked_numbers_dropped() {
        assert_eq!(pair("1,234,567"), None);
        assert_eq!(pair("100 200 300"), None);
    }

    #[test]
    fn test_short_strict_line_still_matches() {
        // Length guard only applies to loose extraction.
        assert_eq!(pair("A 5"), some("A", "5"));
    }

    #[test]
    fn test_idempotent() {
        let classifier = LineClassifier::new();
        for line in ["Total Assets: 10,000", "Cash 1000 restricted", "no numbers", "42"] {
            assert_eq!(classifier.classify(line), classifier.classify(line));
        }
    }

    #[test]
    fn test_value_parses_as_number() {
        let lines = [
            "Total Revenue: $1,234,567.89",
            "Net Income (Loss) 45,000",
            "Cash 1000 restricted",
            "Loss for the year -$ 3,400.10 (restated)",
            "Depreciation $ 1,000",
        ];
        for line in lines {
            let record = classify_line(line).unwrap();
            assert!(
                record.value.parse::<f64>().is_ok(),
                "{line:?} gave unparsable value {:?}",
                record.value
            );
            assert!(!record.label.is_empty());
        }
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(LineClassifier::new().strategy_names(), vec!["strict", "loose"]);
    }

    #[test]
    fn test_empty_classifier_matches_nothing() {
        assert_eq!(LineClassifier::empty().classify("Total Revenue: 100"), None);
    }

    struct PercentStrategy;

    impl LineStrategy for PercentStrategy {
        fn name(&self) -> &'static str {
            "percent"
        }

        fn classify(&self, line: &str) -> Option<LineRecord> {
            let (label, pct) = line.rsplit_once(' ')?;
            let pct = pct.strip_suffix('%')?;
            pct.parse::<f64>().ok()?;
            Some(LineRecord::new(label.trim(), pct))
        }
    }

    #[test]
    fn test_appended_strategy_runs_last() {
        let classifier = LineClassifier::empty()
            .with_strategy(StrictMatch)
            .with_strategy(PercentStrategy);

        assert_eq!(
            classifier.classify("Gross margin 41%"),
            Some(LineRecord::new("Gross margin", "41"))
        );
        assert_eq!(
            classifier.classify("Revenue: 100"),
            Some(LineRecord::new("Revenue", "100"))
        );
    }

    #[test]
    fn test_loose_length_guard_is_configurable() {
        let loose = LooseExtraction::new().with_min_line_chars(10);
        assert_eq!(loose.classify("Cash 1000x"), None);
        assert_eq!(
            loose.classify("Cash 1000 restricted"),
            Some(LineRecord::new("Cash  restricted", "1000"))
        );
    }
}
