//! Regex patterns for financial line item extraction.
//!
//! Compiled once on first use.

use lazy_static::lazy_static;
use regex::Regex;

/// Numeric token grammar: optional `-`, optional `$` (whitespace may follow
/// it), digits with `,` separators and at least one digit, optional fraction.
/// The fraction may be a bare `.`, as in OCR lines ending in a full stop.
pub const NUMERIC_TOKEN_SRC: &str = r"-?(?:\$\s*)?[0-9,]*[0-9][0-9,]*(?:\.[0-9]*)?";

lazy_static! {
    /// Any numeric token, anywhere in a line.
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(NUMERIC_TOKEN_SRC).unwrap();

    /// Whole-line `label [:| ] number` with nothing after the number.
    pub static ref STRICT_LINE_ITEM: Regex = Regex::new(&format!(
        r"^([A-Za-z\s()&,.\-]+?)\s*[:|\s]\s*({})\s*$",
        NUMERIC_TOKEN_SRC
    ))
    .unwrap();
}

/// Strip currency symbols, thousands separators, whitespace and a trailing
/// `.` from a token.
pub fn normalize_amount(token: &str) -> String {
    let mut amount: String = token
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if amount.ends_with('.') {
        amount.pop();
    }
    amount
}
