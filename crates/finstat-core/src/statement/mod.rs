//! Financial line item extraction from raw OCR text.

mod classifier;
pub mod mapping;
mod parser;
pub mod patterns;

pub use classifier::{classify_line, LineClassifier, LineStrategy, LooseExtraction, StrictMatch};
pub use mapping::{find_numeric_value, map_line_items, MappedLineItem, MappedValue, Mapping};
pub use parser::{parse_statement, StatementParser};
