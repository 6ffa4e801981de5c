//! Tabular export of parsed statements: xlsx, CSV and JSON.
//!
//! Everything goes through [`Table`], so column headers are chosen once per
//! document shape and every format agrees on them.

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::debug;

use crate::error::ExportError;
use crate::models::config::ExportConfig;
use crate::models::record::{ParsedDocument, NO_TEXT_MESSAGE};
use crate::statement::MappedLineItem;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

pub const LINE_ITEM_HEADER: &str = "Line Item";
pub const VALUE_HEADER: &str = "Value";
pub const EXTRACTED_TEXT_HEADER: &str = "Extracted Text";
pub const MESSAGE_HEADER: &str = "Message";

/// A single worksheet worth of string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Column widths to use instead of auto-sizing.
    pub fixed_widths: Option<Vec<f64>>,
}

impl Table {
    pub fn new(sheet_name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            fixed_widths: None,
        }
    }

    pub fn with_fixed_widths(mut self, widths: Vec<f64>) -> Self {
        self.fixed_widths = Some(widths);
        self
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// One row per record, with headers matching the document shape.
    pub fn from_document(doc: &ParsedDocument, sheet_name: &str) -> Self {
        match doc {
            ParsedDocument::Structured(records) => {
                let mut table = Table::new(sheet_name, &[LINE_ITEM_HEADER, VALUE_HEADER]);
                for record in records {
                    table.push_row([record.label.as_str(), record.value.as_str()]);
                }
                table
            }
            ParsedDocument::Unstructured(lines) => {
                let mut table = Table::new(sheet_name, &[EXTRACTED_TEXT_HEADER]);
                for line in lines {
                    table.push_row([line.as_str()]);
                }
                table
            }
            ParsedDocument::NoText => {
                let mut table = Table::new(sheet_name, &[MESSAGE_HEADER]);
                table.push_row([NO_TEXT_MESSAGE]);
                table
            }
        }
    }

    /// Label mapping results, with fixed column widths.
    pub fn from_mapping(items: &[MappedLineItem], sheet_name: &str) -> Self {
        let mut table = Table::new(
            sheet_name,
            &["Original Line Item", "Standard Line Item", "Value (if found)"],
        )
        .with_fixed_widths(vec![40.0, 40.0, 24.0]);

        for item in items {
            table.push_row([
                item.original.clone(),
                item.standard.clone(),
                item.value.to_string(),
            ]);
        }
        table
    }

    /// Widths for each column: fixed widths if set, otherwise the longest
    /// cell (header included) plus `padding`, capped at `max`.
    pub fn column_widths(&self, padding: usize, max: usize) -> Vec<f64> {
        if let Some(widths) = &self.fixed_widths {
            return widths.clone();
        }

        (0..self.headers.len())
            .map(|col| {
                let longest = std::iter::once(&self.headers[col])
                    .chain(self.rows.iter().filter_map(|row| row.get(col)))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                (longest + padding).min(max) as f64
            })
            .collect()
    }
}

/// Render a table as an xlsx workbook with a single worksheet.
pub fn to_xlsx(table: &Table, config: &ExportConfig) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32 + 1, col as u16, cell)?;
        }
    }

    let widths = table.column_widths(config.column_padding, config.max_column_width);
    for (col, width) in widths.into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }

    let buffer = workbook.save_to_buffer()?;
    debug!(
        "Wrote {} rows to sheet {:?} ({} bytes)",
        table.rows.len(),
        table.sheet_name,
        buffer.len()
    );
    Ok(buffer)
}

/// Render a table as CSV with a header row.
pub fn to_csv(table: &Table) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(vec![]);

    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }

    let data = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

/// Pretty-printed JSON of any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::LineRecord;
    use crate::statement::MappedValue;
    use calamine::{open_workbook_from_rs, Reader, Xlsx};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>, sheet: &str) -> Vec<Vec<String>> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(sheet).unwrap();
        range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    fn structured() -> ParsedDocument {
        ParsedDocument::Structured(vec![
            LineRecord::new("Total Revenue", "1234567.89"),
            LineRecord::new("Net Income (Loss)", "45000"),
        ])
    }

    #[test]
    fn test_headers_follow_shape() {
        let table = Table::from_document(&structured(), "Financial Data");
        assert_eq!(table.headers, vec!["Line Item", "Value"]);
        assert_eq!(table.rows[1], vec!["Net Income (Loss)", "45000"]);

        let table = Table::from_document(
            &ParsedDocument::Unstructured(vec!["Going concern".to_string()]),
            "Financial Data",
        );
        assert_eq!(table.headers, vec!["Extracted Text"]);

        let table = Table::from_document(&ParsedDocument::NoText, "Financial Data");
        assert_eq!(table.headers, vec!["Message"]);
        assert_eq!(table.rows, vec![vec![NO_TEXT_MESSAGE.to_string()]]);
    }

    #[test]
    fn test_column_widths() {
        let mut table = Table::new("s", &["Line Item", "Value"]);
        table.push_row(["Cash", "1000"]);
        table.push_row(["x".repeat(80), "1".to_string()]);

        // Long label capped at 50; "Value" header (5) + 2.
        assert_eq!(table.column_widths(2, 50), vec![50.0, 7.0]);

        let mut table = Table::new("s", &["Line Item"]);
        table.push_row(["Éléments à recevoir"]);
        // Counted in characters, not bytes.
        assert_eq!(table.column_widths(2, 50), vec![21.0]);
    }

    #[test]
    fn test_fixed_widths_win() {
        let table = Table::from_mapping(&[], "Financial Mapping");
        assert_eq!(table.column_widths(2, 50), vec![40.0, 40.0, 24.0]);
    }

    #[test]
    fn test_xlsx_round_trip() {
        let config = ExportConfig::default();
        let table = Table::from_document(&structured(), &config.sheet_name);

        let bytes = to_xlsx(&table, &config).unwrap();
        let rows = read_back(bytes, "Financial Data");

        assert_eq!(
            rows,
            vec![
                vec!["Line Item", "Value"],
                vec!["Total Revenue", "1234567.89"],
                vec!["Net Income (Loss)", "45000"],
            ]
        );
    }

    #[test]
    fn test_xlsx_mapping_sheet() {
        let config = ExportConfig::default();
        let items = vec![MappedLineItem {
            original: "Sales".to_string(),
            standard: "Revenue".to_string(),
            value: MappedValue::Missing,
        }];
        let table = Table::from_mapping(&items, &config.mapping_sheet_name);

        let rows = read_back(to_xlsx(&table, &config).unwrap(), "Financial Mapping");
        assert_eq!(rows[1], vec!["Sales", "Revenue", "MISSING"]);
    }

    #[test]
    fn test_csv() {
        let table = Table::from_document(
            &ParsedDocument::Structured(vec![LineRecord::new("Property, Plant & Equipment", "-12500.50")]),
            "Financial Data",
        );
        assert_eq!(
            to_csv(&table).unwrap(),
            "Line Item,Value\n\"Property, Plant & Equipment\",-12500.50\n"
        );
    }

    #[test]
    fn test_json() {
        let json = to_json(&ParsedDocument::NoText).unwrap();
        assert!(json.contains("\"no_text\""));
    }
}
