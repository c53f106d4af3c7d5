//! BOM File Parser
//!
//! Multi-format parser supporting CSV, Excel, and XML bill of materials files.
//! Each data row goes through the `BomRecordParser`; rows that cannot be
//! turned into line items are reported as itemized diagnostics instead of
//! failing the whole file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use solderline_models::BomLineItem;

use super::record::{BomRecordParser, BomRowError};

/// Supported BOM file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BomFormat {
    Csv,
    Excel, // XLSX/XLS
    Xml,
}

impl BomFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

}

/// A row the record parser rejected
#[derive(Debug, Clone, Serialize)]
pub struct RowDiagnostic {
    pub row: usize,
    pub designators: Option<String>,
    pub error: BomRowError,
}

/// Complete parsed BOM with metadata
#[derive(Debug, Clone, Serialize)]
pub struct ParsedBom {
    pub id: Uuid,
    pub filename: String,
    pub format: BomFormat,
    pub column_headers: Vec<String>,
    pub items: Vec<BomLineItem>,
    /// Rows that named designators but could not be expanded
    pub diagnostics: Vec<RowDiagnostic>,
    /// Rows without any designator
    pub skipped_rows: Vec<usize>,
    pub total_rows: usize,
    pub parse_warnings: Vec<String>,
}

/// A data row before record parsing
struct RawRow {
    row_number: usize,
    fields: HashMap<String, String>,
}

/// File-level BOM parser
#[derive(Debug, Clone, Default)]
pub struct BomFileParser {
    record_parser: BomRecordParser,
}

impl BomFileParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse BOM file from bytes
    pub fn parse_bytes(&self, filename: &str, data: &[u8], format: Option<BomFormat>) -> Result<ParsedBom> {
        let format = format
            .or_else(|| BomFormat::from_extension(Path::new(filename)))
            .context("Could not determine file format")?;

        let (headers, rows, warnings) = match format {
            BomFormat::Csv => read_csv(data)?,
            BomFormat::Excel => read_excel(data)?,
            BomFormat::Xml => read_xml(data)?,
        };

        let parsed = self.build(filename, format, headers, rows, warnings);
        tracing::info!(
            filename = %parsed.filename,
            rows = parsed.total_rows,
            items = parsed.items.len(),
            diagnostics = parsed.diagnostics.len(),
            skipped = parsed.skipped_rows.len(),
            "Parsed BOM file"
        );
        Ok(parsed)
    }

    fn build(
        &self,
        filename: &str,
        format: BomFormat,
        column_headers: Vec<String>,
        rows: Vec<RawRow>,
        parse_warnings: Vec<String>,
    ) -> ParsedBom {
        let total_rows = rows.len();
        let mut items = Vec::new();
        let mut diagnostics = Vec::new();
        let mut skipped_rows = Vec::new();

        for row in rows {
            match self.record_parser.parse_row(&row.fields, Some(row.row_number)) {
                Ok(row_items) if row_items.is_empty() => skipped_rows.push(row.row_number),
                Ok(row_items) => items.extend(row_items),
                Err(error) => {
                    tracing::warn!(row = row.row_number, %error, "Rejected BOM row");
                    diagnostics.push(RowDiagnostic {
                        row: row.row_number,
                        designators: self.record_parser.designator_text(&row.fields),
                        error,
                    });
                }
            }
        }

        ParsedBom {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            format,
            column_headers,
            items,
            diagnostics,
            skipped_rows,
            total_rows,
            parse_warnings,
        }
    }
}

type RawTable = (Vec<String>, Vec<RawRow>, Vec<String>);

/// Read CSV format
fn read_csv(data: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let fields: HashMap<String, String> = headers
                    .iter()
                    .enumerate()
                    .filter_map(|(i, h)| record.get(i).map(|v| (h.clone(), v.to_string())))
                    .collect();

                rows.push(RawRow {
                    row_number: idx + 2,
                    fields,
                });
            }
            Err(e) => {
                warnings.push(format!("Row {}: Parse error - {}", idx + 2, e));
            }
        }
    }

    Ok((headers, rows, warnings))
}

/// Read Excel format (first worksheet)
fn read_excel(data: &[u8]) -> Result<RawTable> {
    use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};

    let cursor = std::io::Cursor::new(data);
    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).context("Failed to open Excel workbook")?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("No sheets found in workbook")?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .context("Failed to read worksheet")??;

    let mut rows_iter = range.rows();

    // First row is headers
    let headers: Vec<String> = rows_iter
        .next()
        .context("Empty worksheet")?
        .iter()
        .map(|cell: &DataType| cell.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (idx, row) in rows_iter.enumerate() {
        let fields: HashMap<String, String> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h): (usize, &String)| row.get(i).map(|v: &DataType| (h.clone(), v.to_string())))
            .collect();

        rows.push(RawRow {
            row_number: idx + 2,
            fields,
        });
    }

    Ok((headers, rows, Vec::new()))
}

/// Read XML format: every `row|item|component|entry|record` element is a row
/// and its child elements are the columns.
fn read_xml(data: &[u8]) -> Result<RawTable> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_reader(data);
    reader.trim_text(true);

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut current_row: Option<HashMap<String, String>> = None;
    let mut current_element = String::new();
    let mut row_number = 0;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if is_row_element(&tag_name) {
                    current_row = Some(HashMap::new());
                    row_number += 1;
                } else if current_row.is_some() {
                    current_element = tag_name;
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut row) = current_row {
                    if !current_element.is_empty() {
                        match e.unescape() {
                            Ok(text) => {
                                row.insert(current_element.clone(), text.to_string());
                            }
                            Err(err) => warnings.push(format!("Row {}: {}", row_number, err)),
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if is_row_element(&tag_name) {
                    if let Some(fields) = current_row.take() {
                        rows.push(RawRow { row_number, fields });
                    }
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warnings.push(format!("XML parse error: {}", e));
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    let mut headers: Vec<String> = rows
        .first()
        .map(|first| first.fields.keys().cloned().collect())
        .unwrap_or_default();
    headers.sort();

    Ok((headers, rows, warnings))
}

fn is_row_element(tag_name: &str) -> bool {
    matches!(
        tag_name.to_lowercase().as_str(),
        "row" | "item" | "component" | "entry" | "record"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(BomFormat::from_extension(Path::new("test.csv")), Some(BomFormat::Csv));
        assert_eq!(BomFormat::from_extension(Path::new("test.xlsx")), Some(BomFormat::Excel));
        assert_eq!(BomFormat::from_extension(Path::new("test.xml")), Some(BomFormat::Xml));
        assert_eq!(BomFormat::from_extension(Path::new("test.txt")), None);
    }

    #[test]
    fn test_csv_parsing() {
        let csv_data = "Reference,Value,Footprint,Qty,MPN\n\
                        \"C1,C2\",100nF,0603,2,GRM188R71C104KA01\n\
                        R1-R3,10k,0603,3,\n\
                        ,spare,0603,1,\n\
                        U1,STM32F103,LQFP-48,1,STM32F103C8T6\n";

        let parser = BomFileParser::new();
        let result = parser.parse_bytes("board.csv", csv_data.as_bytes(), None).unwrap();

        assert_eq!(result.total_rows, 4);
        assert_eq!(result.items.len(), 6);
        assert_eq!(result.skipped_rows, vec![4]);
        assert!(result.diagnostics.is_empty());

        let designators: Vec<&str> = result.items.iter().map(|i| i.designator.as_str()).collect();
        assert_eq!(designators, vec!["C1", "C2", "R1", "R2", "R3", "U1"]);
        assert_eq!(result.items[0].manufacturer_part.as_deref(), Some("GRM188R71C104KA01"));
        assert_eq!(result.items[2].manufacturer_part, None);
        assert_eq!(result.items[5].source_row, Some(5));
    }

    #[test]
    fn test_csv_reversed_range_is_reported() {
        let csv_data = "Designator,Value\nC5-C1,100nF\nC6,1uF\n";

        let parser = BomFileParser::new();
        let result = parser.parse_bytes("board.csv", csv_data.as_bytes(), None).unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].row, 2);
        assert_eq!(result.diagnostics[0].designators.as_deref(), Some("C5-C1"));
        assert!(matches!(result.diagnostics[0].error, BomRowError::ReversedRange { .. }));
    }

    #[test]
    fn test_diagnostic_keeps_designator_under_alias_header() {
        let csv_data = "REF_DES,Value,Qty\nR1,10k,zero\n";
        let result = BomFileParser::new()
            .parse_bytes("board.csv", csv_data.as_bytes(), None)
            .unwrap();
        // "REF_DES" is not a designator alias, so the row carries no designator
        assert_eq!(result.skipped_rows, vec![2]);

        let csv_data = " Designators ,Value,Qty\nR1,10k,zero\n";
        let result = BomFileParser::new()
            .parse_bytes("board.csv", csv_data.as_bytes(), None)
            .unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].designators.as_deref(), Some("R1"));
        assert!(matches!(result.diagnostics[0].error, BomRowError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_xml_parsing() {
        let xml = r#"<bom>
            <item><Ref>R1,R2</Ref><Value>4.7k</Value><Footprint>0402</Footprint></item>
            <item><Ref>D1</Ref><Value>red LED</Value><Footprint>0603</Footprint></item>
        </bom>"#;

        let parser = BomFileParser::new();
        let result = parser.parse_bytes("board.xml", xml.as_bytes(), None).unwrap();

        assert_eq!(result.total_rows, 2);
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.items[2].value, "red LED");
    }

    #[test]
    fn test_unknown_format() {
        let parser = BomFileParser::new();
        assert!(parser.parse_bytes("board.pdf", b"", None).is_err());
    }
}
