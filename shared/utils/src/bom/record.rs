//! BOM Record Parser
//!
//! Turns one raw tabular row (column name → text) into normalized
//! `BomLineItem`s, expanding designator lists and ranges.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use solderline_models::BomLineItem;

/// Upper bound on designators produced by a single range
pub const MAX_RANGE_EXPANSION: u32 = 10_000;

static DESIGNATOR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)(\d+)\s*-\s*([A-Za-z]*)(\d+)$").expect("valid designator range regex")
});

/// Why a row could not be turned into line items
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BomRowError {
    #[error("Designator range {range} runs backwards ({start} > {end})")]
    ReversedRange { range: String, start: u32, end: u32 },

    #[error("Designator range {range} mixes prefixes")]
    MismatchedRangePrefix { range: String },

    #[error("Designator range {range} expands to {count} designators")]
    RangeTooLarge { range: String, count: u64 },

    #[error("Invalid quantity '{value}': expected a whole number of at least 1")]
    InvalidQuantity { value: String },
}

/// Accepted header spellings per field, in normalized form
#[derive(Debug, Clone)]
struct ColumnAliases {
    designator: Vec<String>,
    value: Vec<String>,
    footprint: Vec<String>,
    quantity: Vec<String>,
    manufacturer_part: Vec<String>,
    notes: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        Self {
            designator: names(&["reference", "ref", "designator", "references", "designators"]),
            value: names(&["value", "val"]),
            footprint: names(&["footprint", "package"]),
            quantity: names(&["qty", "quantity"]),
            manufacturer_part: names(&["mpn", "manufacturer part number", "part number"]),
            notes: names(&["notes", "comment", "comments"]),
        }
    }
}

/// Lowercases, trims, treats `_` as a space and collapses runs of whitespace
pub fn normalize_header(header: &str) -> String {
    header
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Row-to-line-item parser
#[derive(Debug, Clone, Default)]
pub struct BomRecordParser {
    aliases: ColumnAliases,
}

impl BomRecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one row.
    ///
    /// Rows without a designator yield no items. A row listing several
    /// designators yields one item per designator with quantity 1; a row with
    /// a single designator takes its quantity from the quantity column.
    pub fn parse_row(
        &self,
        row: &HashMap<String, String>,
        source_row: Option<usize>,
    ) -> Result<Vec<BomLineItem>, BomRowError> {
        let fields: HashMap<String, &str> = row
            .iter()
            .map(|(k, v)| (normalize_header(k), v.as_str()))
            .collect();

        let designator_field = match find_value(&self.aliases.designator, &fields) {
            Some(field) => field,
            None => return Ok(Vec::new()),
        };

        let designators = expand_designators(designator_field)?;
        if designators.is_empty() {
            return Ok(Vec::new());
        }

        let value = find_value(&self.aliases.value, &fields).unwrap_or_default();
        let footprint = find_value(&self.aliases.footprint, &fields).unwrap_or_default();
        let manufacturer_part = find_value(&self.aliases.manufacturer_part, &fields).map(str::to_string);
        let notes = find_value(&self.aliases.notes, &fields).map(str::to_string);

        let quantity = if designators.len() == 1 {
            match find_value(&self.aliases.quantity, &fields) {
                Some(raw) => parse_quantity(raw)?,
                None => 1,
            }
        } else {
            1
        };

        Ok(designators
            .into_iter()
            .map(|designator| BomLineItem {
                designator,
                value: value.to_string(),
                footprint: footprint.to_string(),
                manufacturer_part: manufacturer_part.clone(),
                quantity,
                notes: notes.clone(),
                source_row,
            })
            .collect())
    }

    /// Raw designator cell of a row, for reporting rows that failed to parse
    pub fn designator_text(&self, row: &HashMap<String, String>) -> Option<String> {
        let fields: HashMap<String, &str> = row
            .iter()
            .map(|(k, v)| (normalize_header(k), v.as_str()))
            .collect();
        find_value(&self.aliases.designator, &fields).map(str::to_string)
    }
}

fn find_value<'a>(candidates: &[String], fields: &HashMap<String, &'a str>) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|candidate| fields.get(candidate).copied())
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn parse_quantity(raw: &str) -> Result<u32, BomRowError> {
    match raw.trim().parse::<u32>() {
        Ok(quantity) if quantity >= 1 => Ok(quantity),
        _ => Err(BomRowError::InvalidQuantity {
            value: raw.to_string(),
        }),
    }
}

/// Splits a designator field on commas and expands ranges such as `C1-C5`
/// or `C1-5` into consecutive designators.
pub fn expand_designators(field: &str) -> Result<Vec<String>, BomRowError> {
    let mut designators = Vec::new();

    for part in field.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match DESIGNATOR_RANGE.captures(part) {
            Some(caps) => {
                let prefix = &caps[1];
                let end_prefix = &caps[3];
                if !end_prefix.is_empty() && end_prefix != prefix {
                    return Err(BomRowError::MismatchedRangePrefix {
                        range: part.to_string(),
                    });
                }

                let (start, end) = match (caps[2].parse::<u32>(), caps[4].parse::<u32>()) {
                    (Ok(start), Ok(end)) => (start, end),
                    _ => {
                        return Err(BomRowError::RangeTooLarge {
                            range: part.to_string(),
                            count: u64::MAX,
                        })
                    }
                };

                if end < start {
                    return Err(BomRowError::ReversedRange {
                        range: part.to_string(),
                        start,
                        end,
                    });
                }

                let count = u64::from(end - start) + 1;
                if count > u64::from(MAX_RANGE_EXPANSION) {
                    return Err(BomRowError::RangeTooLarge {
                        range: part.to_string(),
                        count,
                    });
                }

                designators.extend((start..=end).map(|n| format!("{}{}", prefix, n)));
            }
            None => designators.push(part.to_string()),
        }
    }

    Ok(designators)
}
