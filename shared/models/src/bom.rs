//! BOM domain models for the Solderline back office.
//!
//! A BOM import produces one immutable `BomSnapshot` per version. Each
//! snapshot holds the `ResolvedBomItem`s produced by binding parsed line
//! items to catalog parts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::part::PartCatalogEntry;

/// One placement row of a parsed BOM, before resolution against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct BomLineItem {
    #[validate(length(min = 1, max = 50, message = "Designator must be between 1 and 50 characters"))]
    pub designator: String,
    pub value: String,
    pub footprint: String,
    pub manufacturer_part: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    pub notes: Option<String>,
    /// 1-based row in the source file, header included
    pub source_row: Option<usize>,
}

/// Which matcher strategy bound a line item to its part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    ManufacturerPart,
    ValueFootprint,
    ParsedValue,
    Unresolved,
}

/// A line item bound to a catalog part, or explicitly unresolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedBomItem {
    pub line_item: BomLineItem,
    pub part: Option<PartCatalogEntry>,
    pub resolution: ResolutionMethod,
    pub allocated: bool,
}

/// One version of a project's BOM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BomSnapshot {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version_label: String,
    pub source_filename: Option<String>,
    /// Hex SHA-256 of the imported file
    pub source_checksum: Option<String>,
    pub items: Vec<ResolvedBomItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Duplicate designators in snapshot: {}", .0.join(", "))]
    DuplicateDesignators(Vec<String>),

    #[error("Designator not found in snapshot: {0}")]
    UnknownDesignator(String),

    #[error("Version label must not be empty")]
    EmptyVersionLabel,
}

impl BomLineItem {
    /// Creates a single-placement line item
    pub fn new(designator: impl Into<String>, value: impl Into<String>, footprint: impl Into<String>) -> Self {
        Self {
            designator: designator.into(),
            value: value.into(),
            footprint: footprint.into(),
            manufacturer_part: None,
            quantity: 1,
            notes: None,
            source_row: None,
        }
    }

    pub fn with_manufacturer_part(mut self, mpn: impl Into<String>) -> Self {
        self.manufacturer_part = Some(mpn.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManufacturerPart => "manufacturer_part",
            Self::ValueFootprint => "value_footprint",
            Self::ParsedValue => "parsed_value",
            Self::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manufacturer_part" => Ok(Self::ManufacturerPart),
            "value_footprint" => Ok(Self::ValueFootprint),
            "parsed_value" => Ok(Self::ParsedValue),
            "unresolved" => Ok(Self::Unresolved),
            other => Err(format!("Unknown resolution method: {}", other)),
        }
    }
}

impl ResolvedBomItem {
    /// Binds a line item to a part; binding marks the item allocated
    pub fn resolved(line_item: BomLineItem, part: PartCatalogEntry, resolution: ResolutionMethod) -> Self {
        Self {
            line_item,
            part: Some(part),
            resolution,
            allocated: true,
        }
    }

    pub fn unresolved(line_item: BomLineItem) -> Self {
        Self {
            line_item,
            part: None,
            resolution: ResolutionMethod::Unresolved,
            allocated: false,
        }
    }

    pub fn designator(&self) -> &str {
        &self.line_item.designator
    }

    pub fn quantity(&self) -> u32 {
        self.line_item.quantity
    }

    pub fn part_id(&self) -> Option<Uuid> {
        self.part.as_ref().map(|p| p.id)
    }

    pub fn is_resolved(&self) -> bool {
        self.part.is_some()
    }

    /// Quantity × unit price; zero when unresolved
    pub fn extended_cost(&self) -> Decimal {
        self.part
            .as_ref()
            .map(|p| p.cost_for(self.line_item.quantity))
            .unwrap_or(Decimal::ZERO)
    }
}

impl BomSnapshot {
    /// Builds a snapshot, rejecting repeated designators.
    pub fn new(
        project_id: Uuid,
        version_label: impl Into<String>,
        items: Vec<ResolvedBomItem>,
    ) -> Result<Self, SnapshotError> {
        let version_label = version_label.into();
        if version_label.trim().is_empty() {
            return Err(SnapshotError::EmptyVersionLabel);
        }

        ensure_unique_designators(&items)?;

        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            version_label,
            source_filename: None,
            source_checksum: None,
            items,
            created_at: Utc::now(),
        })
    }

    /// Records the file the snapshot was imported from
    pub fn with_source(mut self, filename: impl Into<String>, data: &[u8]) -> Self {
        self.source_filename = Some(filename.into());
        self.source_checksum = Some(hex::encode(Sha256::digest(data)));
        self
    }

    pub fn item(&self, designator: &str) -> Option<&ResolvedBomItem> {
        self.items.iter().find(|i| i.designator() == designator)
    }

    /// Changes the allocation flag of one item; the only in-place edit a snapshot allows
    pub fn set_allocation(&mut self, designator: &str, allocated: bool) -> Result<(), SnapshotError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.line_item.designator == designator)
            .ok_or_else(|| SnapshotError::UnknownDesignator(designator.to_string()))?;
        item.allocated = allocated;
        Ok(())
    }

    /// Sum of quantity × unit price over resolved items
    pub fn total_cost(&self) -> Decimal {
        self.items.iter().map(ResolvedBomItem::extended_cost).sum()
    }

    pub fn unresolved_designators(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| !i.is_resolved())
            .map(ResolvedBomItem::designator)
            .collect()
    }
}

/// Fails with every designator that appears more than once, in first-repeat order.
pub fn ensure_unique_designators(items: &[ResolvedBomItem]) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for item in items {
        let designator = item.designator();
        if !seen.insert(designator) && !duplicates.iter().any(|d| d == designator) {
            duplicates.push(designator.to_string());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(SnapshotError::DuplicateDesignators(duplicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn resolved(designator: &str, price: Decimal, quantity: u32) -> ResolvedBomItem {
        let part = PartCatalogEntry::new(format!("MPN-{}", designator), "part", "0603", price);
        ResolvedBomItem::resolved(
            BomLineItem::new(designator, "10k", "0603").with_quantity(quantity),
            part,
            ResolutionMethod::ManufacturerPart,
        )
    }

    #[test]
    fn test_snapshot_rejects_duplicate_designators() {
        let items = vec![
            resolved("R1", dec!(0.10), 1),
            resolved("R2", dec!(0.10), 1),
            resolved("R1", dec!(0.20), 1),
        ];

        let err = BomSnapshot::new(Uuid::new_v4(), "rev-a", items).unwrap_err();
        assert_eq!(err, SnapshotError::DuplicateDesignators(vec!["R1".to_string()]));
    }

    #[test]
    fn test_snapshot_total_ignores_unresolved() {
        let items = vec![
            resolved("R1", dec!(0.10), 3),
            ResolvedBomItem::unresolved(BomLineItem::new("D1", "red LED", "0805")),
        ];
        let snapshot = BomSnapshot::new(Uuid::new_v4(), "rev-a", items).unwrap();

        assert_eq!(snapshot.total_cost(), dec!(0.30));
        assert_eq!(snapshot.unresolved_designators(), vec!["D1"]);
    }

    #[test]
    fn test_set_allocation() {
        let mut snapshot =
            BomSnapshot::new(Uuid::new_v4(), "rev-a", vec![resolved("C1", dec!(0.05), 1)]).unwrap();
        assert!(snapshot.item("C1").unwrap().allocated);

        snapshot.set_allocation("C1", false).unwrap();
        assert!(!snapshot.item("C1").unwrap().allocated);
        assert_eq!(
            snapshot.set_allocation("C99", true),
            Err(SnapshotError::UnknownDesignator("C99".to_string()))
        );
    }

    #[test]
    fn test_source_checksum() {
        let snapshot = BomSnapshot::new(Uuid::new_v4(), "rev-a", Vec::new())
            .unwrap()
            .with_source("board.csv", b"abc");
        assert_eq!(
            snapshot.source_checksum.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_empty_version_label() {
        assert_eq!(
            BomSnapshot::new(Uuid::new_v4(), "  ", Vec::new()).unwrap_err(),
            SnapshotError::EmptyVersionLabel
        );
    }
}
