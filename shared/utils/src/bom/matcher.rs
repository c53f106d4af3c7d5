//! Component matcher
//!
//! Binds BOM line items to catalog parts using a fixed strategy chain:
//! manufacturer part number, then name + footprint, then parsed value.
//! The first strategy that finds an active part wins.

use serde::Serialize;
use std::collections::BTreeMap;

use solderline_models::{BomLineItem, PartCatalogEntry, ResolutionMethod, ResolvedBomItem};

use super::catalog::PartCatalog;
use super::value::parse_component_value;

/// Strategy outcome for one designator
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionEntry {
    pub designator: String,
    pub method: ResolutionMethod,
    pub part_number: Option<String>,
}

/// Summary of a batch resolution
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub entries: Vec<ResolutionEntry>,
    pub method_counts: BTreeMap<ResolutionMethod, usize>,
    pub unresolved: Vec<String>,
}

impl ResolutionReport {
    pub fn resolved_count(&self) -> usize {
        self.entries.len() - self.unresolved.len()
    }

    pub fn count(&self, method: ResolutionMethod) -> usize {
        self.method_counts.get(&method).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentMatcher;

impl ComponentMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Finds the part for one line item and the strategy that found it
    pub fn find_part<'c, C: PartCatalog + ?Sized>(
        &self,
        item: &BomLineItem,
        catalog: &'c C,
    ) -> Option<(&'c PartCatalogEntry, ResolutionMethod)> {
        if let Some(mpn) = item.manufacturer_part.as_deref() {
            if let Some(part) = catalog.find_by_manufacturer_part(mpn) {
                return Some((part, ResolutionMethod::ManufacturerPart));
            }
        }

        if let Some(part) = catalog.find_by_name_and_footprint(&item.value, &item.footprint) {
            return Some((part, ResolutionMethod::ValueFootprint));
        }

        let value = parse_component_value(&item.value)?;
        catalog
            .find_by_spec_value(&value)
            .map(|part| (part, ResolutionMethod::ParsedValue))
    }

    pub fn resolve<C: PartCatalog + ?Sized>(&self, item: &BomLineItem, catalog: &C) -> ResolvedBomItem {
        match self.find_part(item, catalog) {
            Some((part, method)) => ResolvedBomItem::resolved(item.clone(), part.clone(), method),
            None => ResolvedBomItem::unresolved(item.clone()),
        }
    }

    /// Resolves every item in order
    pub fn resolve_all<C: PartCatalog + ?Sized>(
        &self,
        items: &[BomLineItem],
        catalog: &C,
    ) -> (Vec<ResolvedBomItem>, ResolutionReport) {
        let mut resolved = Vec::with_capacity(items.len());
        let mut report = ResolutionReport::default();

        for item in items {
            let result = self.resolve(item, catalog);

            *report.method_counts.entry(result.resolution).or_insert(0) += 1;
            if !result.is_resolved() {
                report.unresolved.push(result.designator().to_string());
            }
            report.entries.push(ResolutionEntry {
                designator: result.designator().to_string(),
                method: result.resolution,
                part_number: result.part.as_ref().map(|p| p.manufacturer_part_number.clone()),
            });

            resolved.push(result);
        }

        tracing::info!(
            items = items.len(),
            resolved = report.resolved_count(),
            unresolved = report.unresolved.len(),
            "Resolved BOM line items"
        );
        if !report.unresolved.is_empty() {
            tracing::debug!(designators = ?report.unresolved, "Unresolved designators");
        }

        (resolved, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::catalog::InMemoryCatalog;
    use rust_decimal_macros::dec;
    use solderline_models::{ComponentValue, LifecycleStage, ValueUnit};

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(
            vec![
                PartCatalogEntry::new("GRM188R71C104KA01", "MLCC X7R", "0603", dec!(0.02))
                    .with_spec_value(ComponentValue::new(dec!(0.0000001), ValueUnit::Farad)),
                PartCatalogEntry::new("RC0603FR-0710KL", "resistor 10k 1%", "0603", dec!(0.01))
                    .with_spec_value(ComponentValue::new(dec!(10000), ValueUnit::Ohm)),
                PartCatalogEntry::new("LTST-C191KRKT", "red LED", "0603", dec!(0.05)),
                PartCatalogEntry::new("NE555DR", "timer", "SOIC-8", dec!(0.30))
                    .with_lifecycle(LifecycleStage::Obsolete),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_mpn_hit_short_circuits() {
        let matcher = ComponentMatcher::new();
        // "10k" on 0603 would also match the resistor
        let item = BomLineItem::new("C1", "10k", "0603").with_manufacturer_part("GRM188R71C104KA01");

        let resolved = matcher.resolve(&item, &catalog());
        assert_eq!(resolved.resolution, ResolutionMethod::ManufacturerPart);
        assert_eq!(resolved.part.unwrap().manufacturer_part_number, "GRM188R71C104KA01");
        assert!(resolved.allocated);
    }

    #[test]
    fn test_name_and_footprint_before_parsed_value() {
        let matcher = ComponentMatcher::new();
        let item = BomLineItem::new("R1", "10k", "0603");

        let resolved = matcher.resolve(&item, &catalog());
        assert_eq!(resolved.resolution, ResolutionMethod::ValueFootprint);
    }

    #[test]
    fn test_parsed_value_fallback() {
        let matcher = ComponentMatcher::new();
        let item = BomLineItem::new("C2", "100nF", "0402");

        let resolved = matcher.resolve(&item, &catalog());
        assert_eq!(resolved.resolution, ResolutionMethod::ParsedValue);
        assert_eq!(resolved.part.unwrap().manufacturer_part_number, "GRM188R71C104KA01");
    }

    #[test]
    fn test_inactive_mpn_is_unresolved() {
        let matcher = ComponentMatcher::new();
        let item = BomLineItem::new("U1", "555", "SOIC-8").with_manufacturer_part("NE555DR");

        let resolved = matcher.resolve(&item, &catalog());
        assert_eq!(resolved.resolution, ResolutionMethod::Unresolved);
        assert!(resolved.part.is_none());
        assert!(!resolved.allocated);
    }

    #[test]
    fn test_resolve_all_report() {
        let matcher = ComponentMatcher::new();
        let items = vec![
            BomLineItem::new("D1", "Red LED", "0603"),
            BomLineItem::new("R1", "10k", "0805"),
            BomLineItem::new("J1", "USB-C", "USB4105"),
        ];

        let (resolved, report) = matcher.resolve_all(&items, &catalog());
        assert_eq!(resolved.len(), 3);
        assert_eq!(report.count(ResolutionMethod::ValueFootprint), 1);
        assert_eq!(report.count(ResolutionMethod::ParsedValue), 1);
        assert_eq!(report.unresolved, vec!["J1"]);
        assert_eq!(report.resolved_count(), 2);
        assert_eq!(report.entries[1].part_number.as_deref(), Some("RC0603FR-0710KL"));
    }
}
